//! Hashlock and commitment digests.
//!
//! Both are SHA-256. The commitment preimage is
//! `be_u256(lock_id) || committer || secret || salt`; the first two fields are
//! fixed width and the hashlock pins `secret`, so the variable tail cannot be
//! re-split into a different valid reveal.

use anchor_lang::prelude::Pubkey;
use sha2::{Digest, Sha256};

pub fn hash_secret(secret: &[u8]) -> [u8; 32] {
    Sha256::digest(secret).into()
}

/// Left-pads `lock_id` to a 32-byte big-endian word.
pub fn encode_lock_id(lock_id: u64) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[24..].copy_from_slice(&lock_id.to_be_bytes());
    out
}

pub fn commitment_digest(lock_id: u64, committer: &Pubkey, secret: &[u8], salt: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(encode_lock_id(lock_id));
    hasher.update(committer.as_ref());
    hasher.update(secret);
    hasher.update(salt);
    hasher.finalize().into()
}
