//! Client-side helpers for the inheritance HTLC.
//!
//! Everything here must agree bit-for-bit with the on-chain program:
//! the hashlock is `SHA-256(secret)` and the commitment digest is
//! `SHA-256(be_u256(lock_id) || committer || secret || salt)`.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const DIGEST_LEN: usize = 32;
pub const DEFAULT_SALT_LEN: usize = 32;
const HUMAN_SECRET_BYTES: usize = 18;

pub fn hashlock(secret: &[u8]) -> [u8; DIGEST_LEN] {
    Sha256::digest(secret).into()
}

pub fn verify_hashlock(secret: &[u8], expected: &[u8; DIGEST_LEN]) -> bool {
    &hashlock(secret) == expected
}

/// Left-pads `lock_id` to a 32-byte big-endian word (uint256 layout).
pub fn encode_lock_id(lock_id: u64) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    out[24..].copy_from_slice(&lock_id.to_be_bytes());
    out
}

pub fn commitment_digest(
    lock_id: u64,
    committer: &[u8; 32],
    secret: &[u8],
    salt: &[u8],
) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(encode_lock_id(lock_id));
    hasher.update(committer);
    hasher.update(secret);
    hasher.update(salt);
    hasher.finalize().into()
}

pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Random bytes rendered as `0x`-prefixed lowercase hex.
pub fn random_hex(len: usize) -> String {
    format!("0x{}", hex::encode(random_bytes(len)))
}

pub fn random_salt() -> Vec<u8> {
    random_bytes(DEFAULT_SALT_LEN)
}

/// A secret that survives being written down by hand: 18 random bytes as
/// unpadded base64url (24 characters, no `+`, `/` or `=`).
pub fn generate_human_secret() -> String {
    URL_SAFE_NO_PAD.encode(random_bytes(HUMAN_SECRET_BYTES))
}

/// Interprets user-supplied secret text. `0x`-prefixed input is decoded as
/// hex; anything else is taken as its UTF-8 bytes.
pub fn parse_secret(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("secret is empty"));
    }
    match trimmed.strip_prefix("0x") {
        Some(hex_part) => decode_hex(hex_part).context("decode 0x-prefixed secret"),
        None => Ok(trimmed.as_bytes().to_vec()),
    }
}

/// Accepts a 32-byte account key as base58 (wallet form) or hex.
pub fn parse_account(value: &str) -> Result<[u8; 32]> {
    let trimmed = value.trim();
    if let Ok(bytes) = decode_hex_32(trimmed) {
        return Ok(bytes);
    }
    let bytes = bs58::decode(trimmed)
        .into_vec()
        .with_context(|| format!("invalid account key: {trimmed}"))?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow!("expected 32-byte account key, got {}", bytes.len()))
}

pub fn hex_encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

pub fn decode_hex(value: &str) -> Result<Vec<u8>> {
    let normalized = value.trim();
    let normalized = normalized.strip_prefix("0x").unwrap_or(normalized);
    hex::decode(normalized).context("invalid hex")
}

pub fn decode_hex_32(value: &str) -> Result<[u8; 32]> {
    let bytes = decode_hex(value)?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow!("expected 32-byte hex, got {}", bytes.len()))
}

/// Everything a beneficiary needs to claim later, in one record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BackupTicket {
    pub program_id: String,
    pub lock_id: u64,
    pub token_mint: String,
    pub amount: u64,
    pub unlock_time: i64,
    pub hashlock: String,
    pub secret: String,
}

impl BackupTicket {
    pub fn new(
        program_id: impl Into<String>,
        lock_id: u64,
        token_mint: impl Into<String>,
        amount: u64,
        unlock_time: i64,
        secret: &str,
    ) -> Result<Self> {
        let secret_bytes = parse_secret(secret)?;
        Ok(Self {
            program_id: program_id.into(),
            lock_id,
            token_mint: token_mint.into(),
            amount,
            unlock_time,
            hashlock: hex_encode(&hashlock(&secret_bytes)),
            secret: secret.trim().to_string(),
        })
    }

    /// Fails unless the recorded secret opens the recorded hashlock.
    pub fn verify(&self) -> Result<()> {
        let secret = parse_secret(&self.secret)?;
        let expected = decode_hex_32(&self.hashlock).context("decode ticket hashlock")?;
        if !verify_hashlock(&secret, &expected) {
            return Err(anyhow!("ticket secret does not match hashlock"));
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize ticket")?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))
    }
}
