use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

macro_rules! hex_bytes32 {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub fn to_bytes(self) -> [u8; 32] {
                self.0
            }

            pub fn from_hex(value: &str) -> std::result::Result<Self, hex::FromHexError> {
                let normalized = value.trim();
                let normalized = normalized.strip_prefix("0x").unwrap_or(normalized);
                let mut out = [0u8; 32];
                hex::decode_to_slice(normalized, &mut out)?;
                Ok(Self(out))
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(&self.0[..4]))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex::encode(self.0))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::from_hex(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_bytes32!(Address);
hex_bytes32!(Hash32);

impl Address {
    /// Deterministic address for a human label such as `"alice"`.
    pub fn from_label(label: &str) -> Self {
        Self(Sha256::digest(label.as_bytes()).into())
    }

    /// Hex (with or without `0x`) is taken literally; anything else is a label.
    pub fn parse(value: &str) -> Self {
        Self::from_hex(value).unwrap_or_else(|_| Self::from_label(value.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient balance: needed {needed}, available {available}")]
    InsufficientBalance { needed: u64, available: u64 },
    #[error("insufficient custody: needed {needed}, held {held}")]
    InsufficientCustody { needed: u64, held: u64 },
    #[error("balance overflow")]
    Overflow,
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HtlcError {
    #[error("lock {0} not found")]
    LockNotFound(u64),
    #[error("amount must be greater than zero")]
    InvalidAmount,
    #[error("unlock time {unlock_time} is not after now ({now})")]
    InvalidUnlockTime { unlock_time: i64, now: i64 },
    #[error("timelock not expired: unlocks at {unlock_time}, now {now}")]
    TimelockNotExpired { unlock_time: i64, now: i64 },
    #[error("no commitment recorded for lock {0}")]
    CommitmentNotFound(u64),
    #[error("commit delay not elapsed: reveal allowed from block {reveal_after}, current {current}")]
    CommitDelayNotElapsed { reveal_after: u64, current: u64 },
    #[error("caller is not the committer")]
    CommitterMismatch,
    #[error("secret does not match hashlock")]
    InvalidSecret,
    #[error("reveal does not match the recorded commitment")]
    CommitmentMismatch,
    #[error("lock {0} already claimed")]
    LockAlreadyClaimed(u64),
    #[error("direct claim is disabled")]
    DirectClaimDisabled,
    #[error("lock id space exhausted")]
    LockIdExhausted,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, HtlcError>;
