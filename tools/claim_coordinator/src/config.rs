use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use solana_sdk::pubkey::Pubkey;

pub fn validate_rpc_url(label: &str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!("{label} must start with http:// or https://"))
    }
}

pub fn validate_nonzero(label: &str, value: u64) -> Result<()> {
    if value == 0 {
        Err(anyhow!("{label} must be greater than zero"))
    } else {
        Ok(())
    }
}

pub fn validate_program_id(value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value.trim()).map_err(|err| anyhow!("invalid program id {value}: {err}"))
}

/// How often the driver re-checks a lock while waiting, and for how long.
/// `max_recommits` bounds how often a replaced commitment is renewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_polls: u64,
    pub max_recommits: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2_000),
            max_polls: 1_800,
            max_recommits: 16,
        }
    }
}

impl PollConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        let interval_ms = read_env_u64("HTLC_POLL_INTERVAL_MS", default.interval.as_millis() as u64);
        let max_polls = read_env_u64("HTLC_MAX_POLLS", default.max_polls);
        let max_recommits = read_env_u64("HTLC_MAX_RECOMMITS", default.max_recommits);
        Self {
            interval: Duration::from_millis(interval_ms),
            max_polls,
            max_recommits,
        }
    }
}

fn read_env_u64(key: &str, fallback: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(fallback)
}
