//! Claim progress as persisted between polls.

use serde::{Deserialize, Serialize};

/// The secret never appears here. The salt does: without it a crashed
/// coordinator could not finish a reveal it already committed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ClaimState {
    Pending {
        lock_id: u64,
        claimer: String,
    },
    Committed {
        lock_id: u64,
        claimer: String,
        salt: String,
        commitment: String,
        commit_block: u64,
        reveal_after_block: u64,
        commit_tx: String,
    },
    Claimed {
        lock_id: u64,
        claim_tx: String,
    },
    Abandoned {
        lock_id: u64,
        reason: String,
    },
}

impl ClaimState {
    pub fn pending(lock_id: u64, claimer: impl Into<String>) -> Self {
        Self::Pending {
            lock_id,
            claimer: claimer.into(),
        }
    }

    pub fn lock_id(&self) -> u64 {
        match self {
            Self::Pending { lock_id, .. }
            | Self::Committed { lock_id, .. }
            | Self::Claimed { lock_id, .. }
            | Self::Abandoned { lock_id, .. } => *lock_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending { .. } => "pending",
            Self::Committed { .. } => "committed",
            Self::Claimed { .. } => "claimed",
            Self::Abandoned { .. } => "abandoned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Claimed { .. } | Self::Abandoned { .. })
    }
}
