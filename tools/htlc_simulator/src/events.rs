use serde::{Deserialize, Serialize};

use crate::types::{Address, Hash32};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HtlcEvent {
    LockCreated {
        lock_id: u64,
        depositor: Address,
        asset: Address,
        amount: u64,
        hashlock: Hash32,
        unlock_time: i64,
    },
    LockCommitted {
        lock_id: u64,
        committer: Address,
        commitment: Hash32,
        commit_block: u64,
    },
    LockClaimed {
        lock_id: u64,
        claimer: Address,
    },
}

impl HtlcEvent {
    pub fn lock_id(&self) -> u64 {
        match self {
            Self::LockCreated { lock_id, .. }
            | Self::LockCommitted { lock_id, .. }
            | Self::LockClaimed { lock_id, .. } => *lock_id,
        }
    }
}
