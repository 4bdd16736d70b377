//! Lock arena and per-lock commitments.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Address, Hash32, HtlcError, Result};
use crate::MIN_COMMIT_DELAY_BLOCKS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub id: u64,
    pub depositor: Address,
    pub asset: Address,
    pub amount: u64,
    pub hashlock: Hash32,
    pub unlock_time: i64,
    pub claimed: bool,
}

/// Locks indexed by id. Ids are arena positions, so they are dense and never
/// reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockRegistry {
    locks: Vec<Lock>,
}

impl LockRegistry {
    pub fn next_id(&self) -> Result<u64> {
        u64::try_from(self.locks.len()).map_err(|_| HtlcError::LockIdExhausted)
    }

    pub(crate) fn insert(&mut self, lock: Lock) {
        debug_assert_eq!(Some(lock.id), self.next_id().ok());
        self.locks.push(lock);
    }

    pub fn get(&self, id: u64) -> Result<&Lock> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.locks.get(index))
            .ok_or(HtlcError::LockNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: u64) -> Result<&mut Lock> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.locks.get_mut(index))
            .ok_or(HtlcError::LockNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lock> {
        self.locks.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub lock_id: u64,
    pub committer: Address,
    pub digest: Hash32,
    pub commit_block: u64,
}

impl Commitment {
    /// First block at which the reveal is accepted.
    pub fn reveal_after(&self) -> u64 {
        self.commit_block.saturating_add(MIN_COMMIT_DELAY_BLOCKS)
    }
}

/// At most one live commitment per lock; a new commit replaces the old one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitmentRegistry {
    by_lock: BTreeMap<u64, Commitment>,
}

impl CommitmentRegistry {
    pub(crate) fn record(&mut self, commitment: Commitment) -> Option<Commitment> {
        self.by_lock.insert(commitment.lock_id, commitment)
    }

    pub fn get(&self, lock_id: u64) -> Option<&Commitment> {
        self.by_lock.get(&lock_id)
    }

    pub(crate) fn remove(&mut self, lock_id: u64) -> Option<Commitment> {
        self.by_lock.remove(&lock_id)
    }

    pub fn len(&self) -> usize {
        self.by_lock.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_lock.is_empty()
    }
}
