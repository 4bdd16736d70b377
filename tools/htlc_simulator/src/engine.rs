//! The lock lifecycle: creation, commitment, and the two claim paths.

use htlc_sdk::{commitment_digest, hashlock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::chain::ChainClock;
use crate::events::HtlcEvent;
use crate::ledger::TokenLedger;
use crate::registry::{Commitment, CommitmentRegistry, Lock, LockRegistry};
use crate::types::{Address, Hash32, HtlcError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Enables `claim`, which pays whoever shows the pre-image first.
    pub allow_direct_claim: bool,
}

/// Snapshot a claimant polls before committing and revealing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStatus {
    pub lock_id: u64,
    pub claimed: bool,
    pub unlock_time: i64,
    pub now: i64,
    pub block_height: u64,
    pub hashlock: Hash32,
}

impl LockStatus {
    pub fn unlocked(&self) -> bool {
        self.now >= self.unlock_time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtlcEngine<L> {
    config: EngineConfig,
    clock: ChainClock,
    ledger: L,
    locks: LockRegistry,
    commitments: CommitmentRegistry,
    events: Vec<HtlcEvent>,
}

impl<L: TokenLedger> HtlcEngine<L> {
    pub fn new(config: EngineConfig, clock: ChainClock, ledger: L) -> Self {
        Self {
            config,
            clock,
            ledger,
            locks: LockRegistry::default(),
            commitments: CommitmentRegistry::default(),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn clock(&self) -> ChainClock {
        self.clock
    }

    pub fn advance(&mut self, seconds: i64, blocks: u64) -> ChainClock {
        self.clock.advance(seconds, blocks);
        debug!(now = self.clock.now, block = self.clock.block_height, "clock advanced");
        self.clock
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    pub fn commitments(&self) -> &CommitmentRegistry {
        &self.commitments
    }

    pub fn events(&self) -> &[HtlcEvent] {
        &self.events
    }

    pub fn create_lock(
        &mut self,
        depositor: Address,
        asset: Address,
        amount: u64,
        hashlock: Hash32,
        unlock_time: i64,
    ) -> Result<u64> {
        if amount == 0 {
            return Err(HtlcError::InvalidAmount);
        }
        let now = self.clock.now;
        if unlock_time <= now {
            return Err(HtlcError::InvalidUnlockTime { unlock_time, now });
        }

        let lock_id = self.locks.next_id()?;
        self.ledger.pull(asset, depositor, amount)?;
        self.locks.insert(Lock {
            id: lock_id,
            depositor,
            asset,
            amount,
            hashlock,
            unlock_time,
            claimed: false,
        });

        info!(lock_id, amount, unlock_time, %depositor, "lock created");
        self.events.push(HtlcEvent::LockCreated {
            lock_id,
            depositor,
            asset,
            amount,
            hashlock,
            unlock_time,
        });
        Ok(lock_id)
    }

    pub fn get_lock(&self, lock_id: u64) -> Result<&Lock> {
        self.locks.get(lock_id)
    }

    pub fn lock_status(&self, lock_id: u64) -> Result<LockStatus> {
        let lock = self.locks.get(lock_id)?;
        Ok(LockStatus {
            lock_id,
            claimed: lock.claimed,
            unlock_time: lock.unlock_time,
            now: self.clock.now,
            block_height: self.clock.block_height,
            hashlock: lock.hashlock,
        })
    }

    /// Records `digest` as the binding for `lock_id`, replacing any earlier
    /// commitment. The digest is opaque here; it is only checked on reveal.
    pub fn commit(&mut self, committer: Address, lock_id: u64, digest: Hash32) -> Result<u64> {
        let lock = self.locks.get(lock_id)?;
        if lock.claimed {
            return Err(HtlcError::LockAlreadyClaimed(lock_id));
        }

        let commit_block = self.clock.block_height;
        let replaced = self.commitments.record(Commitment {
            lock_id,
            committer,
            digest,
            commit_block,
        });
        if let Some(previous) = replaced {
            warn!(lock_id, previous = %previous.committer, %committer, "commitment replaced");
        }

        info!(lock_id, commit_block, %committer, "lock committed");
        self.events.push(HtlcEvent::LockCommitted {
            lock_id,
            committer,
            commitment: digest,
            commit_block,
        });
        Ok(commit_block)
    }

    pub fn reveal_and_claim(
        &mut self,
        caller: Address,
        lock_id: u64,
        secret: &[u8],
        salt: &[u8],
    ) -> Result<()> {
        let lock = self.locks.get(lock_id)?;
        if lock.claimed {
            return Err(HtlcError::LockAlreadyClaimed(lock_id));
        }
        let now = self.clock.now;
        if now < lock.unlock_time {
            return Err(HtlcError::TimelockNotExpired {
                unlock_time: lock.unlock_time,
                now,
            });
        }

        let commitment = self
            .commitments
            .get(lock_id)
            .ok_or(HtlcError::CommitmentNotFound(lock_id))?;
        let current = self.clock.block_height;
        if current < commitment.reveal_after() {
            return Err(HtlcError::CommitDelayNotElapsed {
                reveal_after: commitment.reveal_after(),
                current,
            });
        }
        if caller != commitment.committer {
            return Err(HtlcError::CommitterMismatch);
        }
        if hashlock(secret) != lock.hashlock.0 {
            return Err(HtlcError::InvalidSecret);
        }
        let expected = commitment_digest(lock_id, &caller.0, secret, salt);
        if expected != commitment.digest.0 {
            return Err(HtlcError::CommitmentMismatch);
        }

        self.release(lock_id, caller)?;
        self.commitments.remove(lock_id);
        Ok(())
    }

    /// Pays whoever presents the pre-image, with no identity binding. Only
    /// available when the engine was configured with `allow_direct_claim`.
    pub fn claim(&mut self, caller: Address, lock_id: u64, secret: &[u8]) -> Result<()> {
        if !self.config.allow_direct_claim {
            return Err(HtlcError::DirectClaimDisabled);
        }
        let lock = self.locks.get(lock_id)?;
        if lock.claimed {
            return Err(HtlcError::LockAlreadyClaimed(lock_id));
        }
        let now = self.clock.now;
        if now < lock.unlock_time {
            return Err(HtlcError::TimelockNotExpired {
                unlock_time: lock.unlock_time,
                now,
            });
        }
        if hashlock(secret) != lock.hashlock.0 {
            return Err(HtlcError::InvalidSecret);
        }

        // Any commitment left behind is inert: commit and reveal both refuse
        // a claimed lock.
        self.release(lock_id, caller)
    }

    /// Marks the lock claimed, then pays out. A failed payout restores the
    /// flag so the call leaves no trace.
    fn release(&mut self, lock_id: u64, to: Address) -> Result<()> {
        let (asset, amount) = {
            let lock = self.locks.get_mut(lock_id)?;
            lock.claimed = true;
            (lock.asset, lock.amount)
        };

        if let Err(err) = self.ledger.push(asset, to, amount) {
            self.locks.get_mut(lock_id)?.claimed = false;
            warn!(lock_id, error = %err, "payout failed; claim rolled back");
            return Err(err.into());
        }

        info!(lock_id, amount, claimer = %to, "lock claimed");
        self.events.push(HtlcEvent::LockClaimed {
            lock_id,
            claimer: to,
        });
        Ok(())
    }
}
