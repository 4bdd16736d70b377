//! `HtlcClient` backed by the in-process reference engine.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use htlc_simulator::{Address, Hash32, HtlcError, SimulatedEngine, MIN_COMMIT_DELAY_BLOCKS};

use crate::driver::{HtlcClient, LockSnapshot, Rejection};

pub type SharedEngine = Arc<Mutex<SimulatedEngine>>;

pub struct SimulatedHtlcClient {
    engine: SharedEngine,
    claimer: Address,
    label: String,
    seconds_per_poll: i64,
    blocks_per_poll: u64,
    tx_counter: Mutex<u64>,
}

impl SimulatedHtlcClient {
    pub fn new(engine: SharedEngine, claimer_label: &str) -> Self {
        Self {
            engine,
            claimer: Address::parse(claimer_label),
            label: claimer_label.to_string(),
            seconds_per_poll: 0,
            blocks_per_poll: 0,
            tx_counter: Mutex::new(0),
        }
    }

    /// Moves the simulated chain forward on every status poll, standing in
    /// for the real passage of time while the driver waits.
    pub fn with_auto_advance(mut self, seconds_per_poll: i64, blocks_per_poll: u64) -> Self {
        self.seconds_per_poll = seconds_per_poll;
        self.blocks_per_poll = blocks_per_poll;
        self
    }

    pub fn claimer_address(&self) -> Address {
        self.claimer
    }

    fn engine(&self) -> Result<MutexGuard<'_, SimulatedEngine>> {
        self.engine
            .lock()
            .map_err(|_| anyhow!("simulator engine lock poisoned"))
    }

    fn next_tx(&self, kind: &str) -> Result<String> {
        let mut counter = self
            .tx_counter
            .lock()
            .map_err(|_| anyhow!("tx counter lock poisoned"))?;
        *counter += 1;
        Ok(format!("sim-{kind}-{}", *counter))
    }
}

fn classify(err: HtlcError) -> anyhow::Error {
    match err {
        HtlcError::LockAlreadyClaimed(_) => anyhow::Error::new(Rejection::AlreadyClaimed),
        HtlcError::CommitterMismatch | HtlcError::CommitmentMismatch => {
            anyhow::Error::new(Rejection::CommitmentReplaced)
        }
        other => anyhow::Error::new(other),
    }
}

#[async_trait]
impl HtlcClient for SimulatedHtlcClient {
    fn claimer(&self) -> [u8; 32] {
        self.claimer.to_bytes()
    }

    fn claimer_label(&self) -> String {
        self.label.clone()
    }

    async fn lock_status(&self, lock_id: u64) -> Result<LockSnapshot> {
        let mut engine = self.engine()?;
        if self.seconds_per_poll != 0 || self.blocks_per_poll != 0 {
            engine.advance(self.seconds_per_poll, self.blocks_per_poll);
        }
        let status = engine.lock_status(lock_id).map_err(classify)?;
        Ok(LockSnapshot {
            claimed: status.claimed,
            unlock_time: status.unlock_time,
            now: status.now,
            hashlock: status.hashlock.to_bytes(),
        })
    }

    async fn current_block(&self) -> Result<u64> {
        Ok(self.engine()?.clock().block_height)
    }

    async fn min_commit_delay_blocks(&self) -> Result<u64> {
        Ok(MIN_COMMIT_DELAY_BLOCKS)
    }

    async fn commit(&self, lock_id: u64, digest: [u8; 32]) -> Result<(String, u64)> {
        let commit_block = self
            .engine()?
            .commit(self.claimer, lock_id, Hash32(digest))
            .map_err(classify)?;
        Ok((self.next_tx("commit")?, commit_block))
    }

    async fn reveal_and_claim(&self, lock_id: u64, secret: &[u8], salt: &[u8]) -> Result<String> {
        self.engine()?
            .reveal_and_claim(self.claimer, lock_id, secret, salt)
            .map_err(classify)?;
        self.next_tx("reveal")
    }
}
