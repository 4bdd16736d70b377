//! Claim state machine driver.
//!
//! The protocol never waits; the claimant does. `step` performs at most one
//! transaction per call and reports what it is waiting for otherwise, so the
//! caller decides how to poll.

use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use htlc_sdk::{commitment_digest, hex_encode, random_salt, verify_hashlock};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::PollConfig;
use crate::db::ClaimDb;
use crate::metrics::ClaimMetrics;
use crate::state::ClaimState;

/// What the claim flow needs to know about a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSnapshot {
    pub claimed: bool,
    pub unlock_time: i64,
    pub now: i64,
    pub hashlock: [u8; 32],
}

/// Protocol rejections the driver reacts to instead of bubbling up. Clients
/// wrap recognized failures in this type so the driver can downcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("lock already claimed")]
    AlreadyClaimed,
    #[error("commitment was replaced by another committer")]
    CommitmentReplaced,
}

#[async_trait]
pub trait HtlcClient: Send + Sync {
    /// The account that commits and receives the funds.
    fn claimer(&self) -> [u8; 32];
    fn claimer_label(&self) -> String;
    async fn lock_status(&self, lock_id: u64) -> Result<LockSnapshot>;
    async fn current_block(&self) -> Result<u64>;
    async fn min_commit_delay_blocks(&self) -> Result<u64>;
    /// Returns the transaction reference and the block the commit landed in.
    async fn commit(&self, lock_id: u64, digest: [u8; 32]) -> Result<(String, u64)>;
    async fn reveal_and_claim(&self, lock_id: u64, secret: &[u8], salt: &[u8]) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    Timelock { unlock_time: i64, now: i64 },
    CommitDelay { reveal_after_block: u64, current_block: u64 },
}

impl WaitReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Timelock { .. } => "timelock",
            Self::CommitDelay { .. } => "commit_delay",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Advanced(ClaimState),
    Waiting(WaitReason),
    Done,
}

pub async fn step<D, C, M>(
    state: &ClaimState,
    db: &D,
    client: &C,
    metrics: &M,
    secret: &[u8],
) -> Result<StepOutcome>
where
    D: ClaimDb,
    C: HtlcClient,
    M: ClaimMetrics,
{
    let next = match state {
        ClaimState::Claimed { .. } | ClaimState::Abandoned { .. } => return Ok(StepOutcome::Done),
        ClaimState::Pending { lock_id, claimer } => {
            let status = client.lock_status(*lock_id).await?;
            if status.claimed {
                abandoned(*lock_id, "lock already claimed")
            } else if !verify_hashlock(secret, &status.hashlock) {
                return Err(anyhow!("secret does not open lock {lock_id}"));
            } else if status.now < status.unlock_time {
                return Ok(wait(
                    metrics,
                    WaitReason::Timelock {
                        unlock_time: status.unlock_time,
                        now: status.now,
                    },
                ));
            } else {
                commit(*lock_id, claimer, client, metrics, secret).await?
            }
        }
        ClaimState::Committed {
            lock_id,
            claimer,
            salt,
            reveal_after_block,
            ..
        } => {
            let status = client.lock_status(*lock_id).await?;
            if status.claimed {
                abandoned(*lock_id, "lock claimed before reveal")
            } else {
                let current_block = client.current_block().await?;
                if current_block < *reveal_after_block {
                    return Ok(wait(
                        metrics,
                        WaitReason::CommitDelay {
                            reveal_after_block: *reveal_after_block,
                            current_block,
                        },
                    ));
                }
                let salt_bytes = htlc_sdk::decode_hex(salt)?;
                let started = Instant::now();
                match client.reveal_and_claim(*lock_id, secret, &salt_bytes).await {
                    Ok(claim_tx) => {
                        metrics.record_latency("reveal_and_claim", started.elapsed());
                        info!(lock_id, %claim_tx, "claimed");
                        ClaimState::Claimed {
                            lock_id: *lock_id,
                            claim_tx,
                        }
                    }
                    Err(err) => match err.downcast_ref::<Rejection>() {
                        Some(Rejection::AlreadyClaimed) => abandoned(*lock_id, "lock already claimed"),
                        Some(Rejection::CommitmentReplaced) => {
                            warn!(lock_id, "commitment replaced; committing again");
                            ClaimState::pending(*lock_id, claimer.clone())
                        }
                        None => return Err(err),
                    },
                }
            }
        }
    };

    db.save(&next)?;
    metrics.record_transition(state, &next);
    Ok(StepOutcome::Advanced(next))
}

async fn commit<C, M>(
    lock_id: u64,
    claimer: &str,
    client: &C,
    metrics: &M,
    secret: &[u8],
) -> Result<ClaimState>
where
    C: HtlcClient,
    M: ClaimMetrics,
{
    let salt = random_salt();
    let digest = commitment_digest(lock_id, &client.claimer(), secret, &salt);
    let started = Instant::now();
    let (commit_tx, commit_block) = match client.commit(lock_id, digest).await {
        Ok(committed) => committed,
        Err(err) => match err.downcast_ref::<Rejection>() {
            Some(Rejection::AlreadyClaimed) => return Ok(abandoned(lock_id, "lock already claimed")),
            Some(Rejection::CommitmentReplaced) => {
                warn!(lock_id, "commitment replaced as it landed; committing again");
                return Ok(ClaimState::pending(lock_id, claimer));
            }
            None => return Err(err),
        },
    };
    metrics.record_latency("commit", started.elapsed());
    let delay = client.min_commit_delay_blocks().await?;
    let reveal_after_block = commit_block.saturating_add(delay);
    info!(lock_id, commit_block, reveal_after_block, "committed");

    Ok(ClaimState::Committed {
        lock_id,
        claimer: claimer.to_string(),
        salt: hex_encode(&salt),
        commitment: hex_encode(&digest),
        commit_block,
        reveal_after_block,
        commit_tx,
    })
}

fn abandoned(lock_id: u64, reason: &str) -> ClaimState {
    warn!(lock_id, reason, "claim abandoned");
    ClaimState::Abandoned {
        lock_id,
        reason: reason.to_string(),
    }
}

fn wait<M: ClaimMetrics>(metrics: &M, reason: WaitReason) -> StepOutcome {
    debug!(?reason, "waiting");
    metrics.record_wait(reason.label());
    StepOutcome::Waiting(reason)
}

/// Steps until the claim is terminal, sleeping `poll.interval` whenever the
/// lock is not ready. Gives up after `poll.max_polls` consecutive waits or
/// once more than `poll.max_recommits` commitments have been replaced.
pub async fn run_to_completion<D, C, M>(
    initial: ClaimState,
    db: &D,
    client: &C,
    metrics: &M,
    secret: &[u8],
    poll: &PollConfig,
) -> Result<ClaimState>
where
    D: ClaimDb,
    C: HtlcClient,
    M: ClaimMetrics,
{
    let mut current = initial;
    let mut waits = 0u64;
    let mut recommits = 0u64;
    loop {
        match step(&current, db, client, metrics, secret).await? {
            StepOutcome::Advanced(next) => {
                if matches!(next, ClaimState::Pending { .. }) {
                    recommits += 1;
                    if recommits > poll.max_recommits {
                        return Err(anyhow!(
                            "gave up on lock {} after {} replaced commitments",
                            next.lock_id(),
                            poll.max_recommits
                        ));
                    }
                }
                waits = 0;
                current = next;
            }
            StepOutcome::Waiting(reason) => {
                waits += 1;
                if waits > poll.max_polls {
                    return Err(anyhow!(
                        "gave up on lock {} after {} polls ({:?})",
                        current.lock_id(),
                        poll.max_polls,
                        reason
                    ));
                }
                if poll.interval > Duration::ZERO {
                    sleep(poll.interval).await;
                }
            }
            StepOutcome::Done => return Ok(current),
        }
    }
}
