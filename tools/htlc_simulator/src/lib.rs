//! Reference engine for the inheritance HTLC.
//!
//! Mirrors the on-chain program's rules against an in-memory token ledger
//! and an explicitly driven clock, so every invariant can be exercised
//! without a validator.

pub mod chain;
pub mod engine;
pub mod events;
pub mod ledger;
pub mod registry;
pub mod store;
pub mod types;

/// Blocks that must pass between a commitment and the reveal that spends it.
pub const MIN_COMMIT_DELAY_BLOCKS: u64 = 5;

pub use chain::ChainClock;
pub use engine::{EngineConfig, HtlcEngine, LockStatus};
pub use events::HtlcEvent;
pub use ledger::{InMemoryLedger, TokenLedger};
pub use registry::{Commitment, CommitmentRegistry, Lock, LockRegistry};
pub use store::{SimulatedEngine, SimulatorStore};
pub use types::{Address, Hash32, HtlcError, LedgerError, Result};
