use serde::{Deserialize, Serialize};

/// Ledger time and block height as seen by the engine. Nothing advances on
/// its own; tests and the CLI move it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainClock {
    pub now: i64,
    pub block_height: u64,
}

impl ChainClock {
    pub fn starting_at(now: i64) -> Self {
        Self {
            now,
            block_height: 0,
        }
    }

    pub fn advance(&mut self, seconds: i64, blocks: u64) {
        self.now = self.now.saturating_add(seconds);
        self.block_height = self.block_height.saturating_add(blocks);
    }
}
