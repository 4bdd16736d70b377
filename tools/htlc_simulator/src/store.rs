//! JSON persistence for the simulator CLI.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::chain::ChainClock;
use crate::engine::{EngineConfig, HtlcEngine};
use crate::ledger::InMemoryLedger;

const STATE_FILE: &str = "htlc_simulator_state.json";

pub type SimulatedEngine = HtlcEngine<InMemoryLedger>;

pub struct SimulatorStore {
    state_path: PathBuf,
}

impl SimulatorStore {
    pub fn open<P: AsRef<Path>>(state_dir: P) -> Result<Self> {
        let state_dir = state_dir.as_ref().to_path_buf();
        fs::create_dir_all(&state_dir)
            .with_context(|| format!("create directory {}", state_dir.display()))?;
        Ok(Self {
            state_path: state_dir.join(STATE_FILE),
        })
    }

    pub fn exists(&self) -> bool {
        self.state_path.exists()
    }

    /// Writes a fresh engine, replacing any existing state.
    pub fn init(&self, config: EngineConfig, now: i64) -> Result<SimulatedEngine> {
        let engine = HtlcEngine::new(config, ChainClock::starting_at(now), InMemoryLedger::new());
        self.save(&engine)?;
        Ok(engine)
    }

    /// Loads the saved engine, creating a default one on first use.
    pub fn load_or_init(&self, now: i64) -> Result<SimulatedEngine> {
        if !self.exists() {
            return self.init(EngineConfig::default(), now);
        }
        self.load()
    }

    pub fn load(&self) -> Result<SimulatedEngine> {
        let raw = fs::read_to_string(&self.state_path)
            .with_context(|| format!("read {}", self.state_path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse {}", self.state_path.display()))
    }

    pub fn save(&self, engine: &SimulatedEngine) -> Result<()> {
        let json = serde_json::to_string_pretty(engine).context("serialize simulator state")?;
        fs::write(&self.state_path, json)
            .with_context(|| format!("write {}", self.state_path.display()))
    }
}
