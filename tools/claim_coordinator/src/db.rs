use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::state::ClaimState;

pub trait ClaimDb: Send + Sync {
    fn save(&self, state: &ClaimState) -> Result<()>;
    fn load(&self, lock_id: u64) -> Result<Option<ClaimState>>;
}

/// One pretty-printed JSON file per lock under `base_dir`.
pub struct JsonFileDb {
    base_dir: PathBuf,
}

impl JsonFileDb {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("create directory {}", base_dir.display()))?;
        Ok(Self { base_dir })
    }

    fn claim_file_path(&self, lock_id: u64) -> PathBuf {
        self.base_dir.join(format!("claim-{lock_id}.json"))
    }
}

impl ClaimDb for JsonFileDb {
    fn save(&self, state: &ClaimState) -> Result<()> {
        let path = self.claim_file_path(state.lock_id());
        let json = serde_json::to_string_pretty(state)
            .with_context(|| format!("serialize claim state for lock {}", state.lock_id()))?;
        fs::write(&path, json).with_context(|| format!("write {}", path.display()))
    }

    fn load(&self, lock_id: u64) -> Result<Option<ClaimState>> {
        let path = self.claim_file_path(lock_id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let state = serde_json::from_str(&json).with_context(|| format!("parse {}", path.display()))?;
        Ok(Some(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saves_and_reloads_by_lock_id() {
        let temp = tempfile::TempDir::new().unwrap();
        let db = JsonFileDb::new(temp.path()).unwrap();
        assert!(db.load(3).unwrap().is_none());

        let state = ClaimState::Committed {
            lock_id: 3,
            claimer: "claimer".to_string(),
            salt: "aa".repeat(32),
            commitment: "bb".repeat(32),
            commit_block: 10,
            reveal_after_block: 15,
            commit_tx: "sig".to_string(),
        };
        db.save(&state).unwrap();
        assert_eq!(db.load(3).unwrap(), Some(state));

        let raw = fs::read_to_string(temp.path().join("claim-3.json")).unwrap();
        assert!(raw.contains("\"state\": \"committed\""));
    }
}
