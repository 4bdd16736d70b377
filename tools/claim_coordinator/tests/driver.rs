use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use claim_coordinator::config::PollConfig;
use claim_coordinator::db::{ClaimDb, JsonFileDb};
use claim_coordinator::driver::{
    run_to_completion, step, HtlcClient, LockSnapshot, Rejection, StepOutcome, WaitReason,
};
use claim_coordinator::metrics::{ClaimMetrics, NoopMetrics};
use claim_coordinator::sim::{SharedEngine, SimulatedHtlcClient};
use claim_coordinator::state::ClaimState;
use htlc_sdk::{commitment_digest, hashlock};
use htlc_simulator::{
    Address, ChainClock, EngineConfig, Hash32, HtlcEngine, InMemoryLedger, MIN_COMMIT_DELAY_BLOCKS,
};

const START: i64 = 1_700_000_000;
const SECRET: &[u8] = b"my-secret";

struct MemoryDb {
    states: Arc<Mutex<Vec<ClaimState>>>,
}

impl MemoryDb {
    fn new() -> Self {
        Self {
            states: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ClaimDb for MemoryDb {
    fn save(&self, state: &ClaimState) -> Result<()> {
        self.states.lock().unwrap().push(state.clone());
        Ok(())
    }

    fn load(&self, lock_id: u64) -> Result<Option<ClaimState>> {
        Ok(self
            .states
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|state| state.lock_id() == lock_id)
            .cloned())
    }
}

#[derive(Default)]
struct TestMetrics {
    transitions: Arc<Mutex<Vec<(String, String)>>>,
    latencies: Arc<Mutex<Vec<String>>>,
    waits: Arc<Mutex<Vec<String>>>,
}

impl ClaimMetrics for TestMetrics {
    fn record_transition(&self, from: &ClaimState, to: &ClaimState) {
        self.transitions
            .lock()
            .unwrap()
            .push((from.name().to_string(), to.name().to_string()));
    }

    fn record_latency(&self, stage: &'static str, _elapsed: Duration) {
        self.latencies.lock().unwrap().push(stage.to_string());
    }

    fn record_wait(&self, reason: &'static str) {
        self.waits.lock().unwrap().push(reason.to_string());
    }
}

fn engine_with_lock(config: EngineConfig) -> (SharedEngine, u64) {
    let asset = Address::from_label("token");
    let depositor = Address::from_label("depositor");
    let mut ledger = InMemoryLedger::new();
    ledger.mint(asset, depositor, 10).unwrap();
    let mut engine = HtlcEngine::new(config, ChainClock::starting_at(START), ledger);
    let lock_id = engine
        .create_lock(depositor, asset, 10, Hash32(hashlock(SECRET)), START + 3600)
        .unwrap();
    (Arc::new(Mutex::new(engine)), lock_id)
}

fn fast_poll(max_polls: u64) -> PollConfig {
    PollConfig {
        interval: Duration::ZERO,
        max_polls,
        ..PollConfig::default()
    }
}

/// Lets a rival commit to the same lock right after every commit of ours.
struct OutbidClient {
    inner: SimulatedHtlcClient,
    engine: SharedEngine,
    rival: Address,
    /// Report the overwrite from `commit` itself, the way the RPC client
    /// does when the stored commitment is not ours.
    detect_on_commit: bool,
}

impl OutbidClient {
    fn new(engine: SharedEngine, detect_on_commit: bool) -> Self {
        Self {
            inner: SimulatedHtlcClient::new(engine.clone(), "beneficiary").with_auto_advance(0, 1),
            engine,
            rival: Address::from_label("rival"),
            detect_on_commit,
        }
    }
}

#[async_trait]
impl HtlcClient for OutbidClient {
    fn claimer(&self) -> [u8; 32] {
        self.inner.claimer()
    }

    fn claimer_label(&self) -> String {
        self.inner.claimer_label()
    }

    async fn lock_status(&self, lock_id: u64) -> Result<LockSnapshot> {
        self.inner.lock_status(lock_id).await
    }

    async fn current_block(&self) -> Result<u64> {
        self.inner.current_block().await
    }

    async fn min_commit_delay_blocks(&self) -> Result<u64> {
        self.inner.min_commit_delay_blocks().await
    }

    async fn commit(&self, lock_id: u64, digest: [u8; 32]) -> Result<(String, u64)> {
        let committed = self.inner.commit(lock_id, digest).await?;
        let rival_digest = commitment_digest(lock_id, &self.rival.0, SECRET, b"rival-salt");
        self.engine
            .lock()
            .unwrap()
            .commit(self.rival, lock_id, Hash32(rival_digest))
            .unwrap();
        if self.detect_on_commit {
            return Err(Rejection::CommitmentReplaced.into());
        }
        Ok(committed)
    }

    async fn reveal_and_claim(&self, lock_id: u64, secret: &[u8], salt: &[u8]) -> Result<String> {
        self.inner.reveal_and_claim(lock_id, secret, salt).await
    }
}

#[tokio::test]
async fn claims_after_timelock_and_commit_delay() {
    let (engine, lock_id) = engine_with_lock(EngineConfig::default());
    let client = SimulatedHtlcClient::new(engine.clone(), "beneficiary").with_auto_advance(600, 1);
    let db = MemoryDb::new();
    let metrics = TestMetrics::default();

    let final_state = run_to_completion(
        ClaimState::pending(lock_id, client.claimer_label()),
        &db,
        &client,
        &metrics,
        SECRET,
        &fast_poll(100),
    )
    .await
    .unwrap();

    assert!(matches!(final_state, ClaimState::Claimed { lock_id: 0, .. }));
    let engine = engine.lock().unwrap();
    assert_eq!(
        engine
            .ledger()
            .balance_of(Address::from_label("token"), client.claimer_address()),
        10
    );

    let transitions = metrics.transitions.lock().unwrap();
    assert_eq!(
        transitions.as_slice(),
        &[
            ("pending".to_string(), "committed".to_string()),
            ("committed".to_string(), "claimed".to_string()),
        ]
    );
    assert_eq!(
        metrics.latencies.lock().unwrap().as_slice(),
        &["commit", "reveal_and_claim"]
    );
    let waits = metrics.waits.lock().unwrap();
    assert!(waits.iter().any(|w| w == "timelock"));
    assert!(waits.iter().any(|w| w == "commit_delay"));

    let saved = db.states.lock().unwrap();
    match &saved[0] {
        ClaimState::Committed {
            commit_block,
            reveal_after_block,
            ..
        } => assert_eq!(*reveal_after_block, commit_block + MIN_COMMIT_DELAY_BLOCKS),
        other => panic!("expected committed state first, got {other:?}"),
    }
}

#[tokio::test]
async fn waits_for_timelock_before_committing() {
    let (engine, lock_id) = engine_with_lock(EngineConfig::default());
    let client = SimulatedHtlcClient::new(engine.clone(), "beneficiary");
    let db = MemoryDb::new();

    let outcome = step(
        &ClaimState::pending(lock_id, "beneficiary"),
        &db,
        &client,
        &NoopMetrics,
        SECRET,
    )
    .await
    .unwrap();
    assert_eq!(
        outcome,
        StepOutcome::Waiting(WaitReason::Timelock {
            unlock_time: START + 3600,
            now: START
        })
    );
    assert!(engine.lock().unwrap().commitments().is_empty());
    assert!(db.states.lock().unwrap().is_empty());
}

#[tokio::test]
async fn wrong_secret_is_refused_before_committing() {
    let (engine, lock_id) = engine_with_lock(EngineConfig::default());
    engine.lock().unwrap().advance(3600, 0);
    let client = SimulatedHtlcClient::new(engine.clone(), "beneficiary");

    let err = step(
        &ClaimState::pending(lock_id, "beneficiary"),
        &MemoryDb::new(),
        &client,
        &NoopMetrics,
        b"not-the-secret",
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("secret does not open lock"));
    assert!(engine.lock().unwrap().commitments().is_empty());
}

#[tokio::test]
async fn abandons_lock_claimed_by_someone_else() {
    let (engine, lock_id) = engine_with_lock(EngineConfig {
        allow_direct_claim: true,
    });
    {
        let mut engine = engine.lock().unwrap();
        engine.advance(3600, 0);
        engine.claim(Address::from_label("observer"), lock_id, SECRET).unwrap();
    }
    let client = SimulatedHtlcClient::new(engine, "beneficiary");
    let db = MemoryDb::new();

    let outcome = step(
        &ClaimState::pending(lock_id, "beneficiary"),
        &db,
        &client,
        &NoopMetrics,
        SECRET,
    )
    .await
    .unwrap();
    assert!(matches!(
        outcome,
        StepOutcome::Advanced(ClaimState::Abandoned { .. })
    ));
    assert!(db.load(lock_id).unwrap().unwrap().is_terminal());
}

#[tokio::test]
async fn recommits_when_commitment_is_overwritten() {
    let (engine, lock_id) = engine_with_lock(EngineConfig::default());
    engine.lock().unwrap().advance(3600, 0);
    let client = SimulatedHtlcClient::new(engine.clone(), "beneficiary");
    let db = MemoryDb::new();

    let committed = match step(
        &ClaimState::pending(lock_id, "beneficiary"),
        &db,
        &client,
        &NoopMetrics,
        SECRET,
    )
    .await
    .unwrap()
    {
        StepOutcome::Advanced(state @ ClaimState::Committed { .. }) => state,
        other => panic!("expected commit, got {other:?}"),
    };

    {
        let mut engine = engine.lock().unwrap();
        let griefer = Address::from_label("griefer");
        engine
            .commit(
                griefer,
                lock_id,
                Hash32(commitment_digest(lock_id, &griefer.0, SECRET, b"x")),
            )
            .unwrap();
        engine.advance(0, MIN_COMMIT_DELAY_BLOCKS);
    }

    let outcome = step(&committed, &db, &client, &NoopMetrics, SECRET).await.unwrap();
    let pending = match outcome {
        StepOutcome::Advanced(state @ ClaimState::Pending { .. }) => state,
        other => panic!("expected pending, got {other:?}"),
    };

    let final_state = {
        let client = client.with_auto_advance(0, 1);
        run_to_completion(pending, &db, &client, &NoopMetrics, SECRET, &fast_poll(20))
            .await
            .unwrap()
    };
    assert!(matches!(final_state, ClaimState::Claimed { .. }));
}

#[tokio::test]
async fn gives_up_after_max_polls() {
    let (engine, lock_id) = engine_with_lock(EngineConfig::default());
    let client = SimulatedHtlcClient::new(engine, "beneficiary");

    let err = run_to_completion(
        ClaimState::pending(lock_id, "beneficiary"),
        &MemoryDb::new(),
        &client,
        &NoopMetrics,
        SECRET,
        &fast_poll(2),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("gave up on lock 0"));
}

#[tokio::test]
async fn resumes_from_persisted_commitment_without_storing_secret() {
    let temp = tempfile::TempDir::new().unwrap();
    let db = JsonFileDb::new(temp.path()).unwrap();
    let (engine, lock_id) = engine_with_lock(EngineConfig::default());
    engine.lock().unwrap().advance(3600, 0);

    {
        let client = SimulatedHtlcClient::new(engine.clone(), "beneficiary");
        step(
            &ClaimState::pending(lock_id, "beneficiary"),
            &db,
            &client,
            &NoopMetrics,
            SECRET,
        )
        .await
        .unwrap();
    }

    let raw = std::fs::read_to_string(temp.path().join("claim-0.json")).unwrap();
    assert!(!raw.contains(&hex::encode(SECRET)));
    assert!(!raw.contains("my-secret"));

    let saved = db.load(lock_id).unwrap().unwrap();
    assert_eq!(saved.name(), "committed");
    let client = SimulatedHtlcClient::new(engine, "beneficiary").with_auto_advance(0, 1);
    let final_state = run_to_completion(saved, &db, &client, &NoopMetrics, SECRET, &fast_poll(20))
        .await
        .unwrap();
    assert!(matches!(final_state, ClaimState::Claimed { .. }));
    assert_eq!(db.load(lock_id).unwrap(), Some(final_state));
}

#[tokio::test]
async fn commitment_replaced_as_it_lands_stays_pending() {
    let (engine, lock_id) = engine_with_lock(EngineConfig::default());
    engine.lock().unwrap().advance(3600, 0);
    let client = OutbidClient::new(engine, true);
    let db = MemoryDb::new();
    let metrics = TestMetrics::default();

    let outcome = step(
        &ClaimState::pending(lock_id, "beneficiary"),
        &db,
        &client,
        &metrics,
        SECRET,
    )
    .await
    .unwrap();
    assert_eq!(
        outcome,
        StepOutcome::Advanced(ClaimState::pending(lock_id, "beneficiary"))
    );
    assert!(metrics.latencies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stops_recommitting_against_endless_overwrites() {
    for detect_on_commit in [false, true] {
        let (engine, lock_id) = engine_with_lock(EngineConfig::default());
        engine.lock().unwrap().advance(3600, 0);
        let client = OutbidClient::new(engine.clone(), detect_on_commit);
        let poll = PollConfig {
            max_recommits: 3,
            ..fast_poll(100)
        };

        let err = run_to_completion(
            ClaimState::pending(lock_id, "beneficiary"),
            &MemoryDb::new(),
            &client,
            &NoopMetrics,
            SECRET,
            &poll,
        )
        .await
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("gave up on lock 0 after 3 replaced commitments"));
        assert!(!engine.lock().unwrap().get_lock(lock_id).unwrap().claimed);
    }
}
