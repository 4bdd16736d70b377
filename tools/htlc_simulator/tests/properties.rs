use htlc_sdk::{commitment_digest, hashlock};
use htlc_simulator::{
    Address, ChainClock, EngineConfig, Hash32, HtlcEngine, HtlcError, InMemoryLedger,
    MIN_COMMIT_DELAY_BLOCKS,
};
use proptest::prelude::*;

const START: i64 = 1_700_000_000;

fn funded_engine(balance: u64) -> (HtlcEngine<InMemoryLedger>, Address, Address) {
    let asset = Address::from_label("token");
    let depositor = Address::from_label("depositor");
    let mut ledger = InMemoryLedger::new();
    ledger.mint(asset, depositor, balance).expect("mint");
    (
        HtlcEngine::new(EngineConfig::default(), ChainClock::starting_at(START), ledger),
        asset,
        depositor,
    )
}

proptest! {
    #[test]
    fn lock_ids_are_dense_and_never_reused(
        requests in prop::collection::vec((0u64..50, -5i64..100), 1..40)
    ) {
        let (mut engine, asset, depositor) = funded_engine(400);
        let mut issued: Vec<u64> = Vec::new();

        for (amount, offset) in requests {
            match engine.create_lock(depositor, asset, amount, Hash32([1; 32]), START + offset) {
                Ok(id) => {
                    if let Some(last) = issued.last() {
                        prop_assert_eq!(id, last + 1);
                    } else {
                        prop_assert_eq!(id, 0);
                    }
                    issued.push(id);
                }
                Err(HtlcError::InvalidAmount) => prop_assert_eq!(amount, 0),
                Err(HtlcError::InvalidUnlockTime { .. }) => prop_assert!(offset <= 0),
                Err(HtlcError::Ledger(_)) => {}
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }

        prop_assert_eq!(engine.locks().len(), issued.len());
        let locked: u64 = engine.locks().iter().map(|lock| lock.amount).sum();
        prop_assert_eq!(engine.ledger().custody_of(asset), locked);
        prop_assert_eq!(engine.ledger().balance_of(asset, depositor), 400 - locked);
    }

    #[test]
    fn only_the_preimage_opens_the_lock(
        secret in prop::collection::vec(any::<u8>(), 1..64),
        guess in prop::collection::vec(any::<u8>(), 0..64),
        salt in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        prop_assume!(guess != secret);
        let (mut engine, asset, depositor) = funded_engine(10);
        let claimant = Address::from_label("claimant");
        let id = engine
            .create_lock(depositor, asset, 10, Hash32(hashlock(&secret)), START + 1)
            .expect("create");
        engine
            .commit(claimant, id, Hash32(commitment_digest(id, &claimant.0, &secret, &salt)))
            .expect("commit");
        engine.advance(1, MIN_COMMIT_DELAY_BLOCKS);

        prop_assert_eq!(
            engine.reveal_and_claim(claimant, id, &guess, &salt),
            Err(HtlcError::InvalidSecret)
        );
        prop_assert!(engine.reveal_and_claim(claimant, id, &secret, &salt).is_ok());
        prop_assert_eq!(engine.ledger().balance_of(asset, claimant), 10);
    }
}
