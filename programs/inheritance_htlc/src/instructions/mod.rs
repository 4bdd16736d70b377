pub mod claim;
pub mod commit;
pub mod create_lock;
pub mod get_lock;
pub mod initialize;
pub mod reveal_and_claim;
