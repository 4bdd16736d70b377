//! Instruction tracing, compiled in only with the `debug-logs` feature so
//! release builds pay no compute for it.

#[cfg(feature = "debug-logs")]
use anchor_lang::prelude::msg;

#[cfg(feature = "debug-logs")]
pub fn debug_log(message: &str) {
    msg!(message);
}

#[cfg(feature = "debug-logs")]
pub fn debug_log_lock(stage: &str, lock_id: u64) {
    msg!("{}: lock_id={}", stage, lock_id);
}

#[cfg(not(feature = "debug-logs"))]
pub fn debug_log(_message: &str) {}

#[cfg(not(feature = "debug-logs"))]
pub fn debug_log_lock(_stage: &str, _lock_id: u64) {}
