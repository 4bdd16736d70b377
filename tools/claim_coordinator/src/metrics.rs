use std::time::Duration;

use tracing::info;

use crate::state::ClaimState;

pub trait ClaimMetrics: Send + Sync {
    fn record_transition(&self, from: &ClaimState, to: &ClaimState);
    fn record_latency(&self, stage: &'static str, elapsed: Duration);
    fn record_wait(&self, reason: &'static str);
}

#[derive(Default, Debug, Clone)]
pub struct NoopMetrics;

impl ClaimMetrics for NoopMetrics {
    fn record_transition(&self, _from: &ClaimState, _to: &ClaimState) {}
    fn record_latency(&self, _stage: &'static str, _elapsed: Duration) {}
    fn record_wait(&self, _reason: &'static str) {}
}

/// Emits each measurement as a structured `tracing` event.
#[derive(Default, Debug, Clone)]
pub struct TracingMetrics;

impl ClaimMetrics for TracingMetrics {
    fn record_transition(&self, from: &ClaimState, to: &ClaimState) {
        info!(
            target: "claim_metrics",
            lock_id = to.lock_id(),
            from = from.name(),
            to = to.name(),
            "transition"
        );
    }

    fn record_latency(&self, stage: &'static str, elapsed: Duration) {
        info!(
            target: "claim_metrics",
            stage,
            elapsed_ms = elapsed.as_millis() as u64,
            "latency"
        );
    }

    fn record_wait(&self, reason: &'static str) {
        info!(target: "claim_metrics", reason, "wait");
    }
}
