//! Statistics collection
//!
//! Each worker keeps its own `WorkerStats` (no sharing, no locks). After the
//! join the distributor hands them to the aggregator for a per-run view.

pub mod aggregator;
pub mod histogram;

use crate::Result;
use histogram::LatencyHistogram;
use std::time::Duration;

/// Statistics of one worker over one run
#[derive(Debug, Clone, Default)]
pub struct WorkerStats {
    succeeded: u64,
    failed: u64,
    /// Time spent inside the transform, successes and failures alike
    busy: Duration,
    latency: LatencyHistogram,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully processed image
    pub fn record_success(&mut self, latency: Duration) {
        self.succeeded += 1;
        self.busy += latency;
        self.latency.record(latency);
    }

    /// Record an image that failed; failures stay out of the latency histogram
    pub fn record_failure(&mut self, latency: Duration) {
        self.failed += 1;
        self.busy += latency;
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn processed(&self) -> u64 {
        self.succeeded + self.failed
    }

    pub fn busy(&self) -> Duration {
        self.busy
    }

    pub fn latency(&self) -> &LatencyHistogram {
        &self.latency
    }

    /// Merge another worker's statistics into this one
    pub fn merge(&mut self, other: &WorkerStats) -> Result<()> {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.busy += other.busy;
        self.latency.merge(&other.latency)
    }
}
