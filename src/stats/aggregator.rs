//! Statistics aggregation
//!
//! Merges per-worker statistics into a single run view while keeping the
//! per-worker details for the report.
//!
//! # Features
//!
//! - **Aggregate statistics**: counts, busy time and latency of all workers
//! - **Per-worker statistics**: kept by worker id, in id order
//! - **Node merging**: `extend` folds the aggregators of simulated nodes together
//!
//! # Example
//!
//! ```
//! use imgbench::stats::{WorkerStats, aggregator::StatisticsAggregator};
//! use std::time::Duration;
//!
//! let mut worker0 = WorkerStats::new();
//! worker0.record_success(Duration::from_millis(10));
//!
//! let mut worker1 = WorkerStats::new();
//! worker1.record_failure(Duration::from_millis(2));
//!
//! let mut aggregator = StatisticsAggregator::new();
//! aggregator.add_worker(0, worker0);
//! aggregator.add_worker(1, worker1);
//!
//! let aggregate = aggregator.aggregate().unwrap();
//! assert_eq!(aggregate.succeeded(), 1);
//! assert_eq!(aggregate.failed(), 1);
//! ```

use crate::stats::WorkerStats;
use crate::Result;
use std::collections::BTreeMap;

/// Statistics aggregator for the workers of one run
///
/// # Usage
///
/// 1. Create with `new()`
/// 2. Add each joined worker's stats with `add_worker()`
/// 3. Read the merged view with `aggregate()`, or walk `per_worker()`
///
/// Worker ids are unique within a run; in distributed mode the workers of
/// node `i` (0-based) start at `i * workers_per_node`, so node aggregators
/// never collide.
#[derive(Debug, Default, Clone)]
pub struct StatisticsAggregator {
    /// Per-worker statistics (worker_id -> stats), ordered by id
    workers: BTreeMap<usize, WorkerStats>,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add statistics from a worker, replacing any earlier entry for the id
    pub fn add_worker(&mut self, worker_id: usize, stats: WorkerStats) {
        self.workers.insert(worker_id, stats);
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Merge all workers into a single view
    ///
    /// Fails only if two histograms cannot be combined.
    pub fn aggregate(&self) -> Result<WorkerStats> {
        let mut aggregate = WorkerStats::new();
        for stats in self.workers.values() {
            aggregate.merge(stats)?;
        }
        Ok(aggregate)
    }

    pub fn worker_stats(&self, worker_id: usize) -> Option<&WorkerStats> {
        self.workers.get(&worker_id)
    }

    /// Per-worker statistics in ascending worker id order
    pub fn per_worker(&self) -> impl Iterator<Item = (usize, &WorkerStats)> {
        self.workers.iter().map(|(&id, stats)| (id, stats))
    }

    /// Absorb another aggregator, e.g. one per simulated node
    pub fn extend(&mut self, other: StatisticsAggregator) {
        self.workers.extend(other.workers);
    }
}
