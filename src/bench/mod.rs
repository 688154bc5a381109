//! Benchmark harness
//!
//! Runs the distributor once per `RunConfig`, measures wall-clock time and
//! derives speedup and efficiency against a single-worker baseline.
//!
//! Every configuration gets a fresh pool, so the measured time includes pool
//! startup.
//!
//! # Example
//!
//! ```
//! use imgbench::bench::{efficiency, speedup};
//! use std::time::Duration;
//!
//! let s = speedup(Duration::from_secs_f64(1.0), Duration::from_secs_f64(0.5)).unwrap();
//! assert!((s - 2.0).abs() < 1e-9);
//! assert!((efficiency(s, 2) - 1.0).abs() < 1e-9);
//! ```

use crate::config::{Mode, RunConfig};
use crate::dataset::ImageRecord;
use crate::error::{BenchError, ItemError};
use crate::stats::histogram::LatencySummary;
use crate::worker::{node, NodeReport, RunOutcome, WorkDistributor};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Result of one measured configuration
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub mode: Mode,
    /// Workers per pool (per node in distributed mode)
    pub workers: usize,
    /// Workers across all nodes; the efficiency divisor
    pub total_workers: usize,
    #[serde(with = "crate::util::time::serde_secs")]
    pub elapsed: Duration,
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
    /// baseline / elapsed; None without a baseline
    pub speedup: Option<f64>,
    /// speedup / total_workers; None without a baseline
    pub efficiency: Option<f64>,
    pub latency: LatencySummary,
    /// Time workers spent inside the transform, summed over workers
    #[serde(with = "crate::util::time::serde_secs")]
    pub busy: Duration,
    /// busy / (elapsed * total_workers); None for a zero elapsed time
    pub utilisation: Option<f64>,
    /// Records that failed, in input order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ItemError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeReport>,
    /// Sum of node times over elapsed (distributed mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_overlap: Option<f64>,
}

impl RunResult {
    fn from_outcome(config: &RunConfig, elapsed: Duration, outcome: &RunOutcome) -> Result<Self, BenchError> {
        let aggregate = outcome
            .stats
            .aggregate()
            .map_err(|e| BenchError::Setup(format!("cannot merge worker statistics: {}", e)))?;

        let node_overlap = if config.mode == Mode::Distributed {
            node::node_overlap(&outcome.nodes, elapsed)
        } else {
            None
        };

        Ok(Self {
            mode: config.mode,
            workers: config.workers,
            total_workers: config.total_workers(),
            elapsed,
            succeeded: outcome.succeeded(),
            failed: outcome.failed(),
            total: outcome.total(),
            speedup: None,
            efficiency: None,
            latency: LatencySummary::from_histogram(aggregate.latency()),
            busy: aggregate.busy(),
            utilisation: utilisation(aggregate.busy(), elapsed, config.total_workers()),
            failures: outcome.errors().cloned().collect(),
            nodes: outcome.nodes.clone(),
            node_overlap,
        })
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            mode: self.mode,
            workers: self.workers,
        }
    }
}

/// Speedup of a run against the baseline: `baseline / elapsed`
///
/// None when `elapsed` is zero (e.g. an empty image set).
pub fn speedup(baseline: Duration, elapsed: Duration) -> Option<f64> {
    if elapsed.is_zero() {
        return None;
    }
    Some(baseline.as_secs_f64() / elapsed.as_secs_f64())
}

/// Efficiency of a run: `speedup / workers`
pub fn efficiency(speedup: f64, workers: usize) -> f64 {
    speedup / workers.max(1) as f64
}

/// Share of the pool's wall-clock capacity spent transforming images
///
/// Low values point at idle workers (uneven chunks, pool startup).
pub fn utilisation(busy: Duration, elapsed: Duration, workers: usize) -> Option<f64> {
    if elapsed.is_zero() {
        return None;
    }
    Some(busy.as_secs_f64() / (elapsed.as_secs_f64() * workers.max(1) as f64))
}

/// Fill in speedup and efficiency for every result
///
/// The baseline is `baseline` if given, otherwise the elapsed time of the
/// first single-worker result. Without either, both fields stay `None`.
pub fn derive_speedups(results: &mut [RunResult], baseline: Option<Duration>) -> Option<Duration> {
    let baseline = baseline.or_else(|| {
        results
            .iter()
            .find(|r| r.total_workers == 1)
            .map(|r| r.elapsed)
    });

    for result in results.iter_mut() {
        result.speedup = baseline.and_then(|b| speedup(b, result.elapsed));
        result.efficiency = result.speedup.map(|s| efficiency(s, result.total_workers));
    }

    baseline
}

/// Runs and times configurations on one distributor
pub struct Benchmark<'a> {
    distributor: &'a WorkDistributor,
    baseline: Option<Duration>,
}

impl<'a> Benchmark<'a> {
    pub fn new(distributor: &'a WorkDistributor) -> Self {
        Self {
            distributor,
            baseline: None,
        }
    }

    /// Reuse a previously measured single-worker time as the baseline
    pub fn with_baseline(mut self, baseline: Duration) -> Self {
        self.baseline = Some(baseline);
        self
    }

    /// Run and time a single configuration
    ///
    /// Speedup fields are left `None`; `benchmark` derives them.
    pub fn measure(&self, images: &[ImageRecord], config: &RunConfig) -> Result<RunResult, BenchError> {
        let start = Instant::now();
        let outcome = self.distributor.run(images, config)?;
        let elapsed = if images.is_empty() {
            Duration::ZERO
        } else {
            start.elapsed()
        };

        log::info!(
            "{}: {} of {} image(s) succeeded in {:.2}s",
            config,
            outcome.succeeded(),
            outcome.total(),
            elapsed.as_secs_f64()
        );

        RunResult::from_outcome(config, elapsed, &outcome)
    }

    /// Run every configuration in order and derive speedup/efficiency
    ///
    /// All configurations are validated before the first one runs.
    pub fn benchmark(&self, images: &[ImageRecord], configs: &[RunConfig]) -> Result<Vec<RunResult>, BenchError> {
        self.benchmark_with(images, configs, |_| {})
    }

    /// Like `benchmark`, calling `on_result` as each configuration finishes
    ///
    /// The callback sees results before speedup and efficiency are derived.
    pub fn benchmark_with<F>(
        &self,
        images: &[ImageRecord],
        configs: &[RunConfig],
        mut on_result: F,
    ) -> Result<Vec<RunResult>, BenchError>
    where
        F: FnMut(&RunResult),
    {
        for config in configs {
            crate::config::validator::validate_run(config)?;
        }

        let mut results = Vec::with_capacity(configs.len());
        for config in configs {
            let result = self.measure(images, config)?;
            on_result(&result);
            results.push(result);
        }

        let baseline = derive_speedups(&mut results, self.baseline);
        if baseline.is_none() && !results.is_empty() {
            log::warn!("No single-worker baseline; speedup and efficiency are not computed");
        }

        Ok(results)
    }
}
