//! Work distribution across worker threads
//!
//! This module implements the `WorkDistributor`, which applies an
//! `ImageTransform` to every record of a run on a fixed-size pool of worker
//! threads.
//!
//! # Architecture
//!
//! - **Sequential**: the calling thread processes every record, no pool
//! - **Pooled**: N workers, records assigned by `Strategy`
//!   - `Static`: contiguous chunks, sizes differ by at most one
//!   - `Queue`: workers pull indices from a shared task queue and push
//!     outcomes to a result queue
//! - **Distributed**: two simulated nodes, each a pool over its own
//!   contiguous partition, running concurrently (see `node`)
//!
//! Workers share no mutable state. Each owns its `WorkerStats` and only
//! writes the output paths of its own records. The only synchronization
//! point is the join at the end of `run`, so the call returns once every
//! output file has been written.
//!
//! # Example
//!
//! ```no_run
//! use imgbench::config::{OutputLayout, RunConfig};
//! use imgbench::transform::WatermarkTransform;
//! use imgbench::WorkDistributor;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let images = imgbench::dataset::scan_dataset(Path::new("Dataset"))?;
//! let transform = Arc::new(WatermarkTransform::new(128, 128, "PROCESSED"));
//! let distributor = WorkDistributor::new(transform, OutputLayout::new("."));
//!
//! let outcome = distributor.run(&images, &RunConfig::pooled(4))?;
//! println!("{} of {} images succeeded", outcome.succeeded(), outcome.total());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod node;

pub use node::NodeReport;

use crate::config::validator::validate_run;
use crate::config::{Mode, OutputLayout, RunConfig, Strategy};
use crate::dataset::{self, ImageRecord};
use crate::error::{BenchError, ItemError};
use crate::stats::aggregator::StatisticsAggregator;
use crate::stats::WorkerStats;
use crate::transform::ImageTransform;
use crossbeam::channel;
use std::fs;
use std::io;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Outcome of one record in one run
#[derive(Debug, Clone)]
pub struct ItemOutcome {
    /// Index of the record in the run's input
    pub index: usize,
    /// Worker that processed the record
    pub worker_id: usize,
    /// Transform latency on success
    pub result: Result<Duration, ItemError>,
}

/// Everything a run produced
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// One outcome per input record, in input order
    pub outcomes: Vec<ItemOutcome>,
    /// Per-worker statistics
    pub stats: StatisticsAggregator,
    /// Per-node reports (distributed mode only)
    pub nodes: Vec<NodeReport>,
}

impl RunOutcome {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ItemError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    fn sort(&mut self) {
        self.outcomes.sort_by_key(|o| o.index);
    }
}

/// Split `len` items into `parts` contiguous ranges
///
/// The first `len % parts` ranges hold one extra item. Ranges are empty when
/// `parts > len`. `parts` must be at least 1.
pub fn partition(len: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1);
    let base = len / parts;
    let extra = len % parts;

    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let size = base + usize::from(i < extra);
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

/// Applies an image transform to records on a pool of worker threads
pub struct WorkDistributor {
    transform: Arc<dyn ImageTransform>,
    layout: OutputLayout,
    strategy: Strategy,
}

impl WorkDistributor {
    pub fn new(transform: Arc<dyn ImageTransform>, layout: OutputLayout) -> Self {
        Self {
            transform,
            layout,
            strategy: Strategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Process every record once according to `config`, blocking until done
    ///
    /// Output goes to the mode's directory under the layout root; class
    /// subdirectories are created as needed and existing files overwritten.
    ///
    /// # Errors
    ///
    /// - `BenchError::Config` for an invalid worker count, before any thread starts
    /// - `BenchError::Setup` if an output directory cannot be created
    /// - `BenchError::WorkerPanicked` if a worker thread panicked
    ///
    /// Per-image failures are not errors; they are reported in the outcome.
    pub fn run(&self, images: &[ImageRecord], config: &RunConfig) -> Result<RunOutcome, BenchError> {
        validate_run(config)?;

        if images.is_empty() {
            log::debug!("{}: no images, nothing to do", config);
            return Ok(RunOutcome::default());
        }

        let mode_dir = self.layout.mode_dir(config.mode);
        dataset::prepare_output_dirs(images, &mode_dir)?;

        log::info!(
            "Running {} [{}, {}]: {} image(s) -> {}",
            config,
            self.transform.name(),
            self.strategy,
            images.len(),
            mode_dir.display()
        );

        let mut outcome = match config.mode {
            Mode::Sequential => self.run_inline(images, &mode_dir),
            Mode::Pooled => self.run_pool(images, config.workers, &mode_dir, 0, 0)?,
            Mode::Distributed => self.run_nodes(images, config.workers, &mode_dir)?,
        };
        outcome.sort();

        let failed = outcome.failed();
        if failed > 0 {
            log::warn!("{}: {} of {} image(s) failed", config, failed, outcome.total());
        }

        Ok(outcome)
    }

    /// Process all records on the calling thread as worker 0
    fn run_inline(&self, images: &[ImageRecord], mode_dir: &Path) -> RunOutcome {
        let mut stats = WorkerStats::new();
        let outcomes = images
            .iter()
            .enumerate()
            .map(|(index, record)| self.process_one(0, index, record, mode_dir, &mut stats))
            .collect();

        let mut aggregator = StatisticsAggregator::new();
        aggregator.add_worker(0, stats);

        RunOutcome {
            outcomes,
            stats: aggregator,
            nodes: Vec::new(),
        }
    }

    /// Process `images` on a fresh pool of `workers` threads
    ///
    /// Worker ids start at `first_worker_id`; outcome indices are offset by
    /// `index_offset` so node partitions report positions in the full input.
    fn run_pool(
        &self,
        images: &[ImageRecord],
        workers: usize,
        mode_dir: &Path,
        first_worker_id: usize,
        index_offset: usize,
    ) -> Result<RunOutcome, BenchError> {
        match self.strategy {
            Strategy::Static => self.run_static(images, workers, mode_dir, first_worker_id, index_offset),
            Strategy::Queue => self.run_queue(images, workers, mode_dir, first_worker_id, index_offset),
        }
    }

    fn run_static(
        &self,
        images: &[ImageRecord],
        workers: usize,
        mode_dir: &Path,
        first_worker_id: usize,
        index_offset: usize,
    ) -> Result<RunOutcome, BenchError> {
        let chunks = partition(images.len(), workers);

        thread::scope(|s| {
            let mut handles = Vec::with_capacity(chunks.len());

            for (i, range) in chunks.into_iter().enumerate() {
                let worker_id = first_worker_id + i;
                log::debug!("Worker {}: records {}..{}", worker_id, range.start, range.end);

                let chunk = &images[range.clone()];
                let handle = s.spawn(move || {
                    let mut stats = WorkerStats::new();
                    let outcomes: Vec<ItemOutcome> = chunk
                        .iter()
                        .enumerate()
                        .map(|(offset, record)| {
                            let index = index_offset + range.start + offset;
                            self.process_one(worker_id, index, record, mode_dir, &mut stats)
                        })
                        .collect();
                    (stats, outcomes)
                });
                handles.push((worker_id, handle));
            }

            // Wait for all workers to complete
            let mut outcome = RunOutcome::default();
            let mut panicked = None;
            for (worker_id, handle) in handles {
                match handle.join() {
                    Ok((stats, outcomes)) => {
                        outcome.stats.add_worker(worker_id, stats);
                        outcome.outcomes.extend(outcomes);
                    }
                    Err(_) => {
                        log::error!("Worker {} panicked", worker_id);
                        panicked.get_or_insert(worker_id);
                    }
                }
            }
            match panicked {
                Some(worker_id) => Err(BenchError::WorkerPanicked { worker_id }),
                None => Ok(outcome),
            }
        })
    }

    fn run_queue(
        &self,
        images: &[ImageRecord],
        workers: usize,
        mode_dir: &Path,
        first_worker_id: usize,
        index_offset: usize,
    ) -> Result<RunOutcome, BenchError> {
        let (task_tx, task_rx) = channel::unbounded::<usize>();
        let (result_tx, result_rx) = channel::unbounded::<ItemOutcome>();

        for index in 0..images.len() {
            // task_rx is alive for the whole function, so send cannot fail
            let _ = task_tx.send(index);
        }
        drop(task_tx);

        let stats = thread::scope(|s| {
            let mut handles = Vec::with_capacity(workers);

            for i in 0..workers {
                let worker_id = first_worker_id + i;
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();

                let handle = s.spawn(move || {
                    let mut stats = WorkerStats::new();
                    for local in task_rx.iter() {
                        let index = index_offset + local;
                        let outcome =
                            self.process_one(worker_id, index, &images[local], mode_dir, &mut stats);
                        // result_rx outlives every worker
                        let _ = result_tx.send(outcome);
                    }
                    stats
                });
                handles.push((worker_id, handle));
            }

            let mut aggregator = StatisticsAggregator::new();
            let mut panicked = None;
            for (worker_id, handle) in handles {
                match handle.join() {
                    Ok(stats) => aggregator.add_worker(worker_id, stats),
                    Err(_) => {
                        log::error!("Worker {} panicked", worker_id);
                        panicked.get_or_insert(worker_id);
                    }
                }
            }
            match panicked {
                Some(worker_id) => Err(BenchError::WorkerPanicked { worker_id }),
                None => Ok(aggregator),
            }
        })?;
        drop(result_tx);

        Ok(RunOutcome {
            outcomes: result_rx.iter().collect(),
            stats,
            nodes: Vec::new(),
        })
    }

    /// Transform one record, recording the result in `stats`
    fn process_one(
        &self,
        worker_id: usize,
        index: usize,
        record: &ImageRecord,
        mode_dir: &Path,
        stats: &mut WorkerStats,
    ) -> ItemOutcome {
        let output = record.output_path(mode_dir);
        let start = Instant::now();
        let result = self.transform.transform(&record.source, &output);
        let latency = start.elapsed();

        let result = match result {
            Ok(()) => {
                stats.record_success(latency);
                Ok(latency)
            }
            Err(e) => {
                log::warn!("Worker {}: {}", worker_id, e);
                stats.record_failure(latency);
                // No output from an earlier run may survive a failed record
                match fs::remove_file(&output) {
                    Ok(()) => log::debug!("Removed stale output {}", output.display()),
                    Err(rm) if rm.kind() == io::ErrorKind::NotFound => {}
                    Err(rm) => log::warn!("Cannot remove stale output {}: {}", output.display(), rm),
                }
                Err(e)
            }
        };

        ItemOutcome {
            index,
            worker_id,
            result,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ItemStage;
    use crate::transform::mock::MockTransform;
    use std::collections::{BTreeSet, HashSet};
    use std::path::PathBuf;
    use tempfile::TempDir;

    pub(crate) fn records(n: usize) -> Vec<ImageRecord> {
        (0..n)
            .map(|i| ImageRecord {
                source: PathBuf::from(format!("Dataset/class{}/img{:03}.png", i % 3, i)),
                class_label: format!("class{}", i % 3),
                file_name: format!("img{:03}.png", i),
            })
            .collect()
    }

    fn produced_files(dir: &Path) -> BTreeSet<PathBuf> {
        let mut files = BTreeSet::new();
        for class in std::fs::read_dir(dir).unwrap() {
            let class = class.unwrap().path();
            for file in std::fs::read_dir(&class).unwrap() {
                let file = file.unwrap().path();
                files.insert(file.strip_prefix(dir).unwrap().to_path_buf());
            }
        }
        files
    }

    fn distributor(mock: &MockTransform, root: &Path, strategy: Strategy) -> WorkDistributor {
        WorkDistributor::new(Arc::new(mock.clone()), OutputLayout::new(root)).with_strategy(strategy)
    }

    #[test]
    fn test_partition_balanced() {
        let ranges = partition(94, 8);
        assert_eq!(ranges.len(), 8);
        assert_eq!(ranges.iter().map(|r| r.len()).sum::<usize>(), 94);
        assert_eq!(ranges[0], 0..12);
        assert_eq!(ranges[5], 60..72);
        assert_eq!(ranges[6], 72..83);
        assert_eq!(ranges[7].end, 94);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        let sizes: HashSet<_> = ranges.iter().map(|r| r.len()).collect();
        assert!(sizes.iter().all(|&s| s == 11 || s == 12));
    }

    #[test]
    fn test_partition_more_parts_than_items() {
        let ranges = partition(2, 4);
        assert_eq!(ranges, vec![0..1, 1..2, 2..2, 2..2]);
        assert_eq!(partition(0, 3).iter().map(|r| r.len()).sum::<usize>(), 0);
    }

    #[test]
    fn test_same_outputs_for_every_worker_count() {
        let images = records(23);
        for strategy in [Strategy::Static, Strategy::Queue] {
            let mut expected = None;
            for workers in [1, 2, 4, 8] {
                let dir = TempDir::new().unwrap();
                let mock = MockTransform::new();
                let outcome = distributor(&mock, dir.path(), strategy)
                    .run(&images, &RunConfig::pooled(workers))
                    .unwrap();

                assert_eq!(outcome.succeeded(), 23);
                assert_eq!(mock.call_count(), 23);
                let inputs: HashSet<_> = mock.calls().into_iter().map(|c| c.input).collect();
                assert_eq!(inputs.len(), 23, "a record was processed twice");

                let files = produced_files(&dir.path().join("output_parallel"));
                match &expected {
                    None => expected = Some(files),
                    Some(expected) => assert_eq!(&files, expected, "{} workers, {}", workers, strategy),
                }
            }
        }
    }

    #[test]
    fn test_outcomes_in_input_order() {
        let dir = TempDir::new().unwrap();
        let mock = MockTransform::new();
        let outcome = distributor(&mock, dir.path(), Strategy::Queue)
            .run(&records(17), &RunConfig::pooled(4))
            .unwrap();

        let indices: Vec<_> = outcome.outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indices, (0..17).collect::<Vec<_>>());
    }

    #[test]
    fn test_failure_is_isolated() {
        let images = records(10);
        for strategy in [Strategy::Static, Strategy::Queue] {
            for workers in [1, 2, 4, 8] {
                let dir = TempDir::new().unwrap();
                let mock = MockTransform::new();
                mock.fail_on(images[4].source.clone());

                let outcome = distributor(&mock, dir.path(), strategy)
                    .run(&images, &RunConfig::pooled(workers))
                    .unwrap();

                assert_eq!(outcome.succeeded(), 9);
                assert_eq!(outcome.failed(), 1);
                let errors: Vec<_> = outcome.errors().collect();
                assert_eq!(errors[0].path, images[4].source);
                assert_eq!(errors[0].stage, ItemStage::Load);
                assert_eq!(produced_files(&dir.path().join("output_parallel")).len(), 9);

                let aggregate = outcome.stats.aggregate().unwrap();
                assert_eq!(aggregate.succeeded(), 9);
                assert_eq!(aggregate.failed(), 1);
            }
        }
    }

    #[test]
    fn test_empty_input() {
        let dir = TempDir::new().unwrap();
        let mock = MockTransform::new();
        let outcome = distributor(&mock, dir.path(), Strategy::Static)
            .run(&[], &RunConfig::pooled(4))
            .unwrap();
        assert_eq!(outcome.total(), 0);
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_zero_workers_rejected_before_work() {
        let dir = TempDir::new().unwrap();
        let mock = MockTransform::new();
        let err = distributor(&mock, dir.path(), Strategy::Static)
            .run(&records(3), &RunConfig::pooled(0))
            .unwrap_err();
        assert!(matches!(err, BenchError::Config(_)));
        assert_eq!(mock.call_count(), 0);
        assert!(!dir.path().join("output_parallel").exists());
    }

    #[test]
    fn test_sequential_runs_on_calling_thread() {
        let dir = TempDir::new().unwrap();
        let mock = MockTransform::new();
        let outcome = distributor(&mock, dir.path(), Strategy::Static)
            .run(&records(5), &RunConfig::sequential())
            .unwrap();

        assert_eq!(outcome.succeeded(), 5);
        assert!(mock.calls().iter().all(|c| c.thread == thread::current().id()));
        assert!(dir.path().join("output_seq/class0/img000.png").is_file());
    }

    #[test]
    fn test_static_uses_every_worker() {
        let dir = TempDir::new().unwrap();
        let mock = MockTransform::new();
        let outcome = distributor(&mock, dir.path(), Strategy::Static)
            .run(&records(16), &RunConfig::pooled(4))
            .unwrap();

        assert_eq!(mock.distinct_threads(), 4);
        assert_eq!(outcome.stats.num_workers(), 4);
        for (_, stats) in outcome.stats.per_worker() {
            assert_eq!(stats.succeeded(), 4);
        }
    }

    #[test]
    fn test_rerun_overwrites_outputs() {
        let dir = TempDir::new().unwrap();
        let mock = MockTransform::new();
        let images = records(6);
        let distributor = distributor(&mock, dir.path(), Strategy::Static);

        distributor.run(&images, &RunConfig::pooled(2)).unwrap();
        let path = images[0].output_for(distributor.layout(), Mode::Pooled);
        let first = std::fs::read(&path).unwrap();

        let outcome = distributor.run(&images, &RunConfig::pooled(3)).unwrap();
        assert_eq!(outcome.succeeded(), 6);
        assert_eq!(std::fs::read(&path).unwrap(), first);
    }

    #[test]
    fn test_failed_rerun_removes_stale_output() {
        let dir = TempDir::new().unwrap();
        let mock = MockTransform::new();
        let images = records(4);
        let distributor = distributor(&mock, dir.path(), Strategy::Queue);

        distributor.run(&images, &RunConfig::pooled(2)).unwrap();
        let stale = images[2].output_for(distributor.layout(), Mode::Pooled);
        assert!(stale.is_file());

        mock.fail_on(images[2].source.clone());
        let outcome = distributor.run(&images, &RunConfig::pooled(2)).unwrap();
        assert_eq!(outcome.failed(), 1);
        assert!(!stale.exists());
        assert_eq!(produced_files(&dir.path().join("output_parallel")).len(), 3);
    }

    struct PanickingTransform;

    impl ImageTransform for PanickingTransform {
        fn transform(&self, _input: &Path, _output: &Path) -> Result<(), ItemError> {
            panic!("boom");
        }

        fn name(&self) -> &str {
            "panic"
        }
    }

    #[test]
    fn test_worker_panic_is_reported() {
        let dir = TempDir::new().unwrap();
        let distributor = WorkDistributor::new(Arc::new(PanickingTransform), OutputLayout::new(dir.path()));
        let err = distributor.run(&records(4), &RunConfig::pooled(2)).unwrap_err();
        assert!(matches!(err, BenchError::WorkerPanicked { .. }));
    }
}
