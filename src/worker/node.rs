//! Simulated distributed execution
//!
//! The input is split into `SIMULATED_NODES` contiguous partitions. Each
//! "node" is an ordinary worker pool over its partition, started on its own
//! thread so the nodes run concurrently on the same machine and filesystem.
//! There is no message passing, no network and no failure handling between
//! nodes; the simulation only changes how the work is scheduled.

use super::{partition, RunOutcome, WorkDistributor};
use crate::config::SIMULATED_NODES;
use crate::dataset::ImageRecord;
use crate::error::BenchError;
use serde::Serialize;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// What one simulated node did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeReport {
    /// 1-based node id
    pub node_id: usize,
    /// Records assigned to the node
    pub assigned: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Wall-clock time of the node's own pool
    #[serde(with = "crate::util::time::serde_secs")]
    pub elapsed: Duration,
}

/// Sum of node times over the total time
///
/// Close to the node count when the nodes overlapped fully, close to 1 when
/// they effectively ran one after the other. None for a zero total.
pub fn node_overlap(nodes: &[NodeReport], total: Duration) -> Option<f64> {
    if total.is_zero() {
        return None;
    }
    let sum: f64 = nodes.iter().map(|n| n.elapsed.as_secs_f64()).sum();
    Some(sum / total.as_secs_f64())
}

impl WorkDistributor {
    /// Run one pool of `workers_per_node` threads per node, concurrently
    pub(super) fn run_nodes(
        &self,
        images: &[ImageRecord],
        workers_per_node: usize,
        mode_dir: &Path,
    ) -> Result<RunOutcome, BenchError> {
        let partitions = partition(images.len(), SIMULATED_NODES);

        let results = thread::scope(|s| {
            let handles: Vec<_> = partitions
                .into_iter()
                .enumerate()
                .map(|(i, range)| {
                    let node_id = i + 1;
                    log::debug!(
                        "Node {}: records {}..{} on {} worker(s)",
                        node_id, range.start, range.end, workers_per_node
                    );

                    let slice = &images[range.clone()];
                    let first_worker_id = i * workers_per_node;
                    let handle = s.spawn(move || {
                        let start = Instant::now();
                        let outcome =
                            self.run_pool(slice, workers_per_node, mode_dir, first_worker_id, range.start);
                        (outcome, start.elapsed())
                    });
                    (node_id, handle)
                })
                .collect();

            // A node thread only panics if its own join logic does
            handles
                .into_iter()
                .map(|(node_id, handle)| {
                    let joined = handle.join().map_err(|_| BenchError::WorkerPanicked {
                        worker_id: (node_id - 1) * workers_per_node,
                    });
                    (node_id, joined)
                })
                .collect::<Vec<_>>()
        });

        let mut combined = RunOutcome::default();
        for (node_id, joined) in results {
            let (outcome, elapsed) = joined?;
            let outcome = outcome?;

            let report = NodeReport {
                node_id,
                assigned: outcome.total(),
                succeeded: outcome.succeeded(),
                failed: outcome.failed(),
                elapsed,
            };
            log::info!(
                "Node {} processed {} image(s) in {:.2}s",
                report.node_id,
                report.succeeded,
                report.elapsed.as_secs_f64()
            );

            combined.outcomes.extend(outcome.outcomes);
            combined.stats.extend(outcome.stats);
            combined.nodes.push(report);
        }

        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputLayout, RunConfig, Strategy};
    use crate::transform::mock::MockTransform;
    use crate::worker::tests::records;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn run(n: usize, workers_per_node: usize, strategy: Strategy) -> (RunOutcome, MockTransform, TempDir) {
        let dir = TempDir::new().unwrap();
        let mock = MockTransform::new();
        let distributor = WorkDistributor::new(Arc::new(mock.clone()), OutputLayout::new(dir.path()))
            .with_strategy(strategy);
        let outcome = distributor
            .run(&records(n), &RunConfig::distributed(workers_per_node))
            .unwrap();
        (outcome, mock, dir)
    }

    #[test]
    fn test_two_nodes_cover_input_once() {
        for strategy in [Strategy::Static, Strategy::Queue] {
            let (outcome, mock, dir) = run(95, 2, strategy);

            assert_eq!(outcome.nodes.len(), SIMULATED_NODES);
            let assigned: usize = outcome.nodes.iter().map(|n| n.assigned).sum();
            assert_eq!(assigned, 95);
            assert_eq!(outcome.nodes[0].assigned, 48);
            assert_eq!(outcome.nodes[1].assigned, 47);

            let inputs: HashSet<_> = mock.calls().into_iter().map(|c| c.input).collect();
            assert_eq!(inputs.len(), 95);
            assert_eq!(mock.call_count(), 95);

            let indices: Vec<_> = outcome.outcomes.iter().map(|o| o.index).collect();
            assert_eq!(indices, (0..95).collect::<Vec<_>>());
            assert_eq!(outcome.stats.num_workers(), 4);
            assert!(dir.path().join("output_distributed/class0").is_dir());
        }
    }

    #[test]
    fn test_node_failure_counts() {
        let dir = TempDir::new().unwrap();
        let mock = MockTransform::new();
        let images = records(10);
        mock.fail_on(images[9].source.clone());

        let distributor = WorkDistributor::new(Arc::new(mock.clone()), OutputLayout::new(dir.path()));
        let outcome = distributor.run(&images, &RunConfig::distributed(1)).unwrap();

        assert_eq!(outcome.nodes[0].succeeded, 5);
        assert_eq!(outcome.nodes[1].succeeded, 4);
        assert_eq!(outcome.nodes[1].failed, 1);
        assert_eq!(outcome.succeeded(), 9);
    }

    #[test]
    fn test_single_image_leaves_one_node_idle() {
        let (outcome, _, _dir) = run(1, 1, Strategy::Static);
        assert_eq!(outcome.nodes[0].assigned, 1);
        assert_eq!(outcome.nodes[1].assigned, 0);
        assert_eq!(outcome.succeeded(), 1);
    }

    #[test]
    fn test_node_overlap() {
        let nodes = vec![
            NodeReport { node_id: 1, assigned: 1, succeeded: 1, failed: 0, elapsed: Duration::from_secs(2) },
            NodeReport { node_id: 2, assigned: 1, succeeded: 1, failed: 0, elapsed: Duration::from_secs(2) },
        ];
        let overlap = node_overlap(&nodes, Duration::from_secs(2)).unwrap();
        assert!((overlap - 2.0).abs() < 1e-9);
        assert_eq!(node_overlap(&nodes, Duration::ZERO), None);
    }
}
