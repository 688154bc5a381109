//! Configuration validation
//!
//! Everything here runs before a worker is spawned or a file is written.

use super::*;
use crate::error::BenchError;

/// Validate the configuration used by a binary running in `mode`
///
/// Worker counts are only checked where `mode` uses them: `worker_counts` for
/// the pooled benchmark, `workers_per_node` for the node simulation.
pub fn validate_config(config: &BenchConfig, mode: Mode) -> Result<(), BenchError> {
    validate_transform(&config.transform)?;

    match mode {
        Mode::Sequential => {}
        Mode::Pooled => validate_worker_counts(&config.worker_counts)?,
        Mode::Distributed => validate_workers(config.workers_per_node)?,
    }

    Ok(())
}

/// Validate the pool sizes of the parallel benchmark
pub fn validate_worker_counts(worker_counts: &[usize]) -> Result<(), BenchError> {
    if worker_counts.is_empty() {
        return Err(BenchError::Config("worker_counts must not be empty".to_string()));
    }
    for &workers in worker_counts {
        validate_workers(workers)?;
    }
    Ok(())
}

/// Validate a single run configuration
pub fn validate_run(run: &RunConfig) -> Result<(), BenchError> {
    validate_workers(run.workers)?;

    if run.mode == Mode::Sequential && run.workers != 1 {
        return Err(BenchError::Config(format!(
            "sequential mode uses exactly 1 worker, got {}",
            run.workers
        )));
    }

    Ok(())
}

fn validate_workers(workers: usize) -> Result<(), BenchError> {
    if workers == 0 {
        return Err(BenchError::Config("worker count must be at least 1".to_string()));
    }
    Ok(())
}

/// Validate transform parameters
pub fn validate_transform(transform: &TransformConfig) -> Result<(), BenchError> {
    if transform.width == 0 || transform.height == 0 {
        return Err(BenchError::Config(format!(
            "target size must be non-zero, got {}x{}",
            transform.width, transform.height
        )));
    }

    if transform.quality == 0 || transform.quality > 100 {
        return Err(BenchError::Config(format!(
            "quality must be between 1 and 100, got {}",
            transform.quality
        )));
    }

    if let Some(ref text) = transform.watermark {
        if text.trim().is_empty() {
            return Err(BenchError::Config("watermark text must not be empty".to_string()));
        }
    }

    Ok(())
}
