//! imgbench - image preprocessing benchmark
//!
//! imgbench resizes and watermarks an image dataset and measures how the same
//! work behaves when scheduled sequentially, on a worker pool, or across two
//! simulated nodes.
//!
//! # Architecture
//!
//! - **Dataset**: scans a class-per-directory input tree into `ImageRecord`s
//! - **Transform**: the resize + watermark operation applied to each record
//! - **Worker**: `WorkDistributor` fans records out to N worker threads
//! - **Bench**: runs configurations, measures wall-clock time, derives speedup
//! - **Output**: console tables and an optional JSON report

pub mod app;
pub mod bench;
pub mod config;
pub mod dataset;
pub mod error;
pub mod output;
pub mod stats;
pub mod transform;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::{Mode, RunConfig};
pub use dataset::ImageRecord;
pub use error::{BenchError, ItemError};
pub use transform::ImageTransform;
pub use worker::WorkDistributor;

/// Result type used throughout imgbench
pub type Result<T> = anyhow::Result<T>;
