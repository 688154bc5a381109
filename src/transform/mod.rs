//! Image transform abstraction
//!
//! An image transform turns one source image into one output image on disk.
//! The work distributor only sees the `ImageTransform` trait, so the resize +
//! watermark implementation and the test mock are interchangeable.
//!
//! # Implementations
//!
//! - **WatermarkTransform**: resize (Lanczos3) and stamp a rotated, semi-transparent text
//! - **MockTransform**: writes marker files and fails on demand, for tests
//!
//! # Example
//!
//! ```no_run
//! use imgbench::transform::{ImageTransform, WatermarkTransform};
//! use std::path::Path;
//!
//! let transform = WatermarkTransform::new(128, 128, "LAB EXAM");
//! transform.transform(Path::new("Dataset/cats/a.jpg"), Path::new("out/a.jpg"))?;
//! # Ok::<(), imgbench::ItemError>(())
//! ```

pub mod font;
pub mod mock;
pub mod watermark;

pub use watermark::WatermarkTransform;

use crate::error::ItemError;
use std::path::Path;

/// Per-item image operation applied by workers
///
/// # Thread Safety
///
/// Transforms are shared by every worker of a run through an `Arc`, so they
/// must be `Send + Sync`. Implementations hold no mutable state; concurrent
/// calls only ever touch distinct output paths.
///
/// # Error Handling
///
/// A failure is returned as an `ItemError` describing the stage that failed.
/// It is never raised further than the calling worker.
pub trait ImageTransform: Send + Sync {
    /// Read `input`, transform it and write the result to `output`
    ///
    /// The parent directory of `output` must already exist. An existing file
    /// at `output` is overwritten.
    fn transform(&self, input: &Path, output: &Path) -> Result<(), ItemError>;

    /// Short name used in logs and reports
    fn name(&self) -> &str;
}
