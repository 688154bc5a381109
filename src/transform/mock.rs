//! Mock image transform for testing
//!
//! The mock writes a small marker file instead of decoding images, which keeps
//! distributor and benchmark tests fast and deterministic.
//!
//! # Features
//!
//! - Configurable failure for specific input paths
//! - Tracks every call with the thread that made it
//! - Optional per-call delay to make scheduling observable
//!
//! # Example
//!
//! ```
//! use imgbench::transform::ImageTransform;
//! use imgbench::transform::mock::MockTransform;
//! use std::path::Path;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let output = dir.path().join("a.png");
//!
//! let mock = MockTransform::new();
//! mock.fail_on("bad.png");
//! assert!(mock.transform(Path::new("bad.png"), &output).is_err());
//! assert!(mock.transform(Path::new("good.png"), &output).is_ok());
//! assert_eq!(mock.call_count(), 2);
//! ```

use super::ImageTransform;
use crate::error::{ItemError, ItemStage};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;
use std::time::Duration;

/// Record of a transform call for test verification
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub input: PathBuf,
    pub output: PathBuf,
    pub thread: ThreadId,
}

/// Mock transform
///
/// Clones share failure configuration and call history, so a test can keep a
/// handle while the distributor owns another.
#[derive(Clone, Default)]
pub struct MockTransform {
    /// Inputs that fail with a load error
    failing: Arc<Mutex<HashSet<PathBuf>>>,

    /// Every call, in completion order
    calls: Arc<Mutex<Vec<CallRecord>>>,

    /// Sleep before each call
    delay: Option<Duration>,
}

impl MockTransform {
    /// Create a mock that succeeds on every input
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that sleeps `delay` before each call
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    /// Make calls with this input path fail
    pub fn fail_on(&self, input: impl Into<PathBuf>) {
        self.failing.lock().unwrap().insert(input.into());
    }

    /// Get a copy of all calls for verification
    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of distinct threads that made calls
    pub fn distinct_threads(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.thread)
            .collect::<HashSet<_>>()
            .len()
    }
}

impl ImageTransform for MockTransform {
    fn transform(&self, input: &Path, output: &Path) -> Result<(), ItemError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        self.calls.lock().unwrap().push(CallRecord {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            thread: std::thread::current().id(),
        });

        if self.failing.lock().unwrap().contains(input) {
            return Err(ItemError::new(input, ItemStage::Load, "mock failure"));
        }

        std::fs::write(output, input.to_string_lossy().as_bytes())
            .map_err(|e| ItemError::new(output, ItemStage::Write, e))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
