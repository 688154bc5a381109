//! Error types
//!
//! Fatal errors (`BenchError`) abort a run before any image is touched.
//! Per-image failures (`ItemError`) are recorded in the run outcome and never
//! propagate past the worker that hit them.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised before processing starts
#[derive(Debug, Error)]
pub enum BenchError {
    /// Input directory missing, unreadable or without images
    #[error("setup error: {0}")]
    Setup(String),

    /// Invalid run configuration (worker count, target size, ...)
    #[error("config error: {0}")]
    Config(String),

    /// A worker thread panicked; its chunk has no outcomes
    #[error("worker {worker_id} panicked")]
    WorkerPanicked { worker_id: usize },
}

/// Stage of the transform at which an item failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStage {
    Load,
    Transform,
    Write,
}

impl fmt::Display for ItemStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Transform => write!(f, "transform"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// A single image that could not be processed
#[derive(Debug, Clone, Error, Serialize)]
#[error("failed to {stage} {}: {message}", path.display())]
pub struct ItemError {
    pub path: PathBuf,
    pub stage: ItemStage,
    pub message: String,
}

impl ItemError {
    pub fn new(path: impl Into<PathBuf>, stage: ItemStage, message: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            stage,
            message: message.to_string(),
        }
    }
}
