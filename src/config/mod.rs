//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//! A `BenchConfig` describes one invocation of a binary; each measured run
//! gets its own immutable `RunConfig`.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Number of simulated nodes in distributed mode
pub const SIMULATED_NODES: usize = 2;

/// Scheduling mode of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Single worker on the calling thread
    Sequential,
    /// Fixed-size pool of worker threads
    Pooled,
    /// Two simulated nodes, each with its own pool, running concurrently
    Distributed,
}

impl Mode {
    /// Output directory name for this mode, relative to the output root
    pub fn output_dir_name(&self) -> &'static str {
        match self {
            Self::Sequential => "output_seq",
            Self::Pooled => "output_parallel",
            Self::Distributed => "output_distributed",
        }
    }

    /// Watermark stamped when none is configured
    pub fn default_watermark(&self) -> &'static str {
        match self {
            Self::Pooled => "PROCESSED",
            Self::Sequential | Self::Distributed => "LAB EXAM",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Pooled => write!(f, "pooled"),
            Self::Distributed => write!(f, "distributed"),
        }
    }
}

/// Work assignment strategy inside a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Contiguous, roughly equal chunks per worker
    #[default]
    Static,
    /// Workers pull records from a shared queue
    Queue,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Queue => write!(f, "queue"),
        }
    }
}

/// Configuration of a single measured run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub mode: Mode,
    /// Worker threads (per node in distributed mode)
    pub workers: usize,
}

impl RunConfig {
    pub fn sequential() -> Self {
        Self { mode: Mode::Sequential, workers: 1 }
    }

    pub fn pooled(workers: usize) -> Self {
        Self { mode: Mode::Pooled, workers }
    }

    pub fn distributed(workers_per_node: usize) -> Self {
        Self { mode: Mode::Distributed, workers: workers_per_node }
    }

    /// Workers across all nodes; the divisor for efficiency
    pub fn total_workers(&self) -> usize {
        match self.mode {
            Mode::Distributed => self.workers * SIMULATED_NODES,
            Mode::Sequential | Mode::Pooled => self.workers,
        }
    }
}

impl fmt::Display for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            Mode::Distributed => write!(
                f,
                "distributed ({} nodes x {} worker(s))",
                SIMULATED_NODES, self.workers
            ),
            _ => write!(f, "{} ({} worker(s))", self.mode, self.workers),
        }
    }
}

/// Resize + watermark parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
    /// Watermark text; the mode default is used when unset
    #[serde(default)]
    pub watermark: Option<String>,
    /// JPEG encoder quality (1-100)
    #[serde(default = "default_quality")]
    pub quality: u8,
}

fn default_size() -> u32 {
    128
}

fn default_quality() -> u8 {
    95
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            width: default_size(),
            height: default_size(),
            watermark: None,
            quality: default_quality(),
        }
    }
}

impl TransformConfig {
    pub fn watermark_for(&self, mode: Mode) -> &str {
        self.watermark.as_deref().unwrap_or(mode.default_watermark())
    }
}

/// Complete benchmark configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Dataset root: one subdirectory per class label
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Directory under which the per-mode output directories are created
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    #[serde(default)]
    pub transform: TransformConfig,
    /// Pool sizes measured by the parallel benchmark
    #[serde(default = "default_worker_counts")]
    pub worker_counts: Vec<usize>,
    /// Pool size of each simulated node
    #[serde(default = "default_workers_per_node")]
    pub workers_per_node: usize,
    #[serde(default)]
    pub strategy: Strategy,
    /// JSON report path
    #[serde(default)]
    pub json_output: Option<PathBuf>,
    /// Re-open every output after the run and check its dimensions
    #[serde(default)]
    pub verify: bool,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("Dataset")
}

fn default_output_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_worker_counts() -> Vec<usize> {
    vec![1, 2, 4, 8]
}

fn default_workers_per_node() -> usize {
    1
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_root: default_output_root(),
            transform: TransformConfig::default(),
            worker_counts: default_worker_counts(),
            workers_per_node: default_workers_per_node(),
            strategy: Strategy::default(),
            json_output: None,
            verify: false,
        }
    }
}

/// Maps a mode to its output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn mode_dir(&self, mode: Mode) -> PathBuf {
        self.root.join(mode.output_dir_name())
    }
}

impl fmt::Display for BenchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  Input:       {}", self.input_dir.display())?;
        writeln!(f, "  Output root: {}", self.output_root.display())?;
        writeln!(
            f,
            "  Transform:   {}x{}, quality {}",
            self.transform.width, self.transform.height, self.transform.quality
        )?;
        write!(f, "  Strategy:    {}", self.strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_output_dirs_are_distinct() {
        let dirs = [
            Mode::Sequential.output_dir_name(),
            Mode::Pooled.output_dir_name(),
            Mode::Distributed.output_dir_name(),
        ];
        assert_ne!(dirs[0], dirs[1]);
        assert_ne!(dirs[1], dirs[2]);
        assert_ne!(dirs[0], dirs[2]);
    }

    #[test]
    fn test_total_workers() {
        assert_eq!(RunConfig::sequential().total_workers(), 1);
        assert_eq!(RunConfig::pooled(4).total_workers(), 4);
        assert_eq!(RunConfig::distributed(3).total_workers(), 3 * SIMULATED_NODES);
    }

    #[test]
    fn test_watermark_defaults() {
        let mut transform = TransformConfig::default();
        assert_eq!(transform.watermark_for(Mode::Sequential), "LAB EXAM");
        assert_eq!(transform.watermark_for(Mode::Pooled), "PROCESSED");

        transform.watermark = Some("DRAFT".to_string());
        assert_eq!(transform.watermark_for(Mode::Pooled), "DRAFT");
    }

    #[test]
    fn test_layout_mode_dir() {
        let layout = OutputLayout::new("/tmp/out");
        assert_eq!(layout.mode_dir(Mode::Pooled), PathBuf::from("/tmp/out/output_parallel"));
    }
}
