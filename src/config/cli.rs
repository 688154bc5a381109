//! CLI argument parsing using clap
//!
//! Every binary runs with no arguments; flags only override the defaults or a
//! TOML file given with `--config`.

use super::{cli_convert, BenchConfig, Strategy};
use anyhow::{Context, Result};
use clap::{Args, Parser};
use std::path::PathBuf;

/// Options shared by all three binaries
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// TOML configuration file (CLI flags take precedence)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Dataset directory (one subdirectory per class)
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// Directory under which output_seq/, output_parallel/ and output_distributed/ are created
    #[arg(short = 'o', long)]
    pub output_root: Option<PathBuf>,

    /// Watermark text
    #[arg(long)]
    pub watermark: Option<String>,

    /// Target size (e.g., 128x128)
    #[arg(long)]
    pub size: Option<String>,

    /// JPEG quality (1-100)
    #[arg(long)]
    pub quality: Option<u8>,

    /// Work assignment strategy inside each pool
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Write a JSON report to this path
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Check every produced image after the run
    #[arg(long)]
    pub verify: bool,
}

/// Sequential image preprocessing
#[derive(Parser, Debug)]
#[command(name = "seq-process")]
#[command(version, about, long_about = None)]
pub struct SequentialCli {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Parallel image preprocessing over several pool sizes
#[derive(Parser, Debug)]
#[command(name = "parallel-process")]
#[command(version, about, long_about = None)]
pub struct ParallelCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Comma-separated pool sizes to benchmark (e.g., 1,2,4,8)
    #[arg(short = 'w', long)]
    pub workers: Option<String>,
}

/// Simulated two-node distributed image preprocessing
#[derive(Parser, Debug)]
#[command(name = "distributed-sim")]
#[command(version, about, long_about = None)]
pub struct DistributedCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Worker threads inside each simulated node
    #[arg(long)]
    pub workers_per_node: Option<usize>,
}

impl CommonArgs {
    /// Load the base configuration: the TOML file if given, defaults otherwise
    pub fn base_config(&self) -> Result<BenchConfig> {
        match &self.config {
            Some(path) => super::toml::parse_toml_file(path),
            None => Ok(BenchConfig::default()),
        }
    }

    /// Apply explicitly given flags on top of `config`
    pub fn apply(&self, config: &mut BenchConfig) -> Result<()> {
        if let Some(ref input) = self.input {
            config.input_dir = input.clone();
        }
        if let Some(ref root) = self.output_root {
            config.output_root = root.clone();
        }
        if let Some(ref text) = self.watermark {
            config.transform.watermark = Some(text.clone());
        }
        if let Some(ref size) = self.size {
            let (width, height) = cli_convert::parse_dimensions(size)
                .context("Invalid --size")?;
            config.transform.width = width;
            config.transform.height = height;
        }
        if let Some(quality) = self.quality {
            config.transform.quality = quality;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(ref json) = self.json {
            config.json_output = Some(json.clone());
        }
        if self.verify {
            config.verify = true;
        }
        Ok(())
    }
}

impl SequentialCli {
    pub fn into_config(self) -> Result<BenchConfig> {
        let mut config = self.common.base_config()?;
        self.common.apply(&mut config)?;
        Ok(config)
    }
}

impl ParallelCli {
    pub fn into_config(self) -> Result<BenchConfig> {
        let mut config = self.common.base_config()?;
        self.common.apply(&mut config)?;
        if let Some(ref workers) = self.workers {
            config.worker_counts = cli_convert::parse_worker_list(workers)
                .context("Invalid --workers")?;
        }
        Ok(config)
    }
}

impl DistributedCli {
    pub fn into_config(self) -> Result<BenchConfig> {
        let mut config = self.common.base_config()?;
        self.common.apply(&mut config)?;
        if let Some(workers) = self.workers_per_node {
            config.workers_per_node = workers;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_gives_defaults() {
        let cli = SequentialCli::try_parse_from(["seq-process"]).unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.input_dir, PathBuf::from("Dataset"));
        assert_eq!(config.output_root, PathBuf::from("."));
        assert!(!config.verify);
    }

    #[test]
    fn test_parallel_flags_override() {
        let cli = ParallelCli::try_parse_from([
            "parallel-process",
            "--workers",
            "1,3",
            "--size",
            "64x48",
            "--strategy",
            "queue",
        ])
        .unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.worker_counts, vec![1, 3]);
        assert_eq!((config.transform.width, config.transform.height), (64, 48));
        assert_eq!(config.strategy, Strategy::Queue);
    }

    #[test]
    fn test_distributed_workers_per_node() {
        let cli = DistributedCli::try_parse_from(["distributed-sim", "--workers-per-node", "2"])
            .unwrap();
        assert_eq!(cli.into_config().unwrap().workers_per_node, 2);
    }

    #[test]
    fn test_bad_size_is_rejected() {
        let cli = SequentialCli::try_parse_from(["seq-process", "--size", "big"]).unwrap();
        assert!(cli.into_config().is_err());
    }
}
