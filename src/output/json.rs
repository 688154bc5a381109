//! JSON output formatting
//!
//! One report per invocation: host information, the effective configuration
//! and every `RunResult`, written pretty-printed.

use crate::bench::RunResult;
use crate::config::{BenchConfig, Mode, Strategy};
use crate::dataset::{class_labels, ImageRecord};
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Host the benchmark ran on
#[derive(Debug, Clone, Serialize)]
pub struct JsonHostInfo {
    pub hostname: Option<String>,
    pub cpu_cores: usize,
}

impl JsonHostInfo {
    pub fn current() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok());
        Self {
            hostname,
            cpu_cores: num_cpus::get(),
        }
    }
}

/// Effective configuration of the invocation
#[derive(Debug, Clone, Serialize)]
pub struct JsonBenchConfig {
    pub mode: Mode,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub watermark: String,
    pub quality: u8,
    pub strategy: Strategy,
}

/// Dataset summary
#[derive(Debug, Clone, Serialize)]
pub struct JsonDataset {
    pub images: usize,
    pub classes: Vec<String>,
}

/// Complete report
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    pub tool_version: String,
    /// RFC 3339 UTC timestamp
    pub generated_at: String,
    pub host: JsonHostInfo,
    pub config: JsonBenchConfig,
    pub dataset: JsonDataset,
    pub results: Vec<RunResult>,
}

/// Build the report for one invocation
pub fn build_report(config: &BenchConfig, mode: Mode, images: &[ImageRecord], results: &[RunResult]) -> JsonReport {
    let output_dir = crate::config::OutputLayout::new(&config.output_root).mode_dir(mode);

    JsonReport {
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        host: JsonHostInfo::current(),
        config: JsonBenchConfig {
            mode,
            input_dir: config.input_dir.clone(),
            output_dir,
            width: config.transform.width,
            height: config.transform.height,
            watermark: config.transform.watermark_for(mode).to_string(),
            quality: config.transform.quality,
            strategy: config.strategy,
        },
        dataset: JsonDataset {
            images: images.len(),
            classes: class_labels(images),
        },
        results: results.to_vec(),
    }
}

/// Write a report to `path`
pub fn write_json_report(path: &Path, report: &JsonReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON report {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
