//! Entry points shared by the three binaries
//!
//! Each binary parses its own CLI, then hands a `BenchConfig`, its `Mode` and
//! the list of runs to `execute`.

use crate::bench::{Benchmark, RunResult};
use crate::config::cli::{DistributedCli, ParallelCli, SequentialCli};
use crate::config::{validator, BenchConfig, Mode, OutputLayout, RunConfig};
use crate::dataset::scan_dataset;
use crate::output::{json, text};
use crate::transform::WatermarkTransform;
use crate::util::verification::verify_outputs;
use crate::worker::WorkDistributor;
use anyhow::{bail, Context, Result};
use std::sync::Arc;

/// `seq-process`: one run on the calling thread
pub fn run_sequential(cli: SequentialCli) -> Result<()> {
    let config = cli.into_config()?;
    execute(&config, Mode::Sequential, "Sequential Image Processing", &[RunConfig::sequential()])?;
    Ok(())
}

/// `parallel-process`: one pooled run per configured worker count
pub fn run_parallel(cli: ParallelCli) -> Result<()> {
    let config = cli.into_config()?;
    let runs: Vec<_> = config.worker_counts.iter().map(|&w| RunConfig::pooled(w)).collect();
    execute(&config, Mode::Pooled, "Parallel Image Processing", &runs)?;
    Ok(())
}

/// `distributed-sim`: one run across the simulated nodes
pub fn run_distributed(cli: DistributedCli) -> Result<()> {
    let config = cli.into_config()?;
    let runs = [RunConfig::distributed(config.workers_per_node)];
    execute(&config, Mode::Distributed, "Distributed Image Processing (simulated)", &runs)?;
    Ok(())
}

/// Validate, scan, run every configuration and report
pub fn execute(config: &BenchConfig, mode: Mode, title: &str, runs: &[RunConfig]) -> Result<Vec<RunResult>> {
    validator::validate_config(config, mode).context("Configuration validation failed")?;
    for run in runs {
        validator::validate_run(run).context("Configuration validation failed")?;
    }

    let images = scan_dataset(&config.input_dir).context("Cannot read dataset")?;
    text::print_header(title, config, &images);

    let layout = OutputLayout::new(&config.output_root);
    let transform = WatermarkTransform::from_config(&config.transform, mode);
    log::info!(
        "Writing {}x{} images stamped \"{}\" to {}",
        config.transform.width,
        config.transform.height,
        transform.text(),
        layout.mode_dir(mode).display()
    );

    let distributor = WorkDistributor::new(Arc::new(transform), layout.clone()).with_strategy(config.strategy);
    let results = Benchmark::new(&distributor).benchmark_with(&images, runs, |result| {
        println!("Finished {}", result.run_config());
        text::print_run(result);
    })?;

    text::print_results(&results);

    if let Some(ref path) = config.json_output {
        let report = json::build_report(config, mode, &images, &results);
        json::write_json_report(path, &report)?;
        log::info!("JSON report written to {}", path.display());
    }

    if config.verify {
        let expected = (config.transform.width, config.transform.height);
        let failed: Vec<_> = results.iter().flat_map(|r| r.failures.iter().cloned()).collect();
        let report = verify_outputs(&images, &layout, mode, expected, &failed);
        text::print_verification(&report);
        if !report.passed() {
            bail!(
                "{} of {} output(s) failed verification",
                report.failures.len(),
                report.checked
            );
        }
    }

    Ok(results)
}
