//! Parallel image preprocessing benchmark

use anyhow::Result;
use clap::Parser;
use imgbench::config::cli::ParallelCli;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = ParallelCli::parse();
    imgbench::app::run_parallel(cli)
}
