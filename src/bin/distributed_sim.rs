//! Simulated distributed image preprocessing benchmark

use anyhow::Result;
use clap::Parser;
use imgbench::config::cli::DistributedCli;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = DistributedCli::parse();
    imgbench::app::run_distributed(cli)
}
