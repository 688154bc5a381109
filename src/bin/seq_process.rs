//! Sequential image preprocessing benchmark

use anyhow::Result;
use clap::Parser;
use imgbench::config::cli::SequentialCli;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = SequentialCli::parse();
    imgbench::app::run_sequential(cli)
}
