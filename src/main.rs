// src/main.rs
use anyhow::Result;
use clap::Parser;
use env_logger::Env;

use mvdr_frontend::cli::{self, Args};

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    cli::run(&args)
}
