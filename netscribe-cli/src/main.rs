use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use env_logger::{Env, Target};

use netscribe_cli::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.options().verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .target(Target::Stderr)
        .init();

    netscribe_cli::run(cli).await
}
