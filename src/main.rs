use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsString;

mod args;
mod env;
mod error;
mod http;
mod sync;
mod timefmt;
mod ui;
mod utils;

use crate::args::CLIArgs;

const DEFAULT_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-dev");
const CLI_VERSION: &str = match option_env!("LAKESYNC_VERSION_STRING") {
    Some(version) => version,
    None => DEFAULT_VERSION,
};

#[derive(Debug, Parser)]
#[command(
    name = "lakesync",
    about = "Trigger and monitor metadata refresh of a Fabric lakehouse SQL endpoint",
    version = CLI_VERSION
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Trigger a metadata refresh and wait for per-table results
    Run(CLIArgs<sync::RunArgs>),
    /// Resolve the SQL endpoint bound to a lakehouse
    Endpoint(CLIArgs<sync::EndpointArgs>),
    /// Check a previously submitted refresh batch once
    Status(CLIArgs<sync::StatusArgs>),
}

#[tokio::main]
async fn main() -> Result<()> {
    let argv: Vec<OsString> = std::env::args_os().collect();
    env::bootstrap_from_args(&argv)?;
    let cli = Cli::parse_from(argv);

    match cli.command {
        Commands::Run(cmd) => sync::run(cmd.base, cmd.args).await?,
        Commands::Endpoint(cmd) => sync::run_endpoint(cmd.base, cmd.args).await?,
        Commands::Status(cmd) => sync::run_status(cmd.base, cmd.args).await?,
    }

    Ok(())
}
