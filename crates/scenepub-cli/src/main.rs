//! # scenepub CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use scenepub_cli::deploy::{run_deploy, DeployArgs};
use scenepub_cli::error_kind;
use scenepub_cli::hash::{run_hash, HashArgs};
use scenepub_cli::watch::{run_watch, WatchArgs};

/// Publish scene projects to content servers.
///
/// Hashes project files into content identifiers, signs the resulting entity
/// with a local key or through the browser wallet, and uploads only what the
/// server does not already store.
#[derive(Parser, Debug)]
#[command(name = "scenepub", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build, sign and upload the project.
    Deploy(DeployArgs),

    /// Watch the project and print identifier changes.
    Watch(WatchArgs),

    /// Print the identifier of every published file.
    Hash(HashArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG overrides the -v count.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Deploy(args) => run_deploy(args).await,
        Commands::Watch(args) => run_watch(args).await,
        Commands::Hash(args) => run_hash(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error[{}]: {e:#}", error_kind(&e));
            ExitCode::from(1)
        }
    }
}
