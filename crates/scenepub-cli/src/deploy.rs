//! # Deploy Subcommand
//!
//! `scenepub deploy [--target URL] [--skip-build] [--yes] [--dir PATH]`
//!
//! Runs the project build, then one deployment attempt. Ctrl-C aborts the
//! attempt; dropping it closes any open signing session.

use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use scenepub_core::Entity;
use scenepub_deploy::{
    ConfigError, Coordinator, DeployConfig, DeployError, DeployObserver, DeployReport, UploadPlan,
};

use crate::project_build::{build_command, run_build};

/// Arguments for the `deploy` subcommand.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Content server to deploy to. Without it a healthy server is discovered.
    #[arg(long)]
    pub target: Option<String>,

    /// Do not run the project build before deploying.
    #[arg(long)]
    pub skip_build: bool,

    /// Upload without asking for confirmation.
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Project directory.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the deploy subcommand.
pub async fn run_deploy(args: &DeployArgs) -> Result<u8> {
    let root = args
        .dir
        .canonicalize()
        .with_context(|| format!("project directory {} not found", args.dir.display()))?;

    if !args.skip_build {
        if let Some(command) = build_command(&root) {
            run_build(&root, &command).await?;
        }
    }

    let config = load_config(args)?;
    tracing::debug!(?config, "deploy configuration");
    let coordinator =
        Coordinator::new(config)?.with_observer(Arc::new(ConsoleObserver { assume_yes: args.yes }));

    let report = tokio::select! {
        result = coordinator.deploy(&root) => result?,
        _ = tokio::signal::ctrl_c() => return Err(anyhow!("deployment interrupted")),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(0)
}

fn load_config(args: &DeployArgs) -> Result<DeployConfig, DeployError> {
    let mut config = DeployConfig::from_env()?;
    if let Some(target) = &args.target {
        config.content = config
            .content
            .with_target(target)
            .map_err(ConfigError::from)?;
    }
    // Ctrl-C is raced here; the session is cancelled by dropping it.
    config.linker.cancel_on_ctrl_c = false;
    Ok(config)
}

fn print_report(report: &DeployReport) {
    println!("Deployed {} to {}", report.entity_id, report.target);
    println!(
        "  uploaded {} file(s), {} bytes; {} already on the server",
        report.uploaded.len(),
        report.bytes,
        report.skipped.len()
    );
    println!("  {}", report.viewer_url);
}

/// Reports progress on stderr and asks before uploading.
struct ConsoleObserver {
    assume_yes: bool,
}

impl DeployObserver for ConsoleObserver {
    fn entity_built(&self, entity: &Entity) {
        let pointers: Vec<&str> = entity.pointers().iter().map(|p| p.as_str()).collect();
        eprintln!(
            "Entity {} ({} files) for {}",
            entity.id(),
            entity.content().len(),
            pointers.join(" ")
        );
    }

    fn signing_requested(&self, url: &str) {
        eprintln!("Open {url} and sign the deployment with your wallet.");
    }

    fn confirm_upload(&self, plan: &UploadPlan) -> bool {
        eprintln!(
            "{} new file(s), {} bytes to {} ({} already present)",
            plan.missing.len(),
            plan.bytes,
            plan.target,
            plan.present.len()
        );
        if self.assume_yes {
            return true;
        }
        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            eprintln!("Not a terminal; pass --yes to upload without confirmation.");
            return false;
        }
        eprint!("Upload? [y/N] ");
        std::io::stderr().flush().ok();
        let mut answer = String::new();
        let read = tokio::task::block_in_place(|| stdin.lock().read_line(&mut answer));
        if read.is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes")
    }
}
