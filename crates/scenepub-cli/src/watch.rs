//! # Watch Subcommand
//!
//! Starts a watcher on the project and prints one block per stabilized batch
//! until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use scenepub_core::root_identifier;
use scenepub_watch::{ChangeKind, IgnoreRules, ProjectWatcher, WatchConfig, WatchUpdate};
use tokio::sync::broadcast::error::RecvError;

/// Arguments for the `watch` subcommand.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Project directory.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Quiet period in milliseconds before a batch is processed.
    #[arg(long)]
    pub debounce_ms: Option<u64>,
}

/// Execute the watch subcommand.
pub async fn run_watch(args: &WatchArgs) -> Result<u8> {
    let rules = IgnoreRules::from_project(&args.dir)?;
    let mut config = WatchConfig::from_env();
    if let Some(ms) = args.debounce_ms {
        config.debounce = Duration::from_millis(ms);
    }

    let watcher = ProjectWatcher::start(&args.dir, Arc::new(rules), config).await?;
    println!(
        "watching {} ({} files, root {})",
        watcher.root().display(),
        watcher.snapshot().len(),
        watcher.root_identifier()
    );

    let mut updates = watcher.subscribe();
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => {
                    for line in format_update(&update) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "output fell behind the watcher");
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    watcher.stop().await;
    Ok(0)
}

/// Render an update as output lines.
pub fn format_update(update: &WatchUpdate) -> Vec<String> {
    let mut lines: Vec<String> = update
        .changes
        .iter()
        .map(|change| {
            let id = change
                .identifier
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default();
            let mark = match change.kind {
                ChangeKind::Added => '+',
                ChangeKind::Modified => '~',
                ChangeKind::Removed => '-',
            };
            format!("{mark} {} {id}", change.path).trim_end().to_string()
        })
        .collect();
    let root = root_identifier(update.snapshot.iter().map(|(p, id)| (p.as_str(), id)));
    lines.push(format!("root {root} (generation {})", update.generation));
    lines
}
