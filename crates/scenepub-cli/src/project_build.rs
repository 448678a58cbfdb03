//! # Project Build Step
//!
//! Scene projects usually compile their sources before publishing. The
//! command comes from `SCENEPUB_BUILD_COMMAND`, or is `npm run build` when
//! `package.json` declares a `build` script. Without either, nothing runs.

use std::path::Path;

use anyhow::{bail, Context, Result};

/// The build command for the project at `root`, if any.
pub fn build_command(root: &Path) -> Option<String> {
    detect(root, std::env::var("SCENEPUB_BUILD_COMMAND").ok())
}

fn detect(root: &Path, configured: Option<String>) -> Option<String> {
    if let Some(cmd) = configured.filter(|c| !c.trim().is_empty()) {
        return Some(cmd);
    }
    let manifest = std::fs::read(root.join("package.json")).ok()?;
    let json: serde_json::Value = serde_json::from_slice(&manifest).ok()?;
    json.get("scripts")?.get("build")?;
    Some("npm run build".to_string())
}

/// Run `command` through the shell in `root`.
pub async fn run_build(root: &Path, command: &str) -> Result<()> {
    tracing::info!(%command, root = %root.display(), "running project build");
    let status = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(root)
        .status()
        .await
        .with_context(|| format!("failed to start build command `{command}`"))?;
    if !status.success() {
        bail!("build command `{command}` failed with {status}");
    }
    Ok(())
}
