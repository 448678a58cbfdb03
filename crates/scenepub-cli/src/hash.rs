//! # Hash Subcommand
//!
//! Prints the identifier of every file that would be published, followed by
//! the root identifier of the whole set.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use scenepub_core::{root_identifier, ContentIdentifier};
use scenepub_watch::{scan_identifiers, IgnoreRules, PathIdentifierMap};
use serde::Serialize;

/// Arguments for the `hash` subcommand.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Project directory.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Identifiers of a project.
#[derive(Debug, Serialize)]
pub struct HashReport {
    /// Identifier of the whole file set.
    pub root: ContentIdentifier,
    /// Identifier per project path.
    pub files: PathIdentifierMap,
}

/// Hash the project at `dir`.
pub fn hash_project(dir: &Path) -> Result<HashReport> {
    let rules = IgnoreRules::from_project(dir)?;
    let files = scan_identifiers(dir, &rules)
        .with_context(|| format!("failed to scan {}", dir.display()))?;
    let root = root_identifier(files.iter().map(|(path, id)| (path.as_str(), id)));
    Ok(HashReport { root, files })
}

/// Execute the hash subcommand.
pub fn run_hash(args: &HashArgs) -> Result<u8> {
    let report = hash_project(&args.dir)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (path, id) in &report.files {
            println!("{id}  {path}");
        }
        println!("{}  (root, {} files)", report.root, report.files.len());
    }
    Ok(0)
}
