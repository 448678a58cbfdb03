//! # Project Scan
//!
//! Walks a project directory, pruning ignored subtrees, and yields every
//! remaining regular file. Symlinks are not followed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use scenepub_core::{identifier_of, normalize_path, ContentIdentifier, FileRecord};
use walkdir::WalkDir;

use crate::error::WatchError;
use crate::ignore::IgnorePredicate;

/// Stable, path-ordered map from project path to content identifier.
pub type PathIdentifierMap = BTreeMap<String, ContentIdentifier>;

/// Collect all non-ignored files under `root` as records, sorted by path.
pub fn scan_project(
    root: &Path,
    ignore: &dyn IgnorePredicate,
) -> Result<Vec<FileRecord>, WatchError> {
    let mut records = Vec::new();
    for (relative, full) in walk(root, root, ignore)? {
        let content = std::fs::read(&full).map_err(|source| WatchError::Scan {
            path: full.clone(),
            source,
        })?;
        records.push(FileRecord::new(relative, content)?);
    }
    tracing::debug!(root = %root.display(), files = records.len(), "scanned project");
    Ok(records)
}

/// Hash all non-ignored files under `root`.
pub fn scan_identifiers(
    root: &Path,
    ignore: &dyn IgnorePredicate,
) -> Result<PathIdentifierMap, WatchError> {
    let mut map = PathIdentifierMap::new();
    for (relative, full) in walk(root, root, ignore)? {
        let content = std::fs::read(&full).map_err(|source| WatchError::Scan {
            path: full.clone(),
            source,
        })?;
        map.insert(relative, identifier_of(&content));
    }
    Ok(map)
}

/// The project-relative POSIX path of `path`, if it lies under `root`.
pub(crate) fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let stripped = path.strip_prefix(root).ok()?;
    let raw = stripped.to_str()?;
    normalize_path(raw).ok()
}

/// Walk `start` (which must lie under `root`) and return `(relative, full)`
/// pairs for every non-ignored regular file, in path order.
pub(crate) fn walk(
    root: &Path,
    start: &Path,
    ignore: &dyn IgnorePredicate,
) -> Result<Vec<(String, PathBuf)>, WatchError> {
    if !root.is_dir() {
        return Err(WatchError::NotADirectory(root.to_path_buf()));
    }
    let mut out = Vec::new();
    let walker = WalkDir::new(start)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| match relative_path(root, entry.path()) {
            Some(rel) => !ignore.is_ignored(&rel, entry.file_type().is_dir()),
            // The root itself has no relative path.
            None => true,
        });
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(rel) = relative_path(root, entry.path()) {
            out.push((rel, entry.into_path()));
        }
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}
