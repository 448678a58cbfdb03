//! # File Records
//!
//! A [`FileRecord`] is one project file as it will be published: a relative
//! POSIX-style path, its bytes, and its size. Records are immutable once
//! constructed; the only constructor normalizes and validates the path.

use std::path::Path;

use crate::error::ProjectError;
use crate::identifier::{identifier_of, ContentIdentifier};

/// One project file, keyed by its path relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    path: String,
    content: Vec<u8>,
}

impl FileRecord {
    /// Create a record, normalizing `path` to a relative POSIX path.
    pub fn new(path: impl AsRef<str>, content: Vec<u8>) -> Result<Self, ProjectError> {
        Ok(Self {
            path: normalize_path(path.as_ref())?,
            content,
        })
    }

    /// Read `relative` under `root` from disk.
    pub fn read(root: &Path, relative: &str) -> Result<Self, ProjectError> {
        let path = normalize_path(relative)?;
        let full = root.join(&path);
        let content = std::fs::read(&full).map_err(|source| ProjectError::Io {
            path: full.clone(),
            source,
        })?;
        Ok(Self { path, content })
    }

    /// Relative POSIX path of the file.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// File bytes.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Size of the file in bytes.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Content identifier of the file bytes.
    pub fn identifier(&self) -> ContentIdentifier {
        identifier_of(&self.content)
    }
}

/// Normalize a project-relative path to POSIX form.
///
/// Backslashes become `/`, `.` segments and empty segments are dropped.
/// Absolute paths, drive prefixes and `..` segments are rejected so that no
/// record can point outside the project root.
pub fn normalize_path(raw: &str) -> Result<String, ProjectError> {
    let invalid = |reason: &str| ProjectError::InvalidPath {
        path: raw.to_string(),
        reason: reason.to_string(),
    };

    let unified = raw.replace('\\', "/");
    if unified.starts_with('/') {
        return Err(invalid("path must be relative to the project root"));
    }
    if unified.len() >= 2 && unified.as_bytes()[1] == b':' {
        return Err(invalid("drive-qualified paths are not allowed"));
    }
    if unified.contains('\0') {
        return Err(invalid("path contains a NUL byte"));
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(invalid("path escapes the project root")),
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        return Err(invalid("path is empty"));
    }
    Ok(segments.join("/"))
}
