//! # Error Hierarchy
//!
//! Structured error types for project input, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! [`ErrorKind`] is the stable tag shared by every failure surfaced to the
//! author. The CLI maps it to an exit code; the message stays human-readable.

use std::path::PathBuf;

use thiserror::Error;

/// Stable classification of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid pointers, manifest or project input. Not retried.
    Project,
    /// Handshake bind, timeout or rejection. The user must re-run.
    Linker,
    /// Remote unreachable or malformed response. Safe to retry the attempt.
    ContentServer,
    /// Failed or partial transfer, or a file over the size limit.
    Upload,
}

impl ErrorKind {
    /// The stable tag printed alongside the error message.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "ProjectError",
            Self::Linker => "LinkerError",
            Self::ContentServer => "ContentServerError",
            Self::Upload => "UploadError",
        }
    }

    /// Whether repeating the whole attempt may succeed without user action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ContentServer)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invalid project input: pointers, paths, metadata or scene descriptor.
#[derive(Error, Debug)]
pub enum ProjectError {
    /// The entity has no pointer to be published under.
    #[error("entity requires at least one pointer")]
    NoPointers,

    /// A pointer does not match the format required by the entity type.
    #[error("invalid pointer \"{pointer}\" for {entity_type} entity: {reason}")]
    InvalidPointer {
        /// The pointer as supplied.
        pointer: String,
        /// The entity type the pointer was validated against.
        entity_type: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The same pointer was supplied twice.
    #[error("duplicate pointer \"{0}\"")]
    DuplicatePointer(String),

    /// A file path is absolute, empty or escapes the project root.
    #[error("invalid file path \"{path}\": {reason}")]
    InvalidPath {
        /// The path as supplied.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Two file records normalize to the same path.
    #[error("duplicate file path \"{0}\"")]
    DuplicatePath(String),

    /// Entity metadata must be a JSON object.
    #[error("entity metadata must be a JSON object, got {0}")]
    MetadataNotObject(&'static str),

    /// The scene descriptor is missing required fields or is inconsistent.
    #[error("invalid scene descriptor: {0}")]
    InvalidScene(String),

    /// Reading a project file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Canonical serialization of the entity failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

impl ProjectError {
    /// The stable kind tag for this error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Project
    }
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// A string could not be parsed as a [`ContentIdentifier`](crate::ContentIdentifier).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid content identifier \"{value}\": {reason}")]
pub struct IdentifierError {
    /// The rejected input.
    pub value: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_are_stable() {
        assert_eq!(ErrorKind::Project.as_str(), "ProjectError");
        assert_eq!(ErrorKind::Linker.as_str(), "LinkerError");
        assert_eq!(ErrorKind::ContentServer.as_str(), "ContentServerError");
        assert_eq!(ErrorKind::Upload.as_str(), "UploadError");
    }

    #[test]
    fn only_content_server_errors_are_retryable() {
        assert!(ErrorKind::ContentServer.is_retryable());
        assert!(!ErrorKind::Project.is_retryable());
        assert!(!ErrorKind::Linker.is_retryable());
        assert!(!ErrorKind::Upload.is_retryable());
    }

    #[test]
    fn invalid_pointer_display_names_input() {
        let err = ProjectError::InvalidPointer {
            pointer: "a,b".to_string(),
            entity_type: "scene".to_string(),
            reason: "coordinates must be integers".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("a,b"));
        assert!(msg.contains("scene"));
        assert_eq!(err.kind(), ErrorKind::Project);
    }

    #[test]
    fn identifier_error_display() {
        let err = IdentifierError {
            value: "Qm123".to_string(),
            reason: "missing multibase prefix",
        };
        assert!(err.to_string().contains("Qm123"));
    }
}
