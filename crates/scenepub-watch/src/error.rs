//! Errors raised while scanning or starting to watch a project.

use std::path::PathBuf;

use scenepub_core::ProjectError;
use thiserror::Error;

/// Errors from the scanner and the watcher.
#[derive(Error, Debug)]
pub enum WatchError {
    /// The project root does not exist or is not a directory.
    #[error("project root {0} is not a directory")]
    NotADirectory(PathBuf),

    /// Walking or reading the project failed.
    #[error("failed to scan {path}: {source}")]
    Scan {
        /// Path being visited when the error occurred.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A project path could not be turned into a file record.
    #[error(transparent)]
    Project(#[from] ProjectError),

    /// The OS notification backend could not be initialized.
    #[error("filesystem watcher failed: {0}")]
    Notify(#[from] notify::Error),

    /// The blocking scan task panicked or was cancelled.
    #[error("scan task failed: {0}")]
    Task(String),
}

impl From<walkdir::Error> for WatchError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from).unwrap_or_default();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop"));
        WatchError::Scan { path, source }
    }
}
