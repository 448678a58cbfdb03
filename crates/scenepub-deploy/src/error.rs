//! # Deployment Errors
//!
//! [`DeployError`] aggregates the per-crate errors via `From` so that every
//! pipeline step can use `?`. [`DeployError::kind`] yields the stable tag the
//! CLI prints.

use scenepub_content_client::ContentServerError;
use scenepub_core::{ErrorKind, ProjectError};
use scenepub_crypto::CryptoError;
use scenepub_linker::LinkerError;
use scenepub_watch::WatchError;
use thiserror::Error;

use crate::config::ConfigError;

/// A failed deployment attempt.
#[derive(Error, Debug)]
pub enum DeployError {
    /// Invalid project input.
    #[error(transparent)]
    Project(#[from] ProjectError),

    /// The project directory could not be scanned.
    #[error("project scan failed: {0}")]
    Scan(#[from] WatchError),

    /// A file exceeds the configured size limit.
    #[error("file \"{path}\" is {size} bytes, over the {limit} byte limit")]
    FileTooLarge {
        /// Project-relative path.
        path: String,
        /// Actual size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// The signing handshake failed.
    #[error(transparent)]
    Linker(#[from] LinkerError),

    /// Signing or chain verification failed.
    #[error("authorization failed: {0}")]
    Authorization(#[from] CryptoError),

    /// The content server failed or refused the upload.
    #[error(transparent)]
    ContentServer(#[from] ContentServerError),

    /// The upload was not confirmed.
    #[error("upload declined")]
    Declined,

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl DeployError {
    /// The stable kind tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Project(_) | Self::Scan(_) | Self::Config(_) => ErrorKind::Project,
            Self::FileTooLarge { .. } | Self::Declined => ErrorKind::Upload,
            Self::Linker(_) | Self::Authorization(_) => ErrorKind::Linker,
            Self::ContentServer(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(DeployError::from(ProjectError::NoPointers).kind(), ErrorKind::Project);
        assert_eq!(DeployError::from(LinkerError::TimedOut).kind(), ErrorKind::Linker);
        assert_eq!(
            DeployError::FileTooLarge {
                path: "big.glb".into(),
                size: 2,
                limit: 1
            }
            .kind(),
            ErrorKind::Upload
        );
        assert_eq!(
            DeployError::from(ContentServerError::NoHealthyServer { candidates: 0 }).kind(),
            ErrorKind::ContentServer
        );
        assert_eq!(
            DeployError::from(ContentServerError::UploadRejected {
                endpoint: "POST /content/entities".into(),
                status: 400,
                body: String::new(),
            })
            .kind(),
            ErrorKind::Upload
        );
    }

    #[test]
    fn oversize_message_names_file() {
        let err = DeployError::FileTooLarge {
            path: "models/big.glb".into(),
            size: 60,
            limit: 50,
        };
        assert!(err.to_string().contains("models/big.glb"));
    }
}
