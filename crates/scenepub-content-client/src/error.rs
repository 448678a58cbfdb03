//! Content server client error types.

use scenepub_core::ErrorKind;

/// Errors from content server calls.
#[derive(Debug, thiserror::Error)]
pub enum ContentServerError {
    /// HTTP transport error after retries.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        /// Endpoint being called, e.g. `GET /about`.
        endpoint: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },

    /// The server returned a non-2xx status.
    #[error("content server {endpoint} returned {status}: {body}")]
    Status {
        /// Endpoint being called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        /// Endpoint being called.
        endpoint: String,
        /// Underlying decode error.
        source: reqwest::Error,
    },

    /// The response decoded but does not make sense.
    #[error("malformed response from {endpoint}: {reason}")]
    Malformed {
        /// Endpoint being called.
        endpoint: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Discovery found no server reporting healthy.
    #[error("no healthy content server among {candidates} candidate(s)")]
    NoHealthyServer {
        /// Number of servers checked.
        candidates: usize,
    },

    /// The deployment request could not be delivered.
    #[error("upload to {endpoint} failed: {source}")]
    UploadFailed {
        /// Endpoint being called.
        endpoint: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },

    /// The server refused the deployment.
    #[error("upload to {endpoint} rejected with {status}: {body}")]
    UploadRejected {
        /// Endpoint being called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl ContentServerError {
    /// The stable kind tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UploadFailed { .. } | Self::UploadRejected { .. } => ErrorKind::Upload,
            _ => ErrorKind::ContentServer,
        }
    }
}
