//! # Linker Errors
//!
//! [`LinkerError`] is what callers of the handshake see. [`ApiError`] is the
//! HTTP-facing error returned by route handlers and rendered as a structured
//! JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scenepub_core::ErrorKind;
use scenepub_crypto::CryptoError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by a signing session.
#[derive(Error, Debug)]
pub enum LinkerError {
    /// The port is taken by another process.
    #[error("port {port} is already in use")]
    PortInUse {
        /// The port that could not be bound.
        port: u16,
    },

    /// Binding the listener failed for another reason.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address being bound.
        addr: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The signer posted a body that could not be accepted.
    #[error("invalid signer response: {0}")]
    InvalidResponse(String),

    /// The session already has an outcome.
    #[error("session has already been resolved")]
    AlreadyResolved,

    /// No response arrived before the timeout.
    #[error("timed out waiting for a signature")]
    TimedOut,

    /// The session was cancelled by the caller or by Ctrl-C.
    #[error("signing session was cancelled")]
    Cancelled,

    /// Another session is still running on this linker.
    #[error("a signing session is already in progress")]
    SessionInProgress,

    /// The signer declined to sign.
    #[error("signer rejected the request: {0}")]
    Rejected(String),
}

impl LinkerError {
    /// The stable kind tag for this error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Linker
    }
}

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error detail.
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code, e.g. `BAD_REQUEST`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// HTTP error returned by route handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Body missing, unparsable or invalid (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Session already resolved (409).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        tracing::debug!(status = status.as_u16(), error = %self, "rejecting signer request");
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<LinkerError> for ApiError {
    fn from(err: LinkerError) -> Self {
        match err {
            LinkerError::AlreadyResolved
            | LinkerError::TimedOut
            | LinkerError::Cancelled
            | LinkerError::Rejected(_) => Self::Conflict(err.to_string()),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        Self::BadRequest(err.to_string())
    }
}
