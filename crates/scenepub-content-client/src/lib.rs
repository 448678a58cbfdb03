//! # scenepub-content-client — Typed Client for Content Servers
//!
//! Provides the three calls a deployment needs:
//! - **Availability** via `GET /content/available-content`
//! - **Deployment** via multipart `POST /content/entities`
//! - **Health** via `GET /about`
//!
//! Plus **discovery** of a healthy server when no explicit target is given.
//!
//! ## Retry Policy
//!
//! Transient transport failures are retried with exponential backoff
//! (200ms, 400ms, 800ms). Status and decode errors are returned at once.
//! Availability answers are never cached between attempts.

pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use client::ContentClient;
pub use config::ContentServerConfig;
pub use error::ContentServerError;
pub use types::{
    AvailableContent, DeployRequest, DeployResponse, RemoteContentStatus, ServerStatus, UploadFile,
};
