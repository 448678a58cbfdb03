//! # scenepub-deploy — Deployment Coordinator
//!
//! Drives one deployment attempt end to end: project scan, entity build,
//! authorization, availability query and delta upload. Only content the
//! server does not already store is sent; the entity file always is.
//!
//! ## Crate Policy
//!
//! - Every step returns a typed error; [`DeployError::kind`] is the stable tag.
//! - Private keys live in `Zeroizing` memory and are redacted from `Debug`.
//! - Nothing is cached between attempts.

pub mod authorize;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod observer;

pub use authorize::Authorizer;
pub use config::{ConfigError, DeployConfig};
pub use coordinator::{Coordinator, DeployReport, PreparedDeployment};
pub use error::DeployError;
pub use observer::{DeployObserver, SilentObserver, UploadPlan};
