//! # scenepub-cli — Scene Publishing Command-Line Interface
//!
//! ## Subcommands
//!
//! - `deploy` — build, sign and upload the project
//! - `watch` — keep a live identifier map and print changes
//! - `hash` — print the identifier of every published file
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from business logic; handlers delegate to
//!   the domain crates.
//! - `anyhow` is used here only. Failures print their stable kind tag and exit
//!   with status 1.

pub mod deploy;
pub mod hash;
pub mod project_build;
pub mod watch;

use scenepub_content_client::ContentServerError;
use scenepub_core::{ErrorKind, ProjectError};
use scenepub_deploy::DeployError;
use scenepub_linker::LinkerError;
use scenepub_watch::WatchError;

/// The stable kind of the first typed error in `err`'s chain.
///
/// Errors that carry no kind (I/O around the project, a failed build
/// command) are reported as project errors.
pub fn error_kind(err: &anyhow::Error) -> ErrorKind {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<DeployError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<LinkerError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<ContentServerError>() {
            return e.kind();
        }
        if cause.is::<ProjectError>() || cause.is::<WatchError>() {
            return ErrorKind::Project;
        }
    }
    ErrorKind::Project
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn kind_survives_context() {
        let err: anyhow::Error = Err::<(), _>(DeployError::from(LinkerError::TimedOut))
            .context("deployment failed")
            .unwrap_err();
        assert_eq!(error_kind(&err), ErrorKind::Linker);
    }

    #[test]
    fn content_server_kind() {
        let err = anyhow::Error::from(ContentServerError::NoHealthyServer { candidates: 3 });
        assert_eq!(error_kind(&err), ErrorKind::ContentServer);
    }

    #[test]
    fn untyped_errors_are_project_errors() {
        assert_eq!(error_kind(&anyhow::anyhow!("build failed")), ErrorKind::Project);
    }
}
