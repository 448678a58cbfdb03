//! Hooks for the interactive front end.
//!
//! The coordinator reports progress and asks for confirmation through a
//! [`DeployObserver`]. Every method has a default, so the silent observer is
//! an empty impl.

use scenepub_core::{ContentIdentifier, Entity};

/// What the coordinator is about to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPlan {
    /// Entity being deployed.
    pub entity_id: ContentIdentifier,
    /// Server receiving the upload.
    pub target: String,
    /// Content identifiers the server lacks.
    pub missing: Vec<ContentIdentifier>,
    /// Content identifiers the server already stores.
    pub present: Vec<ContentIdentifier>,
    /// Bytes of content to upload, excluding the entity file.
    pub bytes: u64,
}

/// Progress callbacks for a deployment.
pub trait DeployObserver: Send + Sync {
    /// The entity was built and hashed.
    fn entity_built(&self, _entity: &Entity) {}

    /// A signing session is waiting at `url`.
    fn signing_requested(&self, _url: &str) {}

    /// Return `false` to abort before anything is uploaded.
    fn confirm_upload(&self, _plan: &UploadPlan) -> bool {
        true
    }
}

/// Observer that reports nothing and confirms everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl DeployObserver for SilentObserver {}
