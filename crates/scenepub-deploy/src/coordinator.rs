//! # Deployment Coordinator
//!
//! One attempt runs these steps in order, stopping at the first failure:
//!
//! 1. scan the project and enforce the file size limit,
//! 2. build the entity from `scene.json` and the scanned files,
//! 3. authorize it (local key or signing handshake) and verify the chain,
//! 4. resolve the content server and ask which identifiers it already has,
//! 5. upload the missing content together with the entity file.
//!
//! Signing happens strictly after hashing, and a signing failure returns
//! before any network call. Availability is queried fresh on every attempt,
//! so a repeated deployment uploads zero content bytes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use scenepub_content_client::{ContentClient, DeployRequest};
use scenepub_core::{
    ContentIdentifier, Entity, EntityBuilder, EntityType, FileRecord, SceneDescriptor, Timestamp,
};
use scenepub_watch::{scan_project, IgnoreRules};
use serde::Serialize;

use crate::authorize::Authorizer;
use crate::config::DeployConfig;
use crate::error::DeployError;
use crate::observer::{DeployObserver, SilentObserver, UploadPlan};

/// Outcome of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployReport {
    /// Id of the deployed entity.
    pub entity_id: ContentIdentifier,
    /// Server that accepted it.
    pub target: String,
    /// Content identifiers uploaded in this attempt.
    pub uploaded: Vec<ContentIdentifier>,
    /// Content identifiers the server already had.
    pub skipped: Vec<ContentIdentifier>,
    /// Content bytes uploaded, excluding the entity file.
    pub bytes: u64,
    /// Server acceptance time in milliseconds.
    pub creation_timestamp: i64,
    /// Link to the scene in the viewer.
    pub viewer_url: String,
}

/// A project read from disk and turned into an entity, not yet signed.
#[derive(Debug, Clone)]
pub struct PreparedDeployment {
    entity: Entity,
    files: Vec<FileRecord>,
    scene: SceneDescriptor,
}

impl PreparedDeployment {
    /// The built entity.
    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    /// The files referenced by the entity.
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    /// The parsed `scene.json`.
    pub fn scene(&self) -> &SceneDescriptor {
        &self.scene
    }
}

/// Runs deployment attempts.
pub struct Coordinator {
    config: DeployConfig,
    authorizer: Authorizer,
    observer: Arc<dyn DeployObserver>,
    timestamp: Option<Timestamp>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.config)
            .field("authorizer", &self.authorizer.describe())
            .finish()
    }
}

impl Coordinator {
    /// Coordinator with the authorizer implied by `config`.
    pub fn new(config: DeployConfig) -> Result<Self, DeployError> {
        let authorizer = Authorizer::from_config(&config)?;
        Ok(Self {
            config,
            authorizer,
            observer: Arc::new(SilentObserver),
            timestamp: None,
        })
    }

    /// Replace the authorizer.
    pub fn with_authorizer(mut self, authorizer: Authorizer) -> Self {
        self.authorizer = authorizer;
        self
    }

    /// Replace the observer.
    pub fn with_observer(mut self, observer: Arc<dyn DeployObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Pin the entity timestamp instead of using the current time.
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Scan `root`, enforce the size limit and build the entity.
    pub fn prepare(&self, root: &Path) -> Result<PreparedDeployment, DeployError> {
        let ignore = IgnoreRules::from_project(root)?;
        let files = scan_project(root, &ignore)?;

        let limit = self.config.max_file_size;
        if let Some(file) = files.iter().find(|f| f.size() > limit) {
            return Err(DeployError::FileTooLarge {
                path: file.path().to_string(),
                size: file.size(),
                limit,
            });
        }

        let scene = SceneDescriptor::from_project(root)?;
        let mut builder = EntityBuilder::new(EntityType::Scene)
            .pointers(scene.pointers())
            .metadata(scene.metadata().clone());
        if let Some(ts) = self.timestamp {
            builder = builder.timestamp(ts);
        }
        let entity = builder.build(&files)?;

        tracing::info!(
            root = %root.display(),
            entity_id = %entity.id(),
            files = files.len(),
            pointers = entity.pointers().len(),
            "entity built"
        );
        Ok(PreparedDeployment {
            entity,
            files,
            scene,
        })
    }

    /// Run one full attempt for the project at `root`.
    pub async fn deploy(&self, root: &Path) -> Result<DeployReport, DeployError> {
        let prepared = self.prepare(root)?;
        self.deploy_prepared(&prepared).await
    }

    /// Authorize and upload an already prepared project.
    pub async fn deploy_prepared(
        &self,
        prepared: &PreparedDeployment,
    ) -> Result<DeployReport, DeployError> {
        let entity = prepared.entity();
        self.observer.entity_built(entity);

        let target_label = match &self.config.content.target {
            Some(url) => url.to_string(),
            None => self.config.content.discovery_url.to_string(),
        };
        let chain = self
            .authorizer
            .authorize(entity, &target_label, self.observer.as_ref())
            .await?;

        let client = ContentClient::connect(&self.config.content).await?;
        let target = client.base_url().to_string();

        let by_id: BTreeMap<ContentIdentifier, &FileRecord> = prepared
            .files()
            .iter()
            .map(|f| (f.identifier(), f))
            .collect();
        let hashes: Vec<ContentIdentifier> = entity.unique_hashes().into_iter().collect();
        let status = client.available_content(&hashes).await?;

        let (present, missing): (Vec<_>, Vec<_>) = hashes
            .into_iter()
            .partition(|id| status.get(id).copied().unwrap_or(false));
        let bytes = missing
            .iter()
            .filter_map(|id| by_id.get(id))
            .map(|f| f.size())
            .sum();

        let plan = UploadPlan {
            entity_id: entity.id().clone(),
            target: target.clone(),
            missing,
            present,
            bytes,
        };
        tracing::info!(
            entity_id = %plan.entity_id,
            %target,
            missing = plan.missing.len(),
            present = plan.present.len(),
            bytes = plan.bytes,
            "upload planned"
        );
        if !self.observer.confirm_upload(&plan) {
            return Err(DeployError::Declined);
        }

        let missing_set: BTreeSet<&ContentIdentifier> = plan.missing.iter().collect();
        let mut request = DeployRequest::new(entity, chain);
        for (id, file) in &by_id {
            if missing_set.contains(id) {
                request = request.with_content(id.clone(), file.content().to_vec());
            }
        }
        let response = client.deploy(&request).await?;

        let report = DeployReport {
            entity_id: entity.id().clone(),
            target,
            uploaded: plan.missing,
            skipped: plan.present,
            bytes: request.content_bytes(),
            creation_timestamp: response.creation_timestamp,
            viewer_url: format!(
                "{}/?position={}",
                self.config.viewer_url.trim_end_matches('/'),
                prepared.scene().base()
            ),
        };
        tracing::info!(
            entity_id = %report.entity_id,
            uploaded = report.uploaded.len(),
            skipped = report.skipped.len(),
            bytes = report.bytes,
            "deployment accepted"
        );
        Ok(report)
    }
}
