//! Request and response shapes of the content server API.
//!
//! Response types ignore unknown fields so that newer servers stay readable.

use std::collections::BTreeMap;

use scenepub_core::{ContentIdentifier, Entity};
use scenepub_crypto::AuthChain;
use serde::{Deserialize, Serialize};

/// Remote presence of each queried identifier. Fetched fresh, never cached.
pub type RemoteContentStatus = BTreeMap<ContentIdentifier, bool>;

/// One entry of `GET /content/available-content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableContent {
    /// Queried identifier.
    pub cid: ContentIdentifier,
    /// Whether the server already stores it.
    pub available: bool,
}

/// Response of `POST /content/entities`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    /// Server time at which the entity was accepted, in milliseconds.
    pub creation_timestamp: i64,
}

/// Response of `GET /about`. Only health is modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    /// Whether the server reports itself healthy.
    #[serde(default)]
    pub healthy: bool,
}

/// One entry of the discovery list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerEntry {
    /// Root URL of the server.
    pub base_url: String,
}

/// A file part of a deployment, named by its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Identifier of `bytes`.
    pub identifier: ContentIdentifier,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Everything sent in one deployment request.
///
/// The entity file is always part of the upload. Content files are added
/// only when the server does not already have them.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    entity_id: ContentIdentifier,
    auth_chain: AuthChain,
    entity_file: UploadFile,
    content: Vec<UploadFile>,
}

impl DeployRequest {
    /// Request deploying `entity` under `auth_chain`, with no content files yet.
    pub fn new(entity: &Entity, auth_chain: AuthChain) -> Self {
        Self {
            entity_id: entity.id().clone(),
            auth_chain,
            entity_file: UploadFile {
                identifier: entity.id().clone(),
                bytes: entity.wire_bytes().to_vec(),
            },
            content: Vec::new(),
        }
    }

    /// Add a content file. A second file with the same identifier is ignored.
    pub fn with_content(mut self, identifier: ContentIdentifier, bytes: Vec<u8>) -> Self {
        if !self.content.iter().any(|f| f.identifier == identifier) {
            self.content.push(UploadFile { identifier, bytes });
        }
        self
    }

    /// Id of the entity being deployed.
    pub fn entity_id(&self) -> &ContentIdentifier {
        &self.entity_id
    }

    /// Authorization sent with the entity.
    pub fn auth_chain(&self) -> &AuthChain {
        &self.auth_chain
    }

    /// Content files, excluding the entity file.
    pub fn content(&self) -> &[UploadFile] {
        &self.content
    }

    /// Every file part, content first and the entity file last.
    pub fn files(&self) -> impl Iterator<Item = &UploadFile> {
        self.content.iter().chain(std::iter::once(&self.entity_file))
    }

    /// Total bytes of content files, excluding the entity file.
    pub fn content_bytes(&self) -> u64 {
        self.content.iter().map(|f| f.bytes.len() as u64).sum()
    }

    /// Build the multipart form. Called once per attempt.
    pub(crate) fn to_form(&self) -> reqwest::multipart::Form {
        let mut form =
            reqwest::multipart::Form::new().text("entityId", self.entity_id.to_string());
        for (i, link) in self.auth_chain.links().iter().enumerate() {
            form = form
                .text(format!("authChain[{i}][type]"), link.link_type.as_str())
                .text(format!("authChain[{i}][payload]"), link.payload.clone())
                .text(format!("authChain[{i}][signature]"), link.signature.clone());
        }
        for file in self.files() {
            let name = file.identifier.to_string();
            let part = reqwest::multipart::Part::bytes(file.bytes.clone()).file_name(name.clone());
            form = form.part(name, part);
        }
        form
    }
}
