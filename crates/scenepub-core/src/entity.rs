//! # Entity Builder
//!
//! An [`Entity`] is the signed unit of publication: an entity type, the
//! pointers it is published under, a timestamp, the content list and free-form
//! metadata. It is serialized to a compact JSON file with a fixed field order:
//!
//! ```text
//! {"type":…,"pointers":[…],"timestamp":<ms>,"content":[{"file":…,"hash":…}],"metadata":{…}}
//! ```
//!
//! Metadata keys are emitted in canonical (RFC 8785) order. The entity id is
//! the [`ContentIdentifier`] of exactly these bytes, so it commits to the
//! content list as well as to the pointers and metadata.
//!
//! Entities are only produced by [`EntityBuilder::build`], which validates
//! every input before anything is hashed.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::canonicalize_value;
use crate::error::ProjectError;
use crate::file::FileRecord;
use crate::identifier::{identifier_of, ContentIdentifier};
use crate::pointer::{EntityType, Pointer};
use crate::temporal::Timestamp;

/// One line of the entity content list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentEntry {
    /// Relative POSIX path of the file.
    pub file: String,
    /// Identifier of the file bytes.
    pub hash: ContentIdentifier,
}

/// The serialized form of an entity, as written to the entity file.
///
/// Field order here is the wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityManifest {
    /// Entity type.
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Pointers the entity is published under.
    pub pointers: Vec<Pointer>,
    /// Publication time in milliseconds.
    pub timestamp: Timestamp,
    /// Content list, sorted by path.
    pub content: Vec<ContentEntry>,
    /// Free-form metadata object.
    pub metadata: Value,
}

impl EntityManifest {
    /// Parse an entity file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProjectError> {
        serde_json::from_slice(bytes)
            .map_err(|e| ProjectError::InvalidScene(format!("malformed entity file: {e}")))
    }
}

/// An immutable, identified entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: ContentIdentifier,
    manifest: EntityManifest,
    wire: Vec<u8>,
}

impl Entity {
    /// The entity id: identifier of [`Entity::wire_bytes`].
    pub fn id(&self) -> &ContentIdentifier {
        &self.id
    }

    /// Entity type.
    pub fn entity_type(&self) -> EntityType {
        self.manifest.entity_type
    }

    /// Normalized pointers, in the order supplied.
    pub fn pointers(&self) -> &[Pointer] {
        &self.manifest.pointers
    }

    /// Publication timestamp.
    pub fn timestamp(&self) -> Timestamp {
        self.manifest.timestamp
    }

    /// Content list, sorted by path.
    pub fn content(&self) -> &[ContentEntry] {
        &self.manifest.content
    }

    /// Canonicalized metadata object.
    pub fn metadata(&self) -> &Value {
        &self.manifest.metadata
    }

    /// The full manifest.
    pub fn manifest(&self) -> &EntityManifest {
        &self.manifest
    }

    /// The entity file bytes that were hashed into the id.
    pub fn wire_bytes(&self) -> &[u8] {
        &self.wire
    }

    /// Distinct content identifiers referenced by the entity.
    ///
    /// Two paths with identical bytes share one identifier and are uploaded once.
    pub fn unique_hashes(&self) -> BTreeSet<ContentIdentifier> {
        self.manifest.content.iter().map(|c| c.hash.clone()).collect()
    }
}

/// Builder for [`Entity`].
#[derive(Debug, Clone)]
pub struct EntityBuilder {
    entity_type: EntityType,
    pointers: Vec<String>,
    metadata: Value,
    timestamp: Option<Timestamp>,
}

impl EntityBuilder {
    /// Start building an entity of the given type with empty metadata.
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            pointers: Vec::new(),
            metadata: Value::Object(serde_json::Map::new()),
            timestamp: None,
        }
    }

    /// Set the raw pointers. They are validated in [`EntityBuilder::build`].
    pub fn pointers<I, S>(mut self, pointers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.pointers = pointers.into_iter().map(|p| p.as_ref().to_string()).collect();
        self
    }

    /// Set the metadata. Must be a JSON object.
    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Pin the timestamp instead of using the current time.
    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Validate inputs, hash the files and produce the entity.
    pub fn build(self, files: &[FileRecord]) -> Result<Entity, ProjectError> {
        let pointers = self.validate_pointers()?;

        let metadata = match &self.metadata {
            Value::Object(_) => canonicalize_value(&self.metadata)?,
            other => return Err(ProjectError::MetadataNotObject(json_type_name(other))),
        };

        let mut by_path: BTreeMap<&str, ContentIdentifier> = BTreeMap::new();
        for file in files {
            if by_path.insert(file.path(), file.identifier()).is_some() {
                return Err(ProjectError::DuplicatePath(file.path().to_string()));
            }
        }
        let content: Vec<ContentEntry> = by_path
            .into_iter()
            .map(|(file, hash)| ContentEntry {
                file: file.to_string(),
                hash,
            })
            .collect();

        let manifest = EntityManifest {
            entity_type: self.entity_type,
            pointers,
            timestamp: self.timestamp.unwrap_or_else(Timestamp::now),
            content,
            metadata,
        };
        let wire = serde_json::to_vec(&manifest)
            .map_err(crate::error::CanonicalizationError::from)?;
        let id = identifier_of(&wire);

        tracing::debug!(
            entity_id = %id,
            entity_type = %manifest.entity_type,
            files = manifest.content.len(),
            "built entity"
        );

        Ok(Entity { id, manifest, wire })
    }

    fn validate_pointers(&self) -> Result<Vec<Pointer>, ProjectError> {
        if self.pointers.is_empty() {
            return Err(ProjectError::NoPointers);
        }
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(self.pointers.len());
        for raw in &self.pointers {
            let pointer = Pointer::parse(raw, self.entity_type)?;
            if !seen.insert(pointer.clone()) {
                return Err(ProjectError::DuplicatePointer(pointer.to_string()));
            }
            out.push(pointer);
        }
        Ok(out)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
