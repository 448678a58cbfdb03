#![deny(missing_docs)]

//! # scenepub-core — Foundational Types for Scene Publishing
//!
//! Every other crate in the workspace depends on this one. It has no internal
//! crate dependencies, only `serde`, `serde_json`, `serde_jcs`, `thiserror`,
//! `chrono` and `sha2` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **One identifier format.** [`ContentIdentifier`] is a CIDv1 string
//!    (`raw` codec, `sha2-256` multihash, base32 multibase). It is computed
//!    only from bytes, never from filesystem metadata.
//!
//! 2. **[`CanonicalBytes`] is the sole path to structured digests.** Entity
//!    metadata flows through RFC 8785 canonicalization before it is hashed.
//!
//! 3. **Entities are immutable.** [`Entity`] exposes accessors only; its `id`
//!    is the identifier of its own wire bytes, content list included.
//!
//! 4. **Structured errors.** [`ProjectError`] carries the offending input so
//!    the author can fix the project without guesswork.

pub mod canonical;
pub mod entity;
pub mod error;
pub mod file;
pub mod identifier;
pub mod pointer;
pub mod scene;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use entity::{ContentEntry, Entity, EntityBuilder, EntityManifest};
pub use error::{CanonicalizationError, ErrorKind, IdentifierError, ProjectError};
pub use file::{normalize_path, FileRecord};
pub use identifier::{identifier_of, identifier_of_set, root_identifier, ContentIdentifier};
pub use pointer::{EntityType, Parcel, Pointer};
pub use scene::SceneDescriptor;
pub use temporal::Timestamp;
