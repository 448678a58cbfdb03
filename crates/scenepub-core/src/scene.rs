//! # Scene Descriptor
//!
//! Reads the project's `scene.json` and derives the entity pointers from it.
//! Only the `scene.parcels` and `scene.base` fields are interpreted; the rest
//! of the document is carried verbatim as entity metadata.

use std::path::Path;

use serde_json::Value;

use crate::error::ProjectError;
use crate::pointer::Parcel;

/// File name of the scene descriptor at the project root.
pub const SCENE_FILE: &str = "scene.json";

/// A parsed and validated `scene.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescriptor {
    parcels: Vec<Parcel>,
    base: Parcel,
    raw: Value,
}

impl SceneDescriptor {
    /// Validate a parsed `scene.json` document.
    ///
    /// `scene.parcels` must be a non-empty list of `x,y` strings and
    /// `scene.base` must be one of them.
    pub fn from_value(raw: Value) -> Result<Self, ProjectError> {
        let scene = raw
            .get("scene")
            .and_then(Value::as_object)
            .ok_or_else(|| ProjectError::InvalidScene("missing \"scene\" object".into()))?;

        let parcels_raw = scene
            .get("parcels")
            .and_then(Value::as_array)
            .ok_or_else(|| ProjectError::InvalidScene("missing \"scene.parcels\" list".into()))?;
        if parcels_raw.is_empty() {
            return Err(ProjectError::InvalidScene(
                "\"scene.parcels\" must not be empty".into(),
            ));
        }

        let mut parcels = Vec::with_capacity(parcels_raw.len());
        for entry in parcels_raw {
            let text = entry.as_str().ok_or_else(|| {
                ProjectError::InvalidScene(format!("parcel {entry} is not a string"))
            })?;
            let parcel = Parcel::parse(text)
                .map_err(|reason| ProjectError::InvalidScene(format!("parcel \"{text}\": {reason}")))?;
            parcels.push(parcel);
        }

        let base_text = scene
            .get("base")
            .and_then(Value::as_str)
            .ok_or_else(|| ProjectError::InvalidScene("missing \"scene.base\"".into()))?;
        let base = Parcel::parse(base_text)
            .map_err(|reason| ProjectError::InvalidScene(format!("base \"{base_text}\": {reason}")))?;
        if !parcels.contains(&base) {
            return Err(ProjectError::InvalidScene(format!(
                "base parcel {base} is not one of the scene parcels"
            )));
        }

        Ok(Self { parcels, base, raw })
    }

    /// Read and validate `scene.json` under `root`.
    pub fn from_project(root: &Path) -> Result<Self, ProjectError> {
        let path = root.join(SCENE_FILE);
        let bytes = std::fs::read(&path).map_err(|source| ProjectError::Io {
            path: path.clone(),
            source,
        })?;
        let raw: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ProjectError::InvalidScene(format!("{SCENE_FILE} is not valid JSON: {e}")))?;
        Self::from_value(raw)
    }

    /// The scene parcels, in document order.
    pub fn parcels(&self) -> &[Parcel] {
        &self.parcels
    }

    /// The base parcel.
    pub fn base(&self) -> Parcel {
        self.base
    }

    /// Pointer strings for the entity builder, one per parcel.
    pub fn pointers(&self) -> Vec<String> {
        self.parcels.iter().map(Parcel::to_string).collect()
    }

    /// The full document, used as entity metadata.
    pub fn metadata(&self) -> &Value {
        &self.raw
    }
}
