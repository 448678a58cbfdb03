//! # Pointers and Entity Types
//!
//! A [`Pointer`] is the logical address an entity is published under. Its
//! format depends on the [`EntityType`]:
//!
//! | Type                  | Pointer format                       |
//! |-----------------------|--------------------------------------|
//! | `scene`               | `x,y` integer parcel coordinates     |
//! | `smart-item`          | item id token                        |
//! | `portable-experience` | experience id token                  |
//!
//! Tokens are non-empty and contain no whitespace or commas. All pointers are
//! trimmed and lower-cased so that the same address always hashes the same.

use serde::{Deserialize, Serialize};

use crate::error::ProjectError;

/// The kind of entity being published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityType {
    /// A scene deployed onto one or more parcels.
    Scene,
    /// A reusable smart item.
    SmartItem,
    /// A portable experience that follows the user.
    PortableExperience,
}

impl EntityType {
    /// Wire name of the entity type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scene => "scene",
            Self::SmartItem => "smart-item",
            Self::PortableExperience => "portable-experience",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = ProjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "scene" => Ok(Self::Scene),
            "smart-item" => Ok(Self::SmartItem),
            "portable-experience" => Ok(Self::PortableExperience),
            other => Err(ProjectError::InvalidScene(format!(
                "unknown entity type \"{other}\""
            ))),
        }
    }
}

/// A parcel coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Parcel {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

impl Parcel {
    /// Parse an `x,y` coordinate string.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (x, y) = raw
            .trim()
            .split_once(',')
            .ok_or_else(|| "expected \"x,y\" coordinates".to_string())?;
        let x = x
            .trim()
            .parse::<i32>()
            .map_err(|_| "x coordinate must be an integer".to_string())?;
        let y = y
            .trim()
            .parse::<i32>()
            .map_err(|_| "y coordinate must be an integer".to_string())?;
        Ok(Self { x, y })
    }
}

impl std::fmt::Display for Parcel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// A validated, normalized pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pointer(String);

impl Pointer {
    /// Validate `raw` against the pointer rules of `entity_type`.
    pub fn parse(raw: &str, entity_type: EntityType) -> Result<Self, ProjectError> {
        let invalid = |reason: String| ProjectError::InvalidPointer {
            pointer: raw.to_string(),
            entity_type: entity_type.to_string(),
            reason,
        };

        let trimmed = raw.trim().to_lowercase();
        if trimmed.is_empty() {
            return Err(invalid("pointer is empty".to_string()));
        }

        match entity_type {
            EntityType::Scene => {
                let parcel = Parcel::parse(&trimmed).map_err(invalid)?;
                Ok(Self(parcel.to_string()))
            }
            EntityType::SmartItem | EntityType::PortableExperience => {
                if trimmed.chars().any(|c| c.is_whitespace() || c == ',') {
                    return Err(invalid(
                        "pointer must not contain whitespace or commas".to_string(),
                    ));
                }
                Ok(Self(trimmed))
            }
        }
    }

    /// The normalized pointer string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Pointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
