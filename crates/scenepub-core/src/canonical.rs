//! # Canonical Serialization
//!
//! [`CanonicalBytes`] is the construction path for every structured value
//! that ends up inside a content identifier. It serializes through
//! `serde_jcs` (RFC 8785): object keys sorted lexicographically, compact
//! separators, deterministic number formatting.
//!
//! The inner `Vec<u8>` is private. Downstream code cannot hand-assemble
//! canonical bytes, so two callers serializing the same value always hash
//! the same input.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by RFC 8785 canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let s = serde_jcs::to_string(&value)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the inner byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Length of the canonical encoding in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the encoding is empty. Never true for a valid JSON value.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Re-read the canonical bytes as a JSON value.
    ///
    /// The resulting value iterates its object keys in canonical order even
    /// when `serde_json` is built with `preserve_order`.
    pub fn to_value(&self) -> Result<Value, CanonicalizationError> {
        Ok(serde_json::from_slice(&self.0)?)
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Rewrite a JSON value so that every nested object iterates in canonical key order.
pub fn canonicalize_value(value: &Value) -> Result<Value, CanonicalizationError> {
    CanonicalBytes::new(value)?.to_value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_keys_compact_separators() {
        let data = serde_json::json!({"b": 2, "a": 1, "c": "hello"});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(cb.as_bytes(), br#"{"a":1,"b":2,"c":"hello"}"#);
    }

    #[test]
    fn nested_objects_sorted() {
        let data = serde_json::json!({
            "scene": {"parcels": ["0,0"], "base": "0,0"},
            "main": "bin/game.js"
        });
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(
            std::str::from_utf8(cb.as_bytes()).unwrap(),
            r#"{"main":"bin/game.js","scene":{"base":"0,0","parcels":["0,0"]}}"#
        );
    }

    #[test]
    fn floats_are_accepted() {
        // Spawn points and rotations in scene descriptors carry fractional values.
        let data = serde_json::json!({"spawn": {"x": 0.5, "y": 1.25}});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(cb.as_bytes(), br#"{"spawn":{"x":0.5,"y":1.25}}"#);
    }

    #[test]
    fn empty_object() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(cb.as_bytes(), b"{}");
        assert!(!cb.is_empty());
        assert_eq!(cb.len(), 2);
    }

    #[test]
    fn canonicalize_value_round_trips() {
        let data = serde_json::json!({"z": [1, {"y": true, "x": null}], "a": "s"});
        let v = canonicalize_value(&data).unwrap();
        assert_eq!(v, data);
        let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "z"]);
    }

    #[test]
    fn unicode_passthrough() {
        let data = serde_json::json!({"name": "caf\u{00e9}"});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert!(std::str::from_utf8(cb.as_bytes()).unwrap().contains('\u{00e9}'));
    }
}
