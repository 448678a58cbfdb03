//! # Temporal Types
//!
//! Entity timestamps are integer milliseconds since the Unix epoch, UTC.
//! The timestamp is the only intentionally varying field of an entity, so
//! builders accept an injected [`Timestamp`] for reproducible output.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The current UTC time.
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// A timestamp from raw milliseconds.
    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    /// Raw milliseconds since the epoch.
    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// The timestamp as a `chrono` datetime, if representable.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}
