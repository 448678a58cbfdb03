//! # scenepub-watch — Project Scanning and Incremental Identifiers
//!
//! Keeps a live `path → ContentIdentifier` map for a project directory.
//!
//! - [`ignore`]: `.dclignore`-style rules deciding which paths belong to the
//!   published scene.
//! - [`scan`]: one-shot collection of project files, used by the CLI and as the
//!   watcher's initial state.
//! - [`watcher`]: filesystem notifications feed a bounded queue drained by a
//!   single debounced loop per root. Each stabilized batch is re-hashed on the
//!   blocking pool, swapped in atomically and announced to subscribers once.
//!
//! ## Crate Policy
//!
//! - Readers never observe a partially applied batch: they hold an
//!   `Arc` snapshot, and the writer replaces the whole map.
//! - Unreadable files inside a batch are logged and skipped. Failures of the
//!   initial scan are returned to the caller.

pub mod error;
pub mod ignore;
pub mod scan;
pub mod watcher;

pub use error::WatchError;
pub use ignore::{IgnorePredicate, IgnoreRules, IGNORE_FILE};
pub use scan::{scan_identifiers, scan_project, PathIdentifierMap};
pub use watcher::{ChangeKind, PathChange, ProjectWatcher, WatchConfig, WatchUpdate};
