//! # Incremental Watcher
//!
//! One [`ProjectWatcher`] per project root. The OS notification backend
//! (`notify`) pushes raw events into a bounded queue; a single task drains it,
//! collecting affected paths in a set and re-arming a debounce timer on every
//! event. When the timer fires the batch is handed to a separate task that
//! re-hashes it on the blocking pool, diffs it against the current map and,
//! if anything changed, swaps it in and publishes it to subscribers exactly
//! once. The loop keeps collecting events while a batch is hashed; the next
//! batch starts only after the previous one has been published.
//!
//! If the queue overflows or the backend asks for a rescan, the next batch
//! re-scans the whole project instead of the collected paths.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify::event::{AccessKind, AccessMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use scenepub_core::{identifier_of, root_identifier, ContentIdentifier};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::WatchError;
use crate::ignore::IgnorePredicate;
use crate::scan::{relative_path, scan_identifiers, walk, PathIdentifierMap};

/// Watcher tuning.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Quiet period after the last event before a batch is processed.
    pub debounce: Duration,
    /// Capacity of the raw event queue.
    pub queue_capacity: usize,
    /// Number of updates a slow subscriber may lag behind.
    pub broadcast_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            queue_capacity: 1024,
            broadcast_capacity: 16,
        }
    }
}

impl WatchConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SCENEPUB_WATCH_DEBOUNCE_MS` (default: 300)
    /// - `SCENEPUB_WATCH_QUEUE` (default: 1024)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            debounce: std::env::var("SCENEPUB_WATCH_DEBOUNCE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.debounce),
            queue_capacity: std::env::var("SCENEPUB_WATCH_QUEUE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.queue_capacity),
            broadcast_capacity: defaults.broadcast_capacity,
        }
    }
}

/// How a path changed in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The path is new.
    Added,
    /// The path existed with different bytes.
    Modified,
    /// The path no longer exists or is now ignored.
    Removed,
}

/// One path whose identifier changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathChange {
    /// Project-relative path.
    pub path: String,
    /// Kind of change.
    pub kind: ChangeKind,
    /// New identifier, `None` for removals.
    pub identifier: Option<ContentIdentifier>,
}

/// Notification sent to subscribers once per stabilized batch.
#[derive(Debug, Clone)]
pub struct WatchUpdate {
    /// Monotonic counter, starting at 1 for the first change after start.
    pub generation: u64,
    /// Paths that changed, in path order.
    pub changes: Vec<PathChange>,
    /// The full map after the batch.
    pub snapshot: Arc<PathIdentifierMap>,
}

enum WatchSignal {
    Paths(Vec<PathBuf>),
    Rescan,
}

struct Shared {
    root: PathBuf,
    ignore: Arc<dyn IgnorePredicate>,
    map: RwLock<Arc<PathIdentifierMap>>,
    generation: AtomicU64,
    overflowed: AtomicBool,
    updates: broadcast::Sender<WatchUpdate>,
}

/// A live `path → identifier` map for one project root.
pub struct ProjectWatcher {
    shared: Arc<Shared>,
    os_watcher: Option<RecommendedWatcher>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ProjectWatcher {
    /// Scan `root` and start watching it.
    ///
    /// The OS watcher is registered before the initial scan so that no change
    /// made during the scan is lost. Scan failures are returned.
    pub async fn start(
        root: impl AsRef<Path>,
        ignore: Arc<dyn IgnorePredicate>,
        config: WatchConfig,
    ) -> Result<Self, WatchError> {
        let root = root.as_ref();
        let root = std::fs::canonicalize(root).map_err(|source| WatchError::Scan {
            path: root.to_path_buf(),
            source,
        })?;
        if !root.is_dir() {
            return Err(WatchError::NotADirectory(root));
        }

        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let (updates, _) = broadcast::channel(config.broadcast_capacity.max(1));
        let shared = Arc::new(Shared {
            root: root.clone(),
            ignore,
            map: RwLock::new(Arc::new(PathIdentifierMap::new())),
            generation: AtomicU64::new(0),
            overflowed: AtomicBool::new(false),
            updates,
        });

        let callback_shared = Arc::clone(&shared);
        let mut os_watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let signal = match res {
                Ok(event) if event.need_rescan() => WatchSignal::Rescan,
                Ok(event) if is_read_only_access(&event.kind) => return,
                Ok(event) => WatchSignal::Paths(event.paths),
                Err(e) => {
                    tracing::warn!(error = %e, "filesystem watcher error, scheduling rescan");
                    WatchSignal::Rescan
                }
            };
            if let Err(mpsc::error::TrySendError::Full(_)) = tx.try_send(signal) {
                callback_shared.overflowed.store(true, Ordering::SeqCst);
            }
        })?;
        os_watcher.watch(&root, RecursiveMode::Recursive)?;

        let scan_shared = Arc::clone(&shared);
        let initial = tokio::task::spawn_blocking(move || {
            scan_identifiers(&scan_shared.root, scan_shared.ignore.as_ref())
        })
        .await
        .map_err(|e| WatchError::Task(e.to_string()))??;

        tracing::info!(root = %root.display(), files = initial.len(), "watching project");
        *shared.map.write() = Arc::new(initial);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_loop(
            Arc::clone(&shared),
            rx,
            shutdown_rx,
            config.debounce,
        ));

        Ok(Self {
            shared,
            os_watcher: Some(os_watcher),
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// The canonical project root.
    pub fn root(&self) -> &Path {
        &self.shared.root
    }

    /// An immutable copy of the current map.
    pub fn snapshot(&self) -> Arc<PathIdentifierMap> {
        Arc::clone(&self.shared.map.read())
    }

    /// Root identifier of the current map.
    pub fn root_identifier(&self) -> ContentIdentifier {
        let snapshot = self.snapshot();
        root_identifier(snapshot.iter().map(|(p, id)| (p.as_str(), id)))
    }

    /// The first path, in path order, whose content has identifier `id`.
    pub fn resolve_by_identifier(&self, id: &ContentIdentifier) -> Option<String> {
        self.snapshot()
            .iter()
            .find(|(_, candidate)| *candidate == id)
            .map(|(path, _)| path.clone())
    }

    /// Number of batches published so far.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Receive one [`WatchUpdate`] per stabilized batch.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchUpdate> {
        self.shared.updates.subscribe()
    }

    /// Stop watching: drop the OS watcher and wait for the loop to exit.
    pub async fn stop(mut self) {
        self.os_watcher.take();
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "watch loop ended abnormally");
            }
        }
        tracing::debug!(root = %self.shared.root.display(), "stopped watching");
    }
}

impl Drop for ProjectWatcher {
    fn drop(&mut self) {
        self.os_watcher.take();
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl std::fmt::Debug for ProjectWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectWatcher")
            .field("root", &self.shared.root)
            .field("generation", &self.generation())
            .finish()
    }
}

fn is_read_only_access(kind: &EventKind) -> bool {
    match kind {
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => false,
        EventKind::Access(_) => true,
        _ => false,
    }
}

async fn run_loop(
    shared: Arc<Shared>,
    mut rx: mpsc::Receiver<WatchSignal>,
    mut shutdown: oneshot::Receiver<()>,
    debounce: Duration,
) {
    let mut pending: BTreeSet<PathBuf> = BTreeSet::new();
    let mut rescan = false;
    let mut armed = false;
    // At most one batch hashes at a time; events keep arriving meanwhile.
    let mut in_flight: Option<JoinHandle<()>> = None;
    let timer = tokio::time::sleep(debounce);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            signal = rx.recv() => {
                match signal {
                    Some(WatchSignal::Paths(paths)) => pending.extend(paths),
                    Some(WatchSignal::Rescan) => rescan = true,
                    None => break,
                }
                timer.as_mut().reset(tokio::time::Instant::now() + debounce);
                armed = true;
            }
            _ = &mut timer, if armed && in_flight.is_none() => {
                armed = false;
                let batch = std::mem::take(&mut pending);
                let full = std::mem::take(&mut rescan)
                    || shared.overflowed.swap(false, Ordering::SeqCst);
                in_flight = Some(tokio::spawn(apply_batch(Arc::clone(&shared), batch, full)));
            }
            done = async {
                match in_flight.as_mut() {
                    Some(task) => task.await,
                    None => std::future::pending().await,
                }
            }, if in_flight.is_some() => {
                in_flight = None;
                if let Err(e) = done {
                    tracing::warn!(error = %e, "batch task failed");
                }
            }
        }
    }

    if let Some(task) = in_flight {
        let _ = task.await;
    }
}

async fn apply_batch(shared: Arc<Shared>, batch: BTreeSet<PathBuf>, full: bool) {
    let current = Arc::clone(&shared.map.read());
    let worker = Arc::clone(&shared);
    let base = Arc::clone(&current);
    let computed = tokio::task::spawn_blocking(move || {
        if full {
            tracing::debug!("rescanning project");
            scan_identifiers(&worker.root, worker.ignore.as_ref())
                .map_err(|e| tracing::warn!(error = %e, "rescan failed, keeping previous state"))
                .ok()
        } else {
            Some(rehash_paths(&worker.root, worker.ignore.as_ref(), &base, &batch))
        }
    })
    .await;

    let next = match computed {
        Ok(Some(next)) => next,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(error = %e, "hashing task failed");
            return;
        }
    };

    let changes = diff(&current, &next);
    if changes.is_empty() {
        tracing::trace!("batch produced no changes");
        return;
    }

    let snapshot = Arc::new(next);
    *shared.map.write() = Arc::clone(&snapshot);
    let generation = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
    tracing::info!(generation, changed = changes.len(), files = snapshot.len(), "project changed");
    // No subscribers is not an error.
    let _ = shared.updates.send(WatchUpdate {
        generation,
        changes,
        snapshot,
    });
}

/// Re-read every path in `batch` and return the resulting map.
fn rehash_paths(
    root: &Path,
    ignore: &dyn IgnorePredicate,
    current: &PathIdentifierMap,
    batch: &BTreeSet<PathBuf>,
) -> PathIdentifierMap {
    let mut next = current.clone();
    for path in batch {
        let Some(rel) = relative_path(root, path) else {
            continue;
        };
        let prefix = format!("{rel}/");

        // Symlinks are never followed, as in the initial scan.
        let file_type = std::fs::symlink_metadata(path).map(|m| m.file_type()).ok();
        match file_type {
            Some(ft) if ft.is_dir() => {
                next.retain(|p, _| !p.starts_with(&prefix));
                if ignore.is_ignored(&rel, true) {
                    continue;
                }
                match walk(root, path, ignore) {
                    Ok(files) => {
                        for (file_rel, full) in files {
                            hash_into(&mut next, file_rel, &full);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping directory")
                    }
                }
            }
            Some(ft) if ft.is_file() => {
                if ignore.is_ignored(&rel, false) {
                    next.remove(&rel);
                    continue;
                }
                hash_into(&mut next, rel, path);
            }
            _ => {
                next.remove(&rel);
                next.retain(|p, _| !p.starts_with(&prefix));
            }
        }
    }
    next
}

fn hash_into(map: &mut PathIdentifierMap, rel: String, full: &Path) {
    match std::fs::read(full) {
        Ok(bytes) => {
            map.insert(rel, identifier_of(&bytes));
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            map.remove(&rel);
        }
        Err(e) => {
            tracing::warn!(path = %full.display(), error = %e, "skipping unreadable file");
        }
    }
}

fn diff(old: &PathIdentifierMap, new: &PathIdentifierMap) -> Vec<PathChange> {
    let mut changes = Vec::new();
    for (path, id) in new {
        let kind = match old.get(path) {
            None => ChangeKind::Added,
            Some(prev) if prev != id => ChangeKind::Modified,
            Some(_) => continue,
        };
        changes.push(PathChange {
            path: path.clone(),
            kind,
            identifier: Some(id.clone()),
        });
    }
    for path in old.keys().filter(|p| !new.contains_key(*p)) {
        changes.push(PathChange {
            path: path.clone(),
            kind: ChangeKind::Removed,
            identifier: None,
        });
    }
    changes.sort_by(|a, b| a.path.cmp(&b.path));
    changes
}
