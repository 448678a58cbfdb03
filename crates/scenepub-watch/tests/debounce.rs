//! Live watcher behavior against a real temporary directory.

use std::sync::Arc;
use std::time::Duration;

use scenepub_core::identifier_of;
use scenepub_watch::{scan_identifiers, ChangeKind, IgnoreRules, ProjectWatcher, WatchConfig};
use tokio::time::timeout;

fn config() -> WatchConfig {
    WatchConfig {
        debounce: Duration::from_millis(250),
        ..WatchConfig::default()
    }
}

async fn start(root: &std::path::Path) -> ProjectWatcher {
    ProjectWatcher::start(root, Arc::new(IgnoreRules::defaults()), config())
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn initial_scan_populates_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("scene.json"), b"X").unwrap();
    std::fs::write(dir.path().join("package.json"), b"{}").unwrap();

    let watcher = start(dir.path()).await;
    let snapshot = watcher.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot["scene.json"], identifier_of(b"X"));
    assert_eq!(watcher.generation(), 0);
    assert_eq!(
        watcher.resolve_by_identifier(&identifier_of(b"X")).as_deref(),
        Some("scene.json")
    );
    assert_eq!(watcher.resolve_by_identifier(&identifier_of(b"nope")), None);
    watcher.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn burst_of_writes_yields_one_notification() {
    let dir = tempfile::tempdir().unwrap();
    let watcher = start(dir.path()).await;
    let mut updates = watcher.subscribe();

    for i in 0..10 {
        std::fs::write(dir.path().join(format!("file{i}.txt")), format!("content {i}")).unwrap();
    }

    let update = timeout(Duration::from_secs(5), updates.recv())
        .await
        .expect("an update should arrive")
        .unwrap();
    assert_eq!(update.generation, 1);
    assert_eq!(update.changes.len(), 10);
    assert!(update.changes.iter().all(|c| c.kind == ChangeKind::Added));
    assert_eq!(update.snapshot.len(), 10);

    let second = timeout(Duration::from_millis(1000), updates.recv()).await;
    assert!(second.is_err(), "no second notification expected");
    watcher.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rewrite_with_identical_content_is_not_a_change() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"v1").unwrap();
    let watcher = start(dir.path()).await;
    let mut updates = watcher.subscribe();

    std::fs::write(dir.path().join("a.txt"), b"v2").unwrap();
    std::fs::write(dir.path().join("a.txt"), b"v1").unwrap();
    std::fs::write(dir.path().join("b.txt"), b"new").unwrap();

    let update = timeout(Duration::from_secs(5), updates.recv())
        .await
        .expect("an update should arrive")
        .unwrap();
    let paths: Vec<&str> = update.changes.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["b.txt"]);
    assert_eq!(update.snapshot["a.txt"], identifier_of(b"v1"));
    watcher.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn deletion_is_reported_as_removal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("models")).unwrap();
    std::fs::write(dir.path().join("models/tree.glb"), b"tree").unwrap();
    std::fs::write(dir.path().join("scene.json"), b"X").unwrap();
    let watcher = start(dir.path()).await;
    let before = watcher.root_identifier();
    let mut updates = watcher.subscribe();

    std::fs::remove_dir_all(dir.path().join("models")).unwrap();

    let update = timeout(Duration::from_secs(5), updates.recv())
        .await
        .expect("an update should arrive")
        .unwrap();
    assert_eq!(update.changes.len(), 1);
    assert_eq!(update.changes[0].path, "models/tree.glb");
    assert_eq!(update.changes[0].kind, ChangeKind::Removed);
    assert_ne!(watcher.root_identifier(), before);
    watcher.stop().await;
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn symlinks_created_while_watching_are_not_followed() {
    let dir = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    std::fs::write(outside.path().join("secret.txt"), b"outside").unwrap();
    let watcher = start(dir.path()).await;
    let mut updates = watcher.subscribe();

    std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("link.txt"))
        .unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("linked_dir")).unwrap();
    std::fs::write(dir.path().join("real.txt"), b"inside").unwrap();

    let update = timeout(Duration::from_secs(5), updates.recv())
        .await
        .expect("an update should arrive")
        .unwrap();
    let paths: Vec<&str> = update.changes.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["real.txt"]);

    let scanned = scan_identifiers(dir.path(), &IgnoreRules::defaults()).unwrap();
    assert_eq!(*watcher.snapshot(), scanned);
    watcher.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn events_during_hashing_reach_a_later_update() {
    let dir = tempfile::tempdir().unwrap();
    let watcher = start(dir.path()).await;
    let mut updates = watcher.subscribe();

    std::fs::write(dir.path().join("big.bin"), vec![7u8; 32 * 1024 * 1024]).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    std::fs::write(dir.path().join("late.txt"), b"late").unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let update = tokio::time::timeout_at(deadline, updates.recv())
            .await
            .expect("late.txt should be published")
            .unwrap();
        if update.snapshot.contains_key("late.txt") {
            assert!(update.snapshot.contains_key("big.bin"));
            break;
        }
    }
    watcher.stop().await;
}

#[tokio::test]
async fn missing_root_fails_to_start() {
    let dir = tempfile::tempdir().unwrap();
    let result = ProjectWatcher::start(
        dir.path().join("absent"),
        Arc::new(IgnoreRules::defaults()),
        config(),
    )
    .await;
    assert!(result.is_err());
}
