//! Concurrent status aggregation: every profile gets its own bounded probe,
//! and a hung or failing probe surfaces on its own row only.

use std::sync::Arc;
use std::time::{Duration, Instant};

use authmux_core::adapters::adapter::AdapterSet;
use authmux_core::core::manager::Manager;
use authmux_core::storage::state::Tool;
use tempfile::TempDir;

mod common;
use common::fake_adapter::FakeAdapter;

fn fanout_manager(root: &TempDir) -> (Manager, Arc<FakeAdapter>, Arc<FakeAdapter>) {
    let claude = Arc::new(FakeAdapter::new(Tool::Claude));
    let codex = Arc::new(FakeAdapter::new(Tool::Codex));
    let manager = Manager::with_adapters(
        root.path(),
        AdapterSet::new(vec![claude.clone(), codex.clone()]),
    )
    .expect("manager")
    .with_status_timeout(Duration::from_millis(200));
    (manager, claude, codex)
}

#[tokio::test]
async fn rows_cover_all_profiles_in_registry_order() {
    let root = TempDir::new().unwrap();
    let (manager, claude, codex) = fanout_manager(&root);

    manager.ensure_profile(Tool::Codex, "beta").unwrap();
    manager.ensure_profile(Tool::Claude, "zeta").unwrap();
    manager.ensure_profile(Tool::Claude, "alpha").unwrap();

    let rows = manager.status_rows(None).await.unwrap();
    let order: Vec<(Tool, &str)> = rows
        .iter()
        .map(|r| (r.profile.tool, r.profile.name.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            (Tool::Claude, "alpha"),
            (Tool::Claude, "zeta"),
            (Tool::Codex, "beta"),
        ]
    );
    for row in &rows {
        assert!(row.error.is_none());
        assert!(row.status.logged_in);
    }
    assert_eq!(
        claude.probe_count.load(std::sync::atomic::Ordering::SeqCst),
        2
    );
    assert_eq!(
        codex.probe_count.load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn hung_probe_times_out_alone_and_does_not_block_the_rest() {
    let root = TempDir::new().unwrap();
    let (manager, _claude, _codex) = fanout_manager(&root);

    // "hang-forever" triggers the fake's never-returning path.
    manager.ensure_profile(Tool::Claude, "fast-a").unwrap();
    manager.ensure_profile(Tool::Claude, "hang-forever").unwrap();
    manager.ensure_profile(Tool::Codex, "fast-b").unwrap();

    let started = Instant::now();
    let rows = manager.status_rows(None).await.unwrap();
    let elapsed = started.elapsed();

    // Probes run concurrently, so the whole call is bounded by the single
    // 200 ms probe timeout, not the sum over profiles.
    assert!(
        elapsed < Duration::from_secs(2),
        "fan-out took {elapsed:?}, probes are not concurrent"
    );

    assert_eq!(rows.len(), 3);
    for row in &rows {
        if row.profile.name == "hang-forever" {
            let err = row.error.as_deref().expect("hung row must carry an error");
            assert!(err.contains("timed out"), "unexpected error: {err}");
        } else {
            assert!(row.error.is_none(), "row {} should be clean", row.profile.name);
            assert!(row.status.logged_in);
        }
    }
}

#[tokio::test]
async fn failing_probe_is_captured_per_row() {
    let root = TempDir::new().unwrap();
    let (manager, _claude, _codex) = fanout_manager(&root);

    manager.ensure_profile(Tool::Claude, "fail-now").unwrap();
    manager.ensure_profile(Tool::Claude, "healthy").unwrap();

    let rows = manager.status_rows(None).await.unwrap();
    assert_eq!(rows.len(), 2);

    let failed = rows.iter().find(|r| r.profile.name == "fail-now").unwrap();
    assert!(failed
        .error
        .as_deref()
        .is_some_and(|e| e.contains("probe blew up")));
    assert!(!failed.status.logged_in, "failed row keeps a zero status");

    let healthy = rows.iter().find(|r| r.profile.name == "healthy").unwrap();
    assert!(healthy.error.is_none());
}

#[tokio::test]
async fn tool_filter_limits_the_rows() {
    let root = TempDir::new().unwrap();
    let (manager, _claude, codex) = fanout_manager(&root);

    manager.ensure_profile(Tool::Claude, "one").unwrap();
    manager.ensure_profile(Tool::Codex, "two").unwrap();

    let rows = manager.status_rows(Some(Tool::Codex)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].profile.tool, Tool::Codex);
    assert_eq!(
        codex.probe_count.load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn empty_registry_yields_empty_rows() {
    let root = TempDir::new().unwrap();
    let (manager, _claude, _codex) = fanout_manager(&root);
    let rows = manager.status_rows(None).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn unloadable_registry_fails_the_aggregate_call() {
    let root = TempDir::new().unwrap();
    let (manager, _claude, _codex) = fanout_manager(&root);
    std::fs::write(root.path().join("state.json"), "{bad").unwrap();
    assert!(manager.status_rows(None).await.is_err());
}
