//! `doctor` is read-only: it reports structural problems without fixing them.

use std::fs;

use authmux_core::core::manager::Manager;
use authmux_core::storage::state::Tool;
use tempfile::TempDir;

#[test]
fn doctor_reports_counts_and_covers_every_tool() {
    let root = TempDir::new().unwrap();
    let manager = Manager::new(root.path()).unwrap();
    manager.ensure_profile(Tool::Claude, "work").unwrap();
    manager.ensure_profile(Tool::Codex, "work").unwrap();

    let report = manager.doctor().unwrap();
    assert_eq!(report.root_dir, root.path());
    assert_eq!(report.profiles_total, 2);
    assert_eq!(report.tool_binaries.len(), Tool::ALL.len());
    assert!(report.missing_dirs.is_empty());
    assert!(report.bad_defaults.is_empty());
}

#[test]
fn doctor_flags_missing_profile_directories() {
    let root = TempDir::new().unwrap();
    let manager = Manager::new(root.path()).unwrap();
    let (profile, _) = manager.ensure_profile(Tool::Claude, "gone").unwrap();
    fs::remove_dir_all(&profile.dir).unwrap();

    let report = manager.doctor().unwrap();
    assert_eq!(report.missing_dirs.len(), 1);
    assert!(report.missing_dirs[0].contains("claude/gone"));

    // Diagnostic only: the registry entry must still be there.
    assert!(manager.load().unwrap().find(Tool::Claude, "gone").is_some());
}

#[test]
fn doctor_flags_stale_and_empty_defaults() {
    let root = TempDir::new().unwrap();
    let manager = Manager::new(root.path()).unwrap();
    manager.ensure_profile(Tool::Claude, "real").unwrap();

    let mut state = manager.load().unwrap();
    state.defaults.insert(Tool::Claude, "ghost".to_string());
    state.defaults.insert(Tool::Codex, "   ".to_string());
    manager.save(&state).unwrap();

    let report = manager.doctor().unwrap();
    assert_eq!(report.bad_defaults.len(), 2);
    assert!(report
        .bad_defaults
        .iter()
        .any(|d| d.contains("claude default \"ghost\" not found")));
    assert!(report
        .bad_defaults
        .iter()
        .any(|d| d.contains("codex has empty default")));
}
