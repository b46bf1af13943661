//! Registry persistence: empty roots, round trips, corruption, atomicity.

use std::fs;
use std::path::PathBuf;

use authmux_core::core::errors::Error;
use authmux_core::storage::state::{Profile, RegistryState, Tool};
use authmux_core::storage::store::{profile_dir, RegistryStore};
use chrono::Utc;
use tempfile::TempDir;

fn sample_profile(root: &std::path::Path, tool: Tool, name: &str) -> Profile {
    Profile {
        tool,
        name: name.to_string(),
        dir: profile_dir(root, tool, name),
        created_at: Utc::now(),
    }
}

#[test]
fn fresh_root_loads_as_empty_registry() {
    let root = TempDir::new().unwrap();
    let store = RegistryStore::new(root.path()).unwrap();

    let state = store.load().unwrap();
    assert_eq!(state.version, 1);
    assert!(state.defaults.is_empty());
    assert!(state.profiles.is_empty());
}

#[test]
fn save_then_load_round_trips() {
    let root = TempDir::new().unwrap();
    let store = RegistryStore::new(root.path()).unwrap();

    let mut state = RegistryState::empty();
    state
        .defaults
        .insert(Tool::Claude, "personal".to_string());
    state.profiles = vec![
        sample_profile(root.path(), Tool::Codex, "work"),
        sample_profile(root.path(), Tool::Claude, "personal"),
    ];
    store.save(&state).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.default_for(Tool::Claude), Some("personal"));
    assert_eq!(loaded.profiles.len(), 2);
    // Load re-establishes (tool, name) order regardless of the saved order.
    assert_eq!(loaded.profiles[0].tool, Tool::Claude);
    assert_eq!(loaded.profiles[1].tool, Tool::Codex);
}

#[test]
fn saving_empty_round_trip_matches_fresh_state() {
    let root = TempDir::new().unwrap();
    let store = RegistryStore::new(root.path()).unwrap();
    let state = store.load().unwrap();
    store.save(&state).unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.version, 1);
    assert!(reloaded.defaults.is_empty());
    assert!(reloaded.profiles.is_empty());
}

#[test]
fn corrupt_registry_is_an_error_not_a_reset() {
    let root = TempDir::new().unwrap();
    let store = RegistryStore::new(root.path()).unwrap();
    fs::write(root.path().join("state.json"), "{not json").unwrap();

    let err = store.load().expect_err("corrupt file must fail");
    assert!(matches!(err, Error::CorruptState { .. }));
}

#[test]
fn zero_version_is_read_as_version_one() {
    let root = TempDir::new().unwrap();
    let store = RegistryStore::new(root.path()).unwrap();
    fs::write(
        root.path().join("state.json"),
        r#"{"version":0,"defaults":{},"profiles":[]}"#,
    )
    .unwrap();

    assert_eq!(store.load().unwrap().version, 1);
}

#[test]
fn missing_containers_are_defaulted_on_load() {
    let root = TempDir::new().unwrap();
    let store = RegistryStore::new(root.path()).unwrap();
    fs::write(root.path().join("state.json"), r#"{"version":1}"#).unwrap();

    let state = store.load().unwrap();
    assert!(state.defaults.is_empty());
    assert!(state.profiles.is_empty());
}

#[test]
fn save_writes_trailing_newline_and_leaves_no_temp_file() {
    let root = TempDir::new().unwrap();
    let store = RegistryStore::new(root.path()).unwrap();
    store.save(&RegistryState::empty()).unwrap();

    let raw = fs::read_to_string(root.path().join("state.json")).unwrap();
    assert!(raw.ends_with('\n'), "document should end with a newline");

    let leftovers: Vec<PathBuf> = fs::read_dir(root.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp file should have been renamed away");
}

#[test]
fn save_output_is_stable_across_identical_states() {
    let root = TempDir::new().unwrap();
    let store = RegistryStore::new(root.path()).unwrap();

    let mut state = RegistryState::empty();
    state.defaults.insert(Tool::Codex, "work".to_string());
    state.profiles = vec![sample_profile(root.path(), Tool::Codex, "work")];

    store.save(&state).unwrap();
    let first = fs::read_to_string(root.path().join("state.json")).unwrap();
    store.save(&state).unwrap();
    let second = fs::read_to_string(root.path().join("state.json")).unwrap();
    assert_eq!(first, second, "serialization must be deterministic");
}
