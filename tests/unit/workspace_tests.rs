//! Unit tests for workspace management functionality

use arkdata::dataset::{Category, Dataset, Entry};
use arkdata::progress::ProgressTracker;
use arkdata::workspace::{ArkWorkspace, BackupStore, CandidateSource, DatasetStore, JsonFileSource};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_workspace_creation() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = ArkWorkspace::create_new(temp_dir.path().to_path_buf()).unwrap();

    assert!(workspace.arkdata_dir.exists());
    assert!(workspace.backups_dir.exists());
    assert!(workspace.config_path().exists());

    let gitignore_content = fs::read_to_string(workspace.root.join(".gitignore")).unwrap();
    assert!(gitignore_content.contains(".arkdata/backups/"));
}

#[test]
fn test_workspace_from_root() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = ArkWorkspace::from_root(temp_dir.path().to_path_buf());

    assert_eq!(workspace.root, temp_dir.path());
    assert_eq!(workspace.arkdata_dir, temp_dir.path().join(".arkdata"));
    assert_eq!(workspace.backups_dir, temp_dir.path().join(".arkdata").join("backups"));
    assert_eq!(workspace.data_path(), temp_dir.path().join(".arkdata").join("ArkData.json"));
}

#[test]
fn test_workspace_find_existing() {
    let temp_dir = TempDir::new().unwrap();
    let parent_workspace = ArkWorkspace::create_new(temp_dir.path().to_path_buf()).unwrap();

    let sub_dir = temp_dir.path().join("subdir");
    fs::create_dir(&sub_dir).unwrap();

    let found_workspace = ArkWorkspace::find_or_create(Some(&sub_dir)).unwrap();
    assert_eq!(found_workspace.root, parent_workspace.root);
}

#[test]
fn test_gitignore_appended_once() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(".gitignore"), "target/").unwrap();

    let workspace = ArkWorkspace::create_new(temp_dir.path().to_path_buf()).unwrap();
    workspace.ensure_gitignore().unwrap();

    let content = fs::read_to_string(temp_dir.path().join(".gitignore")).unwrap();
    assert!(content.starts_with("target/"));
    assert_eq!(content.matches(".arkdata/backups/").count(), 1);
}

#[test]
fn test_config_missing_fields_use_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = ArkWorkspace::create_new(temp_dir.path().to_path_buf()).unwrap();
    fs::write(workspace.config_path(), r#"{"max_history": 5}"#).unwrap();

    let config = workspace.load_config().unwrap();
    assert_eq!(config.max_history, 5);
    assert!(!config.compress_backups);
    assert!(config.backup_before_apply);
}

#[test]
fn test_invalid_config_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = ArkWorkspace::create_new(temp_dir.path().to_path_buf()).unwrap();
    fs::write(workspace.config_path(), "not json").unwrap();

    assert!(workspace.load_config().is_err());
}

#[test]
fn test_malformed_data_file_is_persistence_error() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = ArkWorkspace::create_new(temp_dir.path().to_path_buf()).unwrap();
    fs::write(workspace.data_path(), r#"{"creatures": {}}"#).unwrap();

    let err = workspace.load().unwrap_err();
    assert!(matches!(err, arkdata::ArkdataError::Persistence { .. }));
}

#[test]
fn test_compressed_backup() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = ArkWorkspace::create_new(temp_dir.path().to_path_buf()).unwrap();
    fs::write(workspace.config_path(), r#"{"compress_backups": true}"#).unwrap();

    let mut dataset = Dataset::new();
    dataset
        .table_mut(Category::Beacons)
        .insert("red".into(), Entry::new().with_field("name", "Red Drop"));

    let name = workspace.create_backup(&dataset).unwrap();
    assert!(name.starts_with("arkdata_backup_"));
    assert!(name.ends_with(".json.zst"));

    let backups = workspace.list_backups().unwrap();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].compressed);

    let bytes = fs::read(&backups[0].path).unwrap();
    let decoded = zstd::decode_all(bytes.as_slice()).unwrap();
    let restored: Dataset = serde_json::from_slice(&decoded).unwrap();
    assert_eq!(restored.beacons, dataset.beacons);
}

#[test]
fn test_backups_listed_newest_first() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = ArkWorkspace::create_new(temp_dir.path().to_path_buf()).unwrap();

    for name in [
        "arkdata_backup_20240101_120000.json",
        "arkdata_backup_20240301_080000.json",
        "arkdata_backup_20240201_090000.json",
        "unrelated.json",
    ] {
        fs::write(workspace.backups_dir.join(name), "{}").unwrap();
    }

    let names: Vec<String> = workspace
        .list_backups()
        .unwrap()
        .into_iter()
        .map(|b| b.name)
        .collect();
    assert_eq!(
        names,
        vec![
            "arkdata_backup_20240301_080000.json",
            "arkdata_backup_20240201_090000.json",
            "arkdata_backup_20240101_120000.json",
        ]
    );
}

#[test]
fn test_json_file_source_reports_stages() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("candidate.json");
    fs::write(&path, r#"{"creatures": {}}"#).unwrap();

    let mut tracker = ProgressTracker::default();
    let payload = JsonFileSource::new(&path).fetch(&mut tracker).unwrap();
    assert!(payload.get("creatures").is_some());
    assert_eq!(tracker.latest().unwrap().stage, "complete");
    assert_eq!(tracker.latest().unwrap().progress, 100.0);
}

#[test]
fn test_json_file_source_errors() {
    let temp_dir = TempDir::new().unwrap();
    let mut tracker = ProgressTracker::default();

    let missing = JsonFileSource::new(temp_dir.path().join("nope.json")).fetch(&mut tracker);
    assert!(matches!(missing, Err(arkdata::ArkdataError::Fetch { .. })));

    let path = temp_dir.path().join("broken.json");
    fs::write(&path, "{ nope").unwrap();
    let broken = JsonFileSource::new(&path).fetch(&mut tracker);
    assert!(broken.unwrap_err().is_validation());
}
