//! Workspace management and the file-backed collaborators

use crate::dataset::Dataset;
use crate::error::{ArkdataError, Result};
use crate::history::DEFAULT_MAX_HISTORY;
use crate::progress::{ProgressEvent, ProgressSink};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Loads and saves the live dataset
pub trait DatasetStore {
    fn load(&self) -> Result<Dataset>;
    fn save(&self, dataset: &Dataset) -> Result<()>;
}

/// Writes opportunistic copies of the dataset
pub trait BackupStore {
    /// Returns an identifier for the backup that was written
    fn create_backup(&self, dataset: &Dataset) -> Result<String>;
}

/// Produces a candidate payload for comparison
pub trait CandidateSource {
    fn fetch(&mut self, progress: &mut dyn ProgressSink) -> Result<Value>;
}

const DATA_FILE: &str = "ArkData.json";
const CONFIG_FILE: &str = "config.json";
const BACKUP_PREFIX: &str = "arkdata_backup_";

/// Workspace configuration stored in `config.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_format_version")]
    pub format_version: String,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    /// Snapshots kept in the undo history
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    /// Write backups as zstd-compressed JSON
    #[serde(default)]
    pub compress_backups: bool,
    #[serde(default = "default_true")]
    pub backup_before_apply: bool,
}

fn default_format_version() -> String {
    crate::FORMAT_VERSION.to_string()
}

fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

fn default_true() -> bool {
    true
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            format_version: default_format_version(),
            created: Utc::now(),
            max_history: DEFAULT_MAX_HISTORY,
            compress_backups: false,
            backup_before_apply: true,
        }
    }
}

/// A backup file found in the workspace
#[derive(Debug, Clone, Serialize)]
pub struct BackupInfo {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub compressed: bool,
}

/// Manages the .arkdata workspace directory
#[derive(Debug, Clone)]
pub struct ArkWorkspace {
    /// Project root directory (where .arkdata/ lives)
    pub root: PathBuf,
    /// .arkdata/ directory path
    pub arkdata_dir: PathBuf,
    /// .arkdata/backups/ directory path
    pub backups_dir: PathBuf,
}

impl ArkWorkspace {
    /// Find existing workspace or create a new one
    pub fn find_or_create(start_dir: Option<&Path>) -> Result<Self> {
        let current_dir = std::env::current_dir()?;
        let start = start_dir.unwrap_or(&current_dir);

        if let Some(workspace) = Self::find_existing(start)? {
            return Ok(workspace);
        }

        Self::create_new(start.to_path_buf())
    }

    /// Find existing .arkdata workspace by walking up directory tree
    fn find_existing(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir;

        loop {
            let arkdata_dir = current.join(".arkdata");
            if arkdata_dir.is_dir() {
                return Ok(Some(Self::from_root(current.to_path_buf())));
            }

            // A git root is as far up as we look
            if current.join(".git").exists() {
                break;
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Ok(None)
    }

    /// Create a new workspace in the specified root directory
    pub fn create_new(root: PathBuf) -> Result<Self> {
        let workspace = Self::from_root(root);

        fs::create_dir_all(&workspace.arkdata_dir)?;
        fs::create_dir_all(&workspace.backups_dir)?;
        workspace.create_config_with_force(false)?;
        workspace.ensure_gitignore()?;

        log::info!("Created arkdata workspace at: {}", workspace.root.display());

        Ok(workspace)
    }

    /// Create workspace from root directory path
    pub fn from_root(root: PathBuf) -> Self {
        let arkdata_dir = root.join(".arkdata");
        let backups_dir = arkdata_dir.join("backups");

        Self {
            root,
            arkdata_dir,
            backups_dir,
        }
    }

    pub fn data_path(&self) -> PathBuf {
        self.arkdata_dir.join(DATA_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.arkdata_dir.join(CONFIG_FILE)
    }

    /// Create configuration file with optional force overwrite
    pub fn create_config_with_force(&self, force: bool) -> Result<()> {
        let config_path = self.config_path();

        if config_path.exists() && !force {
            return Ok(());
        }

        let config = WorkspaceConfig::default();
        fs::write(config_path, serde_json::to_string_pretty(&config)?)?;
        Ok(())
    }

    /// Load configuration, falling back to defaults when there is no file
    pub fn load_config(&self) -> Result<WorkspaceConfig> {
        let config_path = self.config_path();
        if !config_path.exists() {
            return Ok(WorkspaceConfig::default());
        }

        let content = fs::read_to_string(&config_path)?;
        serde_json::from_str(&content).map_err(|e| {
            ArkdataError::config(format!("{}: {}", config_path.display(), e))
        })
    }

    /// Ensure .gitignore excludes backups
    pub fn ensure_gitignore(&self) -> Result<()> {
        let gitignore_path = self.root.join(".gitignore");
        let arkdata_ignore = "# Ignore arkdata backups\n.arkdata/backups/\n";

        if gitignore_path.exists() {
            let content = fs::read_to_string(&gitignore_path)?;
            if !content.contains(".arkdata/backups/") {
                let new_content = if content.ends_with('\n') {
                    format!("{}\n{}", content, arkdata_ignore)
                } else {
                    format!("{}\n\n{}", content, arkdata_ignore)
                };
                fs::write(gitignore_path, new_content)?;
                log::info!("Updated .gitignore with arkdata entries");
            }
        } else {
            fs::write(gitignore_path, arkdata_ignore)?;
            log::info!("Created .gitignore with arkdata entries");
        }

        Ok(())
    }

    /// List backups, newest first
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        let mut backups = Vec::new();

        if !self.backups_dir.exists() {
            return Ok(backups);
        }

        for entry in WalkDir::new(&self.backups_dir).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with(BACKUP_PREFIX) {
                continue;
            }
            backups.push(BackupInfo {
                compressed: name.ends_with(".zst"),
                size: entry.metadata()?.len(),
                path: entry.path().to_path_buf(),
                name,
            });
        }

        // Timestamped names sort chronologically
        backups.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(backups)
    }

    /// Pick a backup file name that does not exist yet
    fn next_backup_path(&self, compressed: bool) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let extension = if compressed { "json.zst" } else { "json" };

        let mut candidate = self
            .backups_dir
            .join(format!("{}{}.{}", BACKUP_PREFIX, stamp, extension));
        let mut counter = 1;
        while candidate.exists() {
            candidate = self
                .backups_dir
                .join(format!("{}{}_{}.{}", BACKUP_PREFIX, stamp, counter, extension));
            counter += 1;
        }
        candidate
    }
}

impl DatasetStore for ArkWorkspace {
    fn load(&self) -> Result<Dataset> {
        let path = self.data_path();
        if !path.exists() {
            log::info!("No data file at {}, starting with an empty dataset", path.display());
            return Ok(Dataset::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            ArkdataError::persistence(format!("Failed to read data file: {}", e))
        })?;
        let payload: Value = serde_json::from_str(&content).map_err(|e| {
            ArkdataError::persistence(format!("Failed to parse JSON: {}", e))
        })?;

        Dataset::from_value(payload).map_err(|e| {
            ArkdataError::persistence(format!("Data file {} is malformed: {}", path.display(), e))
        })
    }

    fn save(&self, dataset: &Dataset) -> Result<()> {
        let path = self.data_path();
        fs::create_dir_all(&self.arkdata_dir).map_err(|e| {
            ArkdataError::persistence(format!("Failed to create workspace directory: {}", e))
        })?;

        let json = serde_json::to_string_pretty(dataset).map_err(|e| {
            ArkdataError::persistence(format!("Failed to serialize data: {}", e))
        })?;

        // Write next to the target and rename so a failed write never
        // truncates the existing file
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .and_then(|_| fs::rename(&tmp_path, &path))
            .map_err(|e| ArkdataError::persistence(format!("Failed to write data file: {}", e)))?;

        log::info!("Saved dataset version {} to {}", dataset.version, path.display());
        Ok(())
    }
}

impl BackupStore for ArkWorkspace {
    fn create_backup(&self, dataset: &Dataset) -> Result<String> {
        let config = self.load_config()?;
        fs::create_dir_all(&self.backups_dir).map_err(|e| {
            ArkdataError::persistence(format!("Failed to create backups directory: {}", e))
        })?;

        let json = serde_json::to_vec_pretty(dataset).map_err(|e| {
            ArkdataError::persistence(format!("Failed to serialize data: {}", e))
        })?;
        let bytes = if config.compress_backups {
            zstd::encode_all(json.as_slice(), 3).map_err(|e| {
                ArkdataError::persistence(format!("Failed to compress backup: {}", e))
            })?
        } else {
            json
        };

        let path = self.next_backup_path(config.compress_backups);
        fs::write(&path, bytes)
            .map_err(|e| ArkdataError::persistence(format!("Failed to write backup file: {}", e)))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        log::info!("Created backup {}", name);
        Ok(name)
    }
}

/// Reads a candidate dataset from a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CandidateSource for JsonFileSource {
    fn fetch(&mut self, progress: &mut dyn ProgressSink) -> Result<Value> {
        progress.report(ProgressEvent::new(
            "reading",
            0.0,
            format!("Reading {}", self.path.display()),
        ));
        let content = fs::read_to_string(&self.path).map_err(|e| {
            ArkdataError::fetch(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        progress.report(ProgressEvent::new("parsing", 50.0, "Parsing candidate data"));
        let payload: Value = serde_json::from_str(&content)
            .map_err(|e| ArkdataError::validation(format!("Invalid JSON payload: {}", e)))?;

        progress.report(ProgressEvent::new("complete", 100.0, "Candidate data loaded"));
        Ok(payload)
    }
}
