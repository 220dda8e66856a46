//! Repository locations and naming conventions.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StroopmouseError};

/// Directory entries that never name a mouse, date or block.
pub const DEFAULT_IGNORED_ENTRIES: &[&str] = &[".DS_Store", "test"];

/// Configuration shared by the builder and the reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StroopConfig {
    /// Root of the raw data repository (`<mouse>/<date>/<block file>`).
    pub data_repo: PathBuf,

    /// Directory holding curated dataset files.
    pub dataset_repo: PathBuf,

    /// Entry names skipped when listing the raw repository.
    pub ignored_entries: Vec<String>,

    /// Extension of dataset files, without the leading dot.
    pub dataset_extension: String,
}

impl Default for StroopConfig {
    fn default() -> Self {
        Self {
            data_repo: PathBuf::from("data"),
            dataset_repo: PathBuf::from("datasets"),
            ignored_entries: DEFAULT_IGNORED_ENTRIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            dataset_extension: "json".to_string(),
        }
    }
}

impl StroopConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file. Missing keys take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| StroopmouseError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            StroopmouseError::Config(format!(
                "Failed to parse config '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Set the raw data repository root.
    pub fn with_data_repo(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_repo = path.into();
        self
    }

    /// Set the dataset directory.
    pub fn with_dataset_repo(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_repo = path.into();
        self
    }

    /// Replace the ignored entry names.
    pub fn with_ignored_entries(mut self, entries: Vec<String>) -> Self {
        self.ignored_entries = entries;
        self
    }

    /// Path of the dataset file called `name`.
    pub fn dataset_path(&self, name: &str) -> PathBuf {
        self.dataset_repo
            .join(format!("{}.{}", name, self.dataset_extension))
    }

    /// Names of the datasets present in the dataset directory, sorted.
    pub fn list_datasets(&self) -> Result<Vec<String>> {
        let suffix = format!(".{}", self.dataset_extension);
        let entries = std::fs::read_dir(&self.dataset_repo).map_err(|e| StroopmouseError::Io {
            path: self.dataset_repo.clone(),
            source: e,
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                name.strip_suffix(&suffix).map(|stem| stem.to_string())
            })
            .collect();
        names.sort();

        Ok(names)
    }

    /// Whether a directory entry should be skipped.
    pub fn is_ignored(&self, entry: &str) -> bool {
        self.ignored_entries.iter().any(|ignored| ignored == entry)
    }
}
