//! File-backed store persisted as a pretty-printed JSON document.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Result, StroopmouseError};

use super::memory::MemoryStore;
use super::tree::Group;
use super::value::{ArrayData, AttrValue};
use super::{HierarchicalStore, StoreMode};

/// A [`HierarchicalStore`] backed by one JSON file.
///
/// Every mutating call rewrites the file through a temporary sibling and a
/// rename, so a completed call is durable and a failed one leaves both the
/// file and the in-memory tree as they were.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonStore {
    /// Open an existing file for reading.
    pub fn open_read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let root = read_tree(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            inner: MemoryStore::from_root(root, StoreMode::ReadOnly),
        })
    }

    /// Open a file for reading and writing, creating it (and its directory)
    /// when missing.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let root = read_tree(path)?;
            return Ok(Self {
                path: path.to_path_buf(),
                inner: MemoryStore::from_root(root, StoreMode::Append),
            });
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| StroopmouseError::StoreUnavailable {
                    path: path.to_path_buf(),
                    reason: format!("failed to create directory '{}': {}", parent.display(), e),
                })?;
            }
        }

        let store = Self {
            path: path.to_path_buf(),
            inner: MemoryStore::new(),
        };
        store.persist().map_err(|e| StroopmouseError::StoreUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), "created store");

        Ok(store)
    }

    /// Open in the given mode.
    pub fn open(path: impl AsRef<Path>, mode: StoreMode) -> Result<Self> {
        match mode {
            StoreMode::ReadOnly => Self::open_read(path),
            StoreMode::Append => Self::open_append(path),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole tree.
    pub fn root(&self) -> &Group {
        self.inner.root()
    }

    fn persist(&self) -> Result<()> {
        let tmp = temp_path(&self.path);
        let write_failed = |e: std::io::Error| {
            StroopmouseError::StoreWriteFailed(format!(
                "failed to write '{}': {}",
                self.path.display(),
                e
            ))
        };

        let file = File::create(&tmp).map_err(write_failed)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self.inner.root()).map_err(|e| {
            StroopmouseError::StoreWriteFailed(format!("failed to serialize store: {}", e))
        })?;
        writer.flush().map_err(write_failed)?;
        drop(writer);

        fs::rename(&tmp, &self.path).map_err(write_failed)?;
        Ok(())
    }

    /// Apply a write to the working tree and persist it. On a failed persist
    /// the working tree is restored.
    fn write_with<T>(&mut self, op: impl FnOnce(&mut MemoryStore) -> Result<T>) -> Result<T> {
        let snapshot = self.inner.clone();
        let out = op(&mut self.inner)?;

        if let Err(e) = self.persist() {
            self.inner = snapshot;
            return Err(e);
        }
        Ok(out)
    }
}

impl HierarchicalStore for JsonStore {
    fn mode(&self) -> StoreMode {
        self.inner.mode()
    }

    fn list_groups(&self, path: &str) -> Vec<String> {
        self.inner.list_groups(path)
    }

    fn contains_group(&self, path: &str) -> bool {
        self.inner.contains_group(path)
    }

    fn require_group(&mut self, path: &str) -> Result<()> {
        if self.inner.contains_group(path) {
            return Ok(());
        }
        debug!(store = %self.path.display(), path, "require group");
        self.write_with(|s| s.require_group(path))
    }

    fn delete_subtree(&mut self, path: &str) -> Result<bool> {
        if !self.inner.contains_group(path) && self.inner.array(path).is_none() {
            return Ok(false);
        }
        debug!(store = %self.path.display(), path, "delete subtree");
        self.write_with(|s| s.delete_subtree(path))
    }

    fn attribute(&self, path: &str, name: &str) -> Option<AttrValue> {
        self.inner.attribute(path, name)
    }

    fn attributes(&self, path: &str) -> IndexMap<String, AttrValue> {
        self.inner.attributes(path)
    }

    fn set_attribute(&mut self, path: &str, name: &str, value: AttrValue) -> Result<()> {
        debug!(store = %self.path.display(), path, name, "set attribute");
        self.write_with(|s| s.set_attribute(path, name, value))
    }

    fn array(&self, path: &str) -> Option<ArrayData> {
        self.inner.array(path)
    }

    fn list_arrays(&self, path: &str) -> Vec<String> {
        self.inner.list_arrays(path)
    }

    fn set_array(&mut self, path: &str, values: ArrayData) -> Result<()> {
        debug!(store = %self.path.display(), path, len = values.len(), "set array");
        self.write_with(|s| s.set_array(path, values))
    }

    fn flush(&mut self) -> Result<()> {
        if self.inner.mode().is_writable() {
            self.persist()?;
        }
        Ok(())
    }
}

fn read_tree(path: &Path) -> Result<Group> {
    let file = File::open(path).map_err(|e| StroopmouseError::StoreUnavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|e| StroopmouseError::StoreUnavailable {
        path: path.to_path_buf(),
        reason: format!("not a valid store document: {}", e),
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
