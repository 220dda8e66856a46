//! Directory-tree implementation of the raw repository.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::StroopConfig;
use crate::error::{Result, StroopmouseError};
use crate::store::{HierarchicalStore, JsonStore};

use super::{RawRepository, is_date_label};

/// Raw repository read from `<root>/<mouse>/<date>/<block file>`.
#[derive(Debug, Clone)]
pub struct FsRepository {
    root: PathBuf,
    ignored: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
}

impl FsRepository {
    /// Repository rooted at `root` with the default ignore list.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_config(&StroopConfig::new().with_data_repo(root))
    }

    /// Repository described by a configuration.
    pub fn from_config(config: &StroopConfig) -> Self {
        Self {
            root: config.data_repo.clone(),
            ignored: config.ignored_entries.clone(),
        }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of one block file.
    pub fn block_path(&self, mouse: &str, date: &str, block: &str) -> PathBuf {
        self.root.join(mouse).join(date).join(block)
    }

    fn list(&self, dir: &Path, kind: EntryKind) -> Result<Vec<String>> {
        let entries = fs::read_dir(dir).map_err(|e| StroopmouseError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StroopmouseError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();

            if self.ignored.iter().any(|ignored| *ignored == name) {
                continue;
            }

            let is_dir = entry.path().is_dir();
            let wanted = match kind {
                EntryKind::Dir => is_dir,
                EntryKind::File => !is_dir,
            };
            if wanted {
                names.push(name);
            } else {
                debug!(dir = %dir.display(), entry = %name, "skipping entry");
            }
        }

        names.sort();
        Ok(names)
    }
}

impl RawRepository for FsRepository {
    fn mice(&self) -> Result<Vec<String>> {
        self.list(&self.root, EntryKind::Dir)
    }

    fn dates(&self, mouse: &str) -> Result<Vec<String>> {
        let dir = self.root.join(mouse);
        let (dates, other): (Vec<String>, Vec<String>) = self
            .list(&dir, EntryKind::Dir)?
            .into_iter()
            .partition(|name| is_date_label(name));

        for name in other {
            warn!(mouse, entry = %name, "ignoring directory that is not a yyyy-mm-dd date");
        }

        Ok(dates)
    }

    fn blocks(&self, mouse: &str, date: &str) -> Result<Vec<String>> {
        self.list(&self.root.join(mouse).join(date), EntryKind::File)
    }

    fn open_block(
        &self,
        mouse: &str,
        date: &str,
        block: &str,
    ) -> Result<Box<dyn HierarchicalStore>> {
        let store = JsonStore::open_read(self.block_path(mouse, date, block))?;
        Ok(Box::new(store))
    }
}
