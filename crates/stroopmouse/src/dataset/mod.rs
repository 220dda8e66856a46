//! Dataset builder: which mice, dates and blocks belong to a dataset file.
//!
//! The entity graph mirrors the persisted tree:
//!
//! ```text
//! Dataset ── Mouse ── Date ── blocks ["1", "3"]
//!    └── Activity log
//! ```
//!
//! Every add/remove updates the in-memory graph and the store together, then
//! appends to the activity log. The data write always precedes the log write,
//! so a log entry never describes a change that was not stored.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use stroopmouse::dataset::Dataset;
//! use stroopmouse::repository::FsRepository;
//! use stroopmouse::store::StoreMode;
//!
//! let repo = Arc::new(FsRepository::new("/data/mice"));
//! let mut dataset = Dataset::open("reversal.json", StoreMode::Append, repo).unwrap();
//!
//! dataset.add_mouse("101").unwrap();
//! let mut mouse = dataset.mouse_mut("101").unwrap();
//! mouse.date_range("2023-01-02", "2023-01-06").unwrap();
//! mouse.add_date("2023-01-09").unwrap().add_block_numbers(&['1', '2']).unwrap();
//! ```

mod date;
mod log;
mod mouse;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Result, StroopmouseError};
use crate::repository::RawRepository;
use crate::store::{HierarchicalStore, JsonStore, StoreMode};

pub use date::{
    BLOCKS_LEAF, Date, DateEditor, QUALITY_ATTR, QUALITY_MESSAGE_ATTR, QualityFlag,
};
pub use log::{
    ACTIVITY_LOG_GROUP, ActivityLog, Clock, FixedClock, LOG_TIMESTAMP_FORMAT, LogEntry,
    SystemClock,
};
pub use mouse::{DateProtocol, Mouse, MouseEditor, PROTOCOL_ATTR};

/// Borrowed pieces of a dataset that descendant editors write through.
pub(crate) struct Ctx<'a> {
    pub(crate) store: &'a mut dyn HierarchicalStore,
    pub(crate) log: &'a mut ActivityLog,
    pub(crate) repo: &'a dyn RawRepository,
}

impl Ctx<'_> {
    pub(crate) fn reborrow(&mut self) -> Ctx<'_> {
        Ctx {
            store: &mut *self.store,
            log: &mut *self.log,
            repo: self.repo,
        }
    }

    pub(crate) fn log(&mut self, message: &str) -> Result<String> {
        self.log.append(&mut *self.store, message)
    }
}

/// A curated dataset file opened for editing.
///
/// The store is owned for the lifetime of the handle. Only one handle may
/// have a dataset file open for append at a time.
pub struct Dataset {
    path: Option<PathBuf>,
    store: Box<dyn HierarchicalStore>,
    repo: Arc<dyn RawRepository>,
    log: ActivityLog,
    available_mice: Vec<String>,
    mice: Vec<Mouse>,
}

impl Dataset {
    /// Open a dataset file. In append mode a missing file is created.
    pub fn open(
        path: impl AsRef<Path>,
        mode: StoreMode,
        repo: Arc<dyn RawRepository>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let store = JsonStore::open(path, mode)?;
        info!(path = %path.display(), ?mode, "opened dataset");

        let mut dataset = Self::from_store(Box::new(store), repo)?;
        dataset.path = Some(path.to_path_buf());
        Ok(dataset)
    }

    /// Create a new dataset file. Fails if the file already exists.
    pub fn create(path: impl AsRef<Path>, repo: Arc<dyn RawRepository>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(StroopmouseError::StoreUnavailable {
                path: path.to_path_buf(),
                reason: "dataset already exists".to_string(),
            });
        }
        Self::open(path, StoreMode::Append, repo)
    }

    /// Build a dataset over an already opened store.
    pub fn from_store(
        mut store: Box<dyn HierarchicalStore>,
        repo: Arc<dyn RawRepository>,
    ) -> Result<Self> {
        if store.mode().is_writable() {
            store.require_group(ACTIVITY_LOG_GROUP)?;
        }

        let available_mice = match repo.mice() {
            Ok(mice) => mice,
            Err(e) if !store.mode().is_writable() => {
                warn!(error = %e, "raw repository unavailable; browsing stored selection only");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        let mice: Vec<Mouse> = store
            .list_groups("")
            .iter()
            .filter(|name| name.as_str() != ACTIVITY_LOG_GROUP)
            .map(|id| Mouse::restore(store.as_ref(), repo.as_ref(), id))
            .collect();
        let log = ActivityLog::load(store.as_ref());

        debug!(mice = mice.len(), log_entries = log.len(), "loaded dataset");

        Ok(Self {
            path: None,
            store,
            repo,
            log,
            available_mice,
            mice,
        })
    }

    /// Use another clock for log timestamps.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.log.set_clock(Box::new(clock));
        self
    }

    /// Path of the dataset file, when file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The underlying store.
    pub fn store(&self) -> &dyn HierarchicalStore {
        self.store.as_ref()
    }

    /// The raw repository.
    pub fn repository(&self) -> &dyn RawRepository {
        self.repo.as_ref()
    }

    /// The activity log.
    pub fn activity_log(&self) -> &ActivityLog {
        &self.log
    }

    /// Mice present in the raw repository.
    pub fn available_mice(&self) -> &[String] {
        &self.available_mice
    }

    /// Selected mice, in selection order.
    pub fn mice(&self) -> &[Mouse] {
        &self.mice
    }

    /// IDs of the selected mice.
    pub fn mouse_ids(&self) -> Vec<&str> {
        self.mice.iter().map(|m| m.id()).collect()
    }

    /// One selected mouse.
    pub fn mouse(&self, id: &str) -> Option<&Mouse> {
        self.mice.iter().find(|m| m.id() == id)
    }

    /// Append a message to the activity log.
    pub fn log_event(&mut self, message: &str) -> Result<String> {
        self.log.append(self.store.as_mut(), message)
    }

    /// Select a mouse. Returns `false` if it was already selected.
    pub fn add_mouse(&mut self, id: &str) -> Result<bool> {
        if self.mouse(id).is_some() {
            return Ok(false);
        }
        if !self.available_mice.iter().any(|m| m == id) {
            return Err(StroopmouseError::UnknownMouse(id.to_string()));
        }

        let mouse = Mouse::discover(self.repo.as_ref(), id)?;
        self.store.require_group(id)?;
        self.mice.push(mouse);
        info!(mouse = id, "selected mouse");

        self.log_event(&format!("Added mouse {}", id))?;
        Ok(true)
    }

    /// Remove a mouse with all its dates and blocks. Returns `false` if it was
    /// not selected.
    pub fn remove_mouse(&mut self, id: &str) -> Result<bool> {
        let Some(index) = self.mice.iter().position(|m| m.id() == id) else {
            return Ok(false);
        };

        self.store.delete_subtree(id)?;
        self.mice.remove(index);
        info!(mouse = id, "removed mouse");

        self.log_event(&format!("Removed mouse {}", id))?;
        Ok(true)
    }

    /// Edit one selected mouse.
    pub fn mouse_mut(&mut self, id: &str) -> Option<MouseEditor<'_>> {
        let mouse = self.mice.iter_mut().find(|m| m.id() == id)?;
        Some(MouseEditor {
            mouse,
            ctx: Ctx {
                store: self.store.as_mut(),
                log: &mut self.log,
                repo: self.repo.as_ref(),
            },
        })
    }

    /// Make every completed write durable.
    pub fn flush(&mut self) -> Result<()> {
        self.store.flush()
    }
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("path", &self.path)
            .field("mice", &self.mice)
            .field("log", &self.log)
            .finish()
    }
}
