//! Hierarchical store: named groups, attributes and array leaves.
//!
//! Datasets and raw block records are both hierarchical documents. The
//! curation model only talks to them through [`HierarchicalStore`], so the
//! physical encoding stays behind this module.
//!
//! Paths are `/`-separated group names; the empty path is the root.
//!
//! ```text
//! <root>
//! ├── Activity log          attrs: "2023-01-02 10:00:00 (000)" → "Added mouse 101"
//! └── 101
//!     └── 2023-01-02
//!         └── blocks        ["1", "3"]
//! ```
//!
//! A store handle is owned by exactly one session. Opening the same file for
//! append from two sessions at once is not supported.

mod json;
mod memory;
mod tree;
mod value;

use indexmap::IndexMap;

use crate::error::Result;

pub use json::JsonStore;
pub use memory::MemoryStore;
pub use tree::Group;
pub use value::{ArrayData, AttrValue};

/// How a store was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Reads only; every write fails.
    ReadOnly,
    /// Reads and writes; the backing file is created if missing.
    Append,
}

impl StoreMode {
    /// Whether writes are allowed.
    pub fn is_writable(&self) -> bool {
        matches!(self, StoreMode::Append)
    }
}

/// The operations the curation model needs from a persistent tree.
///
/// Every mutating call has completed its write when it returns.
pub trait HierarchicalStore {
    /// The mode this handle was opened in.
    fn mode(&self) -> StoreMode;

    /// Names of the child groups of `path`, in insertion order. Empty if the
    /// group does not exist.
    fn list_groups(&self, path: &str) -> Vec<String>;

    /// Whether a group exists at `path`.
    fn contains_group(&self, path: &str) -> bool;

    /// Create the group at `path` (and its parents) if missing.
    fn require_group(&mut self, path: &str) -> Result<()>;

    /// Delete the group or leaf at `path` with everything below it.
    /// Returns whether anything was deleted.
    fn delete_subtree(&mut self, path: &str) -> Result<bool>;

    /// Read one attribute of the group at `path`.
    fn attribute(&self, path: &str, name: &str) -> Option<AttrValue>;

    /// All attributes of the group at `path`, in insertion order.
    fn attributes(&self, path: &str) -> IndexMap<String, AttrValue>;

    /// Set one attribute of the group at `path`, creating the group if needed.
    fn set_attribute(&mut self, path: &str, name: &str, value: AttrValue) -> Result<()>;

    /// Read the array leaf at `path`.
    fn array(&self, path: &str) -> Option<ArrayData>;

    /// Names of the array leaves directly inside the group at `path`.
    fn list_arrays(&self, path: &str) -> Vec<String>;

    /// Write the array leaf at `path`, replacing any previous value.
    fn set_array(&mut self, path: &str, values: ArrayData) -> Result<()>;

    /// Make every completed write durable.
    fn flush(&mut self) -> Result<()>;
}
