//! Store held entirely in memory.

use indexmap::IndexMap;

use crate::error::{Result, StroopmouseError};

use super::tree::Group;
use super::value::{ArrayData, AttrValue};
use super::{HierarchicalStore, StoreMode};

/// A [`HierarchicalStore`] over an in-memory [`Group`] tree.
///
/// Also the working copy behind [`super::JsonStore`]. A write budget can be
/// set to make writes fail after a number of successes.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    root: Group,
    mode: StoreMode,
    write_budget: Option<usize>,
}

impl MemoryStore {
    /// Create an empty, writable store.
    pub fn new() -> Self {
        Self::from_root(Group::new(), StoreMode::Append)
    }

    /// Wrap an existing tree.
    pub fn from_root(root: Group, mode: StoreMode) -> Self {
        Self {
            root,
            mode,
            write_budget: None,
        }
    }

    /// Allow only `writes` more successful writes; later writes fail with
    /// `StoreWriteFailed`.
    pub fn with_write_budget(mut self, writes: usize) -> Self {
        self.write_budget = Some(writes);
        self
    }

    /// The whole tree.
    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Switch the handle to read-only.
    pub fn into_read_only(mut self) -> Self {
        self.mode = StoreMode::ReadOnly;
        self
    }

    fn begin_write(&mut self, what: &str, path: &str) -> Result<&mut Group> {
        if !self.mode.is_writable() {
            return Err(StroopmouseError::StoreWriteFailed(format!(
                "cannot {} '{}': store is read-only",
                what, path
            )));
        }

        if let Some(budget) = self.write_budget.as_mut() {
            if *budget == 0 {
                return Err(StroopmouseError::StoreWriteFailed(format!(
                    "cannot {} '{}': write budget exhausted",
                    what, path
                )));
            }
            *budget -= 1;
        }

        Ok(&mut self.root)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchicalStore for MemoryStore {
    fn mode(&self) -> StoreMode {
        self.mode
    }

    fn list_groups(&self, path: &str) -> Vec<String> {
        self.root
            .group(path)
            .map(|g| g.groups.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn contains_group(&self, path: &str) -> bool {
        self.root.group(path).is_some()
    }

    fn require_group(&mut self, path: &str) -> Result<()> {
        if self.contains_group(path) {
            return Ok(());
        }
        self.begin_write("create group", path)?.require_group(path)?;
        Ok(())
    }

    fn delete_subtree(&mut self, path: &str) -> Result<bool> {
        let exists = self.root.group(path).is_some() || self.root.array(path).is_some();
        if !exists {
            return Ok(false);
        }
        Ok(self.begin_write("delete", path)?.remove(path))
    }

    fn attribute(&self, path: &str, name: &str) -> Option<AttrValue> {
        self.root.group(path)?.attrs.get(name).cloned()
    }

    fn attributes(&self, path: &str) -> IndexMap<String, AttrValue> {
        self.root
            .group(path)
            .map(|g| g.attrs.clone())
            .unwrap_or_default()
    }

    fn set_attribute(&mut self, path: &str, name: &str, value: AttrValue) -> Result<()> {
        self.begin_write("set attribute on", path)?
            .require_group(path)?
            .attrs
            .insert(name.to_string(), value);
        Ok(())
    }

    fn array(&self, path: &str) -> Option<ArrayData> {
        self.root.array(path).cloned()
    }

    fn list_arrays(&self, path: &str) -> Vec<String> {
        self.root
            .group(path)
            .map(|g| g.arrays.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn set_array(&mut self, path: &str, values: ArrayData) -> Result<()> {
        self.begin_write("write array", path)?.set_array(path, values)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
