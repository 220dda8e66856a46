//! In-memory group tree backing every store implementation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StroopmouseError};

use super::value::{ArrayData, AttrValue};

/// A named group: attributes, child groups and array leaves, each kept in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: IndexMap<String, AttrValue>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub groups: IndexMap<String, Group>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub arrays: IndexMap<String, ArrayData>,
}

/// Split a `/`-separated store path into its non-empty segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Split a path into its parent path and final name.
pub fn split_leaf(path: &str) -> Option<(String, &str)> {
    let parts: Vec<&str> = segments(path).collect();
    let (name, parent) = parts.split_last()?;
    Some((parent.join("/"), *name))
}

impl Group {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a descendant group. The empty path is this group.
    pub fn group(&self, path: &str) -> Option<&Group> {
        segments(path).try_fold(self, |group, name| group.groups.get(name))
    }

    /// Find a descendant group mutably.
    pub fn group_mut(&mut self, path: &str) -> Option<&mut Group> {
        segments(path).try_fold(self, |group, name| group.groups.get_mut(name))
    }

    /// Find or create a descendant group, creating intermediate groups.
    pub fn require_group(&mut self, path: &str) -> Result<&mut Group> {
        let mut group = self;
        for name in segments(path) {
            if group.arrays.contains_key(name) {
                return Err(StroopmouseError::StoreWriteFailed(format!(
                    "'{}' in '{}' is an array, not a group",
                    name, path
                )));
            }
            group = group.groups.entry(name.to_string()).or_default();
        }
        Ok(group)
    }

    /// Remove the group or array leaf at `path`. Returns whether anything was
    /// removed. Sibling order is preserved.
    pub fn remove(&mut self, path: &str) -> bool {
        let Some((parent, name)) = split_leaf(path) else {
            return false;
        };
        let Some(parent) = self.group_mut(&parent) else {
            return false;
        };

        parent.groups.shift_remove(name).is_some() || parent.arrays.shift_remove(name).is_some()
    }

    /// Read the array leaf at `path`.
    pub fn array(&self, path: &str) -> Option<&ArrayData> {
        let (parent, name) = split_leaf(path)?;
        self.group(&parent)?.arrays.get(name)
    }

    /// Write the array leaf at `path`, replacing any previous leaf.
    pub fn set_array(&mut self, path: &str, values: ArrayData) -> Result<()> {
        let (parent, name) = split_leaf(path).ok_or_else(|| {
            StroopmouseError::StoreWriteFailed("cannot write an array at the root".to_string())
        })?;
        let parent = self.require_group(&parent)?;

        if parent.groups.contains_key(name) {
            return Err(StroopmouseError::StoreWriteFailed(format!(
                "'{}' is a group, not an array",
                path
            )));
        }

        parent.arrays.insert(name.to_string(), values);
        Ok(())
    }

    /// Number of groups below this one, at any depth.
    pub fn descendant_count(&self) -> usize {
        self.groups
            .values()
            .map(|g| 1 + g.descendant_count())
            .sum()
    }
}
