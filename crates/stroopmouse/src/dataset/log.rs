//! Append-only activity log kept as attributes of the `Activity log` group.

use chrono::{Local, NaiveDateTime};
use indexmap::IndexMap;
use tracing::info;

use crate::error::Result;
use crate::store::{AttrValue, HierarchicalStore};

/// Name of the root group holding the log.
pub const ACTIVITY_LOG_GROUP: &str = "Activity log";

/// Timestamp format of log keys.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of log timestamps.
pub trait Clock {
    /// Current local time.
    fn now(&self) -> NaiveDateTime;
}

/// Wall-clock time in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// One parsed log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub key: String,
    pub message: String,
}

impl LogEntry {
    /// Timestamp and sequence number encoded in the key, if it is well formed.
    pub fn parse_key(&self) -> Option<(NaiveDateTime, u32)> {
        let (stamp, rest) = self.key.rsplit_once(" (")?;
        let sequence = rest.strip_suffix(')')?.parse().ok()?;
        let timestamp = NaiveDateTime::parse_from_str(stamp, LOG_TIMESTAMP_FORMAT).ok()?;
        Some((timestamp, sequence))
    }
}

/// The dataset's activity log.
///
/// Keys are `"<timestamp> (<seq>)"`, where `seq` is a zero-padded counter
/// that starts at 0 each time a dataset is opened and is never persisted.
/// Entries are only ever added.
pub struct ActivityLog {
    entries: IndexMap<String, String>,
    counter: u32,
    clock: Box<dyn Clock>,
}

impl ActivityLog {
    /// Read the existing entries of a store.
    pub(crate) fn load(store: &dyn HierarchicalStore) -> Self {
        let entries = store
            .attributes(ACTIVITY_LOG_GROUP)
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();

        Self {
            entries,
            counter: 0,
            clock: Box::new(SystemClock),
        }
    }

    pub(crate) fn set_clock(&mut self, clock: Box<dyn Clock>) {
        self.clock = clock;
    }

    /// Format a log key.
    pub fn key(timestamp: NaiveDateTime, sequence: u32) -> String {
        format!("{} ({:03})", timestamp.format(LOG_TIMESTAMP_FORMAT), sequence)
    }

    /// Persist one entry and return its key.
    ///
    /// A key already present (left by an earlier session within the same
    /// second) is skipped by advancing the counter.
    pub(crate) fn append(
        &mut self,
        store: &mut dyn HierarchicalStore,
        message: &str,
    ) -> Result<String> {
        let now = self.clock.now();
        let mut key = Self::key(now, self.counter);
        while self.entries.contains_key(&key) {
            self.counter += 1;
            key = Self::key(now, self.counter);
        }

        store.set_attribute(ACTIVITY_LOG_GROUP, &key, AttrValue::from(message))?;
        self.entries.insert(key.clone(), message.to_string());
        self.counter += 1;

        info!(key = %key, "{}", message);
        Ok(key)
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = LogEntry> + '_ {
        self.entries.iter().map(|(key, message)| LogEntry {
            key: key.clone(),
            message: message.clone(),
        })
    }

    /// Message stored under a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|s| s.as_str())
    }

    /// Number of entries, all sessions included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value the next entry's counter will start from.
    pub fn session_counter(&self) -> u32 {
        self.counter
    }
}

impl std::fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLog")
            .field("entries", &self.entries)
            .field("counter", &self.counter)
            .finish()
    }
}
