//! One mouse: available recording dates and the selected ones.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, StroopmouseError};
use crate::repository::RawRepository;
use crate::store::HierarchicalStore;

use super::Ctx;
use super::date::{Date, DateEditor};

/// Record attribute naming the task protocol.
pub const PROTOCOL_ATTR: &str = "protocol_name";

/// The protocol run on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateProtocol {
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

/// A mouse in a dataset.
#[derive(Debug, Clone)]
pub struct Mouse {
    id: String,
    available_dates: Vec<String>,
    dates: Vec<Date>,
}

impl Mouse {
    /// Build the entity from the repository listing, with no dates selected.
    pub(crate) fn discover(repo: &dyn RawRepository, id: &str) -> Result<Self> {
        Ok(Self {
            id: id.to_string(),
            available_dates: repo.dates(id)?,
            dates: Vec::new(),
        })
    }

    /// Rebuild a stored mouse and its selected dates.
    ///
    /// Listings the repository can no longer serve load as empty, so a saved
    /// selection always opens and can still be removed.
    pub(crate) fn restore(
        store: &dyn HierarchicalStore,
        repo: &dyn RawRepository,
        id: &str,
    ) -> Self {
        let available_dates = repo.dates(id).unwrap_or_else(|e| {
            warn!(mouse = id, error = %e, "raw dates unavailable for stored mouse");
            Vec::new()
        });
        let dates = store
            .list_groups(id)
            .iter()
            .map(|date| Date::restore(store, repo, id, date))
            .collect();

        Self {
            id: id.to_string(),
            available_dates,
            dates,
        }
    }

    /// Mouse ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Dates recorded on disk, sorted.
    ///
    /// Each call starts a fresh pass over the same finite list.
    pub fn list_available_dates(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.available_dates.iter().map(|d| d.as_str())
    }

    /// Whether a date was recorded on disk.
    pub fn is_available(&self, date: &str) -> bool {
        self.available_dates.iter().any(|d| d == date)
    }

    /// Selected dates, in selection order.
    pub fn selected_dates(&self) -> Vec<&str> {
        self.dates.iter().map(|d| d.date()).collect()
    }

    /// Selected date entities.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// One selected date.
    pub fn date(&self, date: &str) -> Option<&Date> {
        self.dates.iter().find(|d| d.date() == date)
    }

    /// Number of selected blocks over every selected date.
    pub fn block_count(&self) -> usize {
        self.dates.iter().map(|d| d.selected_blocks().len()).sum()
    }

    /// Available dates from `start` to `end`, inclusive, in ascending order.
    ///
    /// Both endpoints must be available dates; an inverted range is empty.
    pub fn available_range(&self, start: &str, end: &str) -> Result<Vec<String>> {
        let position = |date: &str| {
            self.available_dates
                .iter()
                .position(|d| d == date)
                .ok_or_else(|| StroopmouseError::DateNotFound {
                    mouse: self.id.clone(),
                    date: date.to_string(),
                })
        };
        let first = position(start)?;
        let last = position(end)?;

        Ok(self
            .available_dates
            .get(first..=last)
            .map(|dates| dates.to_vec())
            .unwrap_or_default())
    }

    /// The protocol of the last block of every available date.
    pub fn list_protocols(&self, repo: &dyn RawRepository) -> Result<Vec<DateProtocol>> {
        let mut protocols = Vec::with_capacity(self.available_dates.len());

        for date in &self.available_dates {
            let blocks = repo.blocks(&self.id, date)?;
            let protocol = match blocks.last() {
                Some(last) => repo
                    .open_block(&self.id, date, last)?
                    .attribute("", PROTOCOL_ATTR)
                    .map(|p| p.to_string()),
                None => None,
            };
            protocols.push(DateProtocol {
                date: date.clone(),
                protocol,
            });
        }

        Ok(protocols)
    }

    /// Drop a selected date from memory and the store, without logging.
    fn discard_date(&mut self, store: &mut dyn HierarchicalStore, date: &str) -> Result<bool> {
        let Some(index) = self.dates.iter().position(|d| d.date() == date) else {
            return Ok(false);
        };

        store.delete_subtree(&self.dates[index].store_path())?;
        self.dates.remove(index);
        Ok(true)
    }
}

/// Mutable access to a selected mouse.
pub struct MouseEditor<'a> {
    pub(crate) mouse: &'a mut Mouse,
    pub(crate) ctx: Ctx<'a>,
}

impl MouseEditor<'_> {
    /// The mouse being edited.
    pub fn mouse(&self) -> &Mouse {
        self.mouse
    }

    /// Select a date, discarding any earlier selection for it first.
    ///
    /// The date is re-added with no blocks selected, so adding the same date
    /// twice never unions block selections.
    pub fn add_date(&mut self, date: &str) -> Result<DateEditor<'_>> {
        if !self.mouse.is_available(date) {
            return Err(StroopmouseError::UnknownDate {
                mouse: self.mouse.id.clone(),
                date: date.to_string(),
            });
        }

        let entity = Date::discover(self.ctx.repo, &self.mouse.id, date)?;

        self.mouse.discard_date(&mut *self.ctx.store, date)?;
        self.ctx.store.require_group(&entity.store_path())?;
        self.mouse.dates.push(entity);
        info!(mouse = %self.mouse.id, date, "selected date");

        self.ctx.log(&format!("Added {}", date))?;

        let index = self.mouse.dates.len() - 1;
        Ok(DateEditor {
            date: &mut self.mouse.dates[index],
            ctx: self.ctx.reborrow(),
        })
    }

    /// Remove a selected date and its blocks. Returns `false` if the date was
    /// not selected.
    pub fn remove_date(&mut self, date: &str) -> Result<bool> {
        if !self.mouse.discard_date(&mut *self.ctx.store, date)? {
            return Ok(false);
        }

        info!(mouse = %self.mouse.id, date, "removed date");
        self.ctx.log(&format!("Removed {}", date))?;
        Ok(true)
    }

    /// Select every available date from `start` to `end`, inclusive.
    ///
    /// Both endpoints must be available dates. Returns the dates added, in
    /// ascending order; an inverted range adds nothing.
    pub fn date_range(&mut self, start: &str, end: &str) -> Result<Vec<String>> {
        let range = self.mouse.available_range(start, end)?;
        for date in &range {
            self.add_date(date)?;
        }

        Ok(range)
    }

    /// Edit one selected date.
    pub fn date_mut(&mut self, date: &str) -> Option<DateEditor<'_>> {
        let date = self.mouse.dates.iter_mut().find(|d| d.date() == date)?;
        Some(DateEditor {
            date,
            ctx: self.ctx.reborrow(),
        })
    }
}
