//! One recording date of one mouse: available and selected blocks.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, StroopmouseError};
use crate::repository::{RawRepository, block_number};
use crate::store::{ArrayData, HierarchicalStore};

use super::Ctx;

/// Name of the array leaf holding the selected block numbers.
pub const BLOCKS_LEAF: &str = "blocks";

/// Record attribute carrying the experimenter's quality mark.
pub const QUALITY_ATTR: &str = "experimental_quality";

/// Record attribute carrying the experimenter's note on a flagged block.
pub const QUALITY_MESSAGE_ATTR: &str = "experimental_message";

/// Result of inspecting a block's quality mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityFlag {
    /// Block file name.
    pub block: String,

    /// Whether the experimenter flagged the block (`'n'` in the quality mark).
    pub requires_confirmation: bool,

    /// The experimenter's message for a flagged block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Blocks recorded for a mouse on one date, and the subset selected.
#[derive(Debug, Clone)]
pub struct Date {
    mouse: String,
    date: String,
    available: Vec<String>,
    available_numbers: Vec<char>,
    selected: Vec<char>,
}

impl Date {
    /// Rebuild a stored date with its selected blocks.
    ///
    /// A date the repository can no longer list keeps its selection and has
    /// no available blocks.
    pub(crate) fn restore(
        store: &dyn HierarchicalStore,
        repo: &dyn RawRepository,
        mouse: &str,
        date: &str,
    ) -> Self {
        let mut entity = Self::discover(repo, mouse, date).unwrap_or_else(|e| {
            warn!(mouse, date, error = %e, "raw blocks unavailable for stored date");
            Self {
                mouse: mouse.to_string(),
                date: date.to_string(),
                available: Vec::new(),
                available_numbers: Vec::new(),
                selected: Vec::new(),
            }
        });
        entity.selected = store
            .array(&entity.blocks_path())
            .map(|blocks| {
                blocks
                    .to_text()
                    .iter()
                    .filter_map(|b| b.chars().next())
                    .collect()
            })
            .unwrap_or_default();
        entity
    }

    /// Build the entity with nothing selected.
    pub(crate) fn discover(repo: &dyn RawRepository, mouse: &str, date: &str) -> Result<Self> {
        let available = repo.blocks(mouse, date)?;
        let available_numbers = available
            .iter()
            .map(|name| block_number(name))
            .collect::<Result<Vec<char>>>()?;

        Ok(Self {
            mouse: mouse.to_string(),
            date: date.to_string(),
            available,
            available_numbers,
            selected: Vec::new(),
        })
    }

    /// The date, `yyyy-mm-dd`.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Owning mouse ID.
    pub fn mouse(&self) -> &str {
        &self.mouse
    }

    /// Block file names on disk, in discovery order.
    pub fn available_blocks(&self) -> &[String] {
        &self.available
    }

    /// Block numbers on disk, parallel to [`Self::available_blocks`].
    pub fn available_block_numbers(&self) -> &[char] {
        &self.available_numbers
    }

    /// Selected block numbers, in selection order.
    pub fn selected_blocks(&self) -> &[char] {
        &self.selected
    }

    /// File name of an available block number.
    pub fn block_file(&self, number: char) -> Option<&str> {
        self.available_numbers
            .iter()
            .position(|n| *n == number)
            .map(|i| self.available[i].as_str())
    }

    /// Store path of this date's group.
    pub fn store_path(&self) -> String {
        format!("{}/{}", self.mouse, self.date)
    }

    fn blocks_path(&self) -> String {
        format!("{}/{}", self.store_path(), BLOCKS_LEAF)
    }

    fn unknown_block(&self, block: &str) -> StroopmouseError {
        StroopmouseError::UnknownBlock {
            mouse: self.mouse.clone(),
            date: self.date.clone(),
            block: block.to_string(),
        }
    }

    /// Inspect a block's quality mark.
    ///
    /// This only reports the flag; deciding whether to keep a flagged block is
    /// up to the caller. A record without a quality mark is not flagged.
    pub fn check_quality_flag(&self, repo: &dyn RawRepository, block: &str) -> Result<QualityFlag> {
        if !self.available.iter().any(|b| b == block) {
            return Err(self.unknown_block(block));
        }

        let record = repo.open_block(&self.mouse, &self.date, block)?;
        let flagged = record
            .attribute("", QUALITY_ATTR)
            .and_then(|q| q.as_str().map(|q| q.contains('n')))
            .unwrap_or(false);

        let message = if flagged {
            record
                .attribute("", QUALITY_MESSAGE_ATTR)
                .map(|m| m.to_string())
        } else {
            None
        };

        if flagged {
            warn!(block, message = message.as_deref().unwrap_or(""), "experimenter flagged block");
        }

        Ok(QualityFlag {
            block: block.to_string(),
            requires_confirmation: flagged,
            message,
        })
    }
}

/// Mutable access to a selected date.
pub struct DateEditor<'a> {
    pub(crate) date: &'a mut Date,
    pub(crate) ctx: Ctx<'a>,
}

impl DateEditor<'_> {
    /// The date being edited.
    pub fn date(&self) -> &Date {
        self.date
    }

    /// Replace the selection with `blocks` (file names).
    ///
    /// The previous selection is discarded, not merged. Duplicates are dropped
    /// keeping the first occurrence. The block list is written before one log
    /// entry per block. Returns the selected block numbers.
    pub fn add_blocks<S: AsRef<str>>(&mut self, blocks: &[S]) -> Result<Vec<char>> {
        let unique: IndexSet<&str> = blocks.iter().map(|b| b.as_ref()).collect();

        let mut chosen: Vec<(char, &str)> = Vec::with_capacity(unique.len());
        for block in unique {
            if !self.date.available.iter().any(|b| b == block) {
                return Err(self.date.unknown_block(block));
            }
            let number = block_number(block)?;
            if chosen.iter().all(|(n, _)| *n != number) {
                chosen.push((number, block));
            }
        }

        let numbers: Vec<char> = chosen.iter().map(|(n, _)| *n).collect();
        let stored = numbers.iter().map(|n| n.to_string()).collect();
        self.ctx
            .store
            .set_array(&self.date.blocks_path(), ArrayData::Text(stored))?;
        self.date.selected = numbers.clone();

        info!(
            mouse = %self.date.mouse,
            date = %self.date.date,
            blocks = ?numbers,
            "selected blocks"
        );

        for (_, block) in &chosen {
            self.ctx.log(&format!("Added {}", block))?;
        }

        Ok(numbers)
    }

    /// Replace the selection with the blocks carrying these numbers.
    pub fn add_block_numbers(&mut self, numbers: &[char]) -> Result<Vec<char>> {
        let files = numbers
            .iter()
            .map(|n| {
                self.date
                    .block_file(*n)
                    .map(|f| f.to_string())
                    .ok_or_else(|| self.date.unknown_block(&n.to_string()))
            })
            .collect::<Result<Vec<String>>>()?;

        self.add_blocks(&files)
    }

    /// Inspect a block's quality mark.
    pub fn check_quality_flag(&self, block: &str) -> Result<QualityFlag> {
        self.date.check_quality_flag(self.ctx.repo, block)
    }
}
