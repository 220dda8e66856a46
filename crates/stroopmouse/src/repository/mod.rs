//! Raw data repository: the on-disk tree of recorded experiments.
//!
//! ```text
//! repo/
//! └── 101/                               # mouse ID
//!     └── 2023-01-02/                    # yyyy-mm-dd
//!         ├── ms101_2023-01-02_block1.json
//!         └── ms101_2023-01-02_block2.json
//! ```
//!
//! Block files are records readable as a [`HierarchicalStore`]. The block
//! number is the 6th character from the end of the file name; this is a
//! contract with the acquisition software's naming scheme and breaks silently
//! if the extension length ever changes.

mod fs;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, StroopmouseError};
use crate::store::HierarchicalStore;

pub use fs::FsRepository;

/// Position of the block number, counted from the end of a block file name.
pub const BLOCK_NUMBER_OFFSET_FROM_END: usize = 6;

static DATE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// Source of available mice, dates and block records.
pub trait RawRepository {
    /// Mouse IDs, sorted.
    fn mice(&self) -> Result<Vec<String>>;

    /// Dates recorded for a mouse, sorted (chronological for `yyyy-mm-dd`).
    fn dates(&self, mouse: &str) -> Result<Vec<String>>;

    /// Block file names recorded for a mouse on a date, sorted by name.
    fn blocks(&self, mouse: &str, date: &str) -> Result<Vec<String>>;

    /// Open one block record for reading.
    fn open_block(&self, mouse: &str, date: &str, block: &str)
    -> Result<Box<dyn HierarchicalStore>>;
}

/// Extract the block number from a block file name.
///
/// ```
/// use stroopmouse::repository::block_number;
///
/// assert_eq!(block_number("ms101_2023-01-02_block3.json").unwrap(), '3');
/// ```
pub fn block_number(file_name: &str) -> Result<char> {
    file_name
        .chars()
        .rev()
        .nth(BLOCK_NUMBER_OFFSET_FROM_END - 1)
        .ok_or_else(|| StroopmouseError::MalformedBlockName(file_name.to_string()))
}

/// Whether a directory name looks like a `yyyy-mm-dd` date.
pub fn is_date_label(name: &str) -> bool {
    DATE_LABEL.is_match(name)
}
