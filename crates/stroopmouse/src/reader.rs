//! Dataset reader: extract measurements from a curated dataset.
//!
//! A dataset file only lists mice, dates and block numbers; the measurements
//! live in the raw block records. The reader opens one [`Experiment`] per
//! selected block and pulls the same field out of each.
//!
//! # Example
//!
//! ```no_run
//! use stroopmouse::reader::{DatasetReader, ExtractOptions};
//! use stroopmouse::repository::FsRepository;
//!
//! let repo = FsRepository::new("/data/mice");
//! let reader = DatasetReader::open("reversal.json", &repo).unwrap();
//!
//! let outcomes = reader
//!     .extract_field("101", "trials/outcome", ExtractOptions::new())
//!     .unwrap();
//! let matrix = outcomes.to_matrix().unwrap();
//! println!("{} experiments x {} trials", matrix.nrows(), matrix.ncols());
//! ```

use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{ACTIVITY_LOG_GROUP, BLOCKS_LEAF, Date};
use crate::error::{Result, StroopmouseError};
use crate::repository::RawRepository;
use crate::reshape::to_ragged_matrix;
use crate::store::{ArrayData, HierarchicalStore, JsonStore};

/// Record attribute holding an explicit trial count.
pub const NUM_TRIALS_ATTR: &str = "num_trials";

/// How to read and shape a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Concatenate every experiment into one vector.
    pub as_vector: bool,

    /// Read an attribute instead of an array leaf.
    pub is_attribute: bool,

    /// Decode values to text.
    pub is_string_valued: bool,
}

impl ExtractOptions {
    /// Array leaf, numeric, one sequence per experiment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenate experiments.
    pub fn vector(mut self) -> Self {
        self.as_vector = true;
        self
    }

    /// Read an attribute.
    pub fn attribute(mut self) -> Self {
        self.is_attribute = true;
        self
    }

    /// Decode to text.
    pub fn string(mut self) -> Self {
        self.is_string_valued = true;
        self
    }
}

/// Extracted field values.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// One sequence per experiment, in dataset order.
    PerExperiment(Vec<ArrayData>),
    /// Every experiment concatenated.
    Vector(ArrayData),
}

impl Extracted {
    /// Numeric values as a NaN-padded matrix, one row per experiment. A vector
    /// becomes a single row.
    pub fn to_matrix(&self) -> Result<Array2<f64>> {
        let parts: &[ArrayData] = match self {
            Extracted::PerExperiment(parts) => parts,
            Extracted::Vector(vector) => std::slice::from_ref(vector),
        };

        let rows = parts
            .iter()
            .map(|p| {
                p.as_numeric().ok_or_else(|| {
                    StroopmouseError::NotNumeric(
                        "cannot stack text values into a matrix".to_string(),
                    )
                })
            })
            .collect::<Result<Vec<&[f64]>>>()?;

        to_ragged_matrix(&rows)
    }

    /// Number of sequences (1 for a vector).
    pub fn sequence_count(&self) -> usize {
        match self {
            Extracted::PerExperiment(parts) => parts.len(),
            Extracted::Vector(_) => 1,
        }
    }
}

/// One recorded block opened for reading.
pub struct Experiment {
    mouse: String,
    date: String,
    block: char,
    file: String,
    record: Box<dyn HierarchicalStore>,
    num_trials: usize,
}

impl Experiment {
    /// Open the record of `block` for a mouse on a date.
    pub fn open(repo: &dyn RawRepository, mouse: &str, date: &str, block: char) -> Result<Self> {
        let file = Date::discover(repo, mouse, date)?
            .block_file(block)
            .map(|f| f.to_string())
            .ok_or_else(|| StroopmouseError::UnknownBlock {
                mouse: mouse.to_string(),
                date: date.to_string(),
                block: block.to_string(),
            })?;

        let record = repo.open_block(mouse, date, &file)?;
        let num_trials = trial_count(record.as_ref());
        debug!(mouse, date, %block, num_trials, "opened experiment");

        Ok(Self {
            mouse: mouse.to_string(),
            date: date.to_string(),
            block,
            file,
            record,
            num_trials,
        })
    }

    pub fn mouse(&self) -> &str {
        &self.mouse
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn block(&self) -> char {
        self.block
    }

    /// Block file name.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Number of trials recorded in this experiment.
    pub fn num_trials(&self) -> usize {
        self.num_trials
    }

    /// The raw record.
    pub fn record(&self) -> &dyn HierarchicalStore {
        self.record.as_ref()
    }

    /// Read one field as a sequence. Scalar attributes become length-1
    /// sequences.
    pub fn read_field(&self, field_path: &str, options: ExtractOptions) -> Result<ArrayData> {
        let value = if options.is_attribute {
            let (group, name) = field_path.rsplit_once('/').unwrap_or(("", field_path));
            self.record.attribute(group, name).map(|a| a.to_array())
        } else {
            self.record.array(field_path)
        };

        let value = value.ok_or_else(|| StroopmouseError::FieldNotFound {
            field: field_path.to_string(),
            experiment: self.to_string(),
        })?;

        Ok(if options.is_string_valued {
            value.into_text()
        } else {
            value
        })
    }
}

impl std::fmt::Display for Experiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mouse {}, {}, block {}", self.mouse, self.date, self.block)
    }
}

impl std::fmt::Debug for Experiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Experiment")
            .field("mouse", &self.mouse)
            .field("date", &self.date)
            .field("block", &self.block)
            .field("file", &self.file)
            .field("num_trials", &self.num_trials)
            .finish()
    }
}

fn trial_count(record: &dyn HierarchicalStore) -> usize {
    if let Some(n) = record.attribute("", NUM_TRIALS_ATTR).and_then(|a| a.as_f64()) {
        return n.max(0.0) as usize;
    }

    record
        .list_arrays("")
        .iter()
        .filter_map(|name| record.array(name))
        .map(|a| a.len())
        .max()
        .unwrap_or(0)
}

/// Every selected experiment of one mouse.
#[derive(Debug)]
pub struct MouseData {
    id: String,
    experiments: Vec<Experiment>,
}

impl MouseData {
    fn load(store: &dyn HierarchicalStore, repo: &dyn RawRepository, id: &str) -> Result<Self> {
        let mut experiments = Vec::new();

        for date in store.list_groups(id) {
            let blocks = store
                .array(&format!("{}/{}/{}", id, date, BLOCKS_LEAF))
                .map(|b| b.to_text())
                .unwrap_or_default();

            for block in blocks.iter().filter_map(|b| b.chars().next()) {
                experiments.push(Experiment::open(repo, id, &date, block)?);
            }
        }

        Ok(Self {
            id: id.to_string(),
            experiments,
        })
    }

    /// Mouse ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Experiments in dataset order (dates as selected, then blocks as
    /// selected).
    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    /// Total trials over every experiment.
    pub fn total_trials(&self) -> usize {
        self.experiments.iter().map(|e| e.num_trials()).sum()
    }

    /// Read a field from every experiment.
    ///
    /// Fails with `FieldNotFound` as soon as one experiment lacks the field;
    /// partial results are never returned.
    pub fn extract_field(&self, field_path: &str, options: ExtractOptions) -> Result<Extracted> {
        let parts = self
            .experiments
            .iter()
            .map(|e| e.read_field(field_path, options))
            .collect::<Result<Vec<ArrayData>>>()?;

        Ok(if options.as_vector {
            Extracted::Vector(ArrayData::concat(&parts))
        } else {
            Extracted::PerExperiment(parts)
        })
    }
}

/// A curated dataset opened for reading.
#[derive(Debug)]
pub struct DatasetReader {
    mice: Vec<MouseData>,
}

impl DatasetReader {
    /// Open a dataset file read-only.
    pub fn open(path: impl AsRef<Path>, repo: &dyn RawRepository) -> Result<Self> {
        let store = JsonStore::open_read(path)?;
        Self::from_store(&store, repo)
    }

    /// Read the selection of an already opened store.
    pub fn from_store(store: &dyn HierarchicalStore, repo: &dyn RawRepository) -> Result<Self> {
        let mice = store
            .list_groups("")
            .iter()
            .filter(|name| name.as_str() != ACTIVITY_LOG_GROUP)
            .map(|id| MouseData::load(store, repo, id))
            .collect::<Result<Vec<MouseData>>>()?;

        Ok(Self { mice })
    }

    /// Every mouse in the dataset.
    pub fn mice(&self) -> &[MouseData] {
        &self.mice
    }

    /// IDs of every mouse in the dataset.
    pub fn mouse_ids(&self) -> Vec<&str> {
        self.mice.iter().map(|m| m.id()).collect()
    }

    /// One mouse.
    pub fn mouse(&self, id: &str) -> Option<&MouseData> {
        self.mice.iter().find(|m| m.id() == id)
    }

    /// Read a field from every experiment of one mouse.
    pub fn extract_field(
        &self,
        mouse: &str,
        field_path: &str,
        options: ExtractOptions,
    ) -> Result<Extracted> {
        self.mouse(mouse)
            .ok_or_else(|| StroopmouseError::UnknownMouse(mouse.to_string()))?
            .extract_field(field_path, options)
    }

    /// Read a field for every mouse, in dataset order.
    pub fn extract_all(
        &self,
        field_path: &str,
        options: ExtractOptions,
    ) -> Result<Vec<(String, Extracted)>> {
        self.mice
            .iter()
            .map(|m| -> Result<(String, Extracted)> {
                Ok((m.id().to_string(), m.extract_field(field_path, options)?))
            })
            .collect()
    }
}
