//! Stroopmouse: curate and read datasets of mouse behavioural recordings.
//!
//! Raw recordings live in a repository laid out as mouse / date / block
//! files. A dataset is a small hierarchical file that selects which mice,
//! dates and blocks belong to an analysis, together with an append-only
//! activity log of every change.
//!
//! # Core Principles
//!
//! - **Non-destructive**: Raw block records are only ever read
//! - **Full provenance**: Every selection change is logged with a timestamp
//! - **Ragged-friendly**: Per-experiment sequences can be stacked into a
//!   NaN-padded matrix or concatenated into one vector
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stroopmouse::{Dataset, DatasetReader, ExtractOptions, FsRepository, StoreMode};
//!
//! let repo = Arc::new(FsRepository::new("/data/mice"));
//!
//! let mut dataset = Dataset::open("reversal.json", StoreMode::Append, repo.clone()).unwrap();
//! dataset.add_mouse("101").unwrap();
//! dataset.flush().unwrap();
//!
//! let reader = DatasetReader::open("reversal.json", repo.as_ref()).unwrap();
//! let rt = reader.extract_field("101", "trials/reaction_time", ExtractOptions::new()).unwrap();
//! println!("{} experiments", rt.sequence_count());
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod reader;
pub mod repository;
pub mod reshape;
pub mod session;
pub mod store;

pub use config::StroopConfig;
pub use dataset::{ActivityLog, Dataset, Date, LogEntry, Mouse, QualityFlag};
pub use error::{Result, StroopmouseError};
pub use reader::{DatasetReader, Experiment, ExtractOptions, Extracted, MouseData};
pub use repository::{FsRepository, RawRepository};
pub use reshape::{to_concatenated_vector, to_ragged_matrix};
pub use session::{Command, CurationSession, Outcome};
pub use store::{ArrayData, AttrValue, HierarchicalStore, JsonStore, MemoryStore, StoreMode};
