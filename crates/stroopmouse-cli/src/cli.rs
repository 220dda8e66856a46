//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stroopmouse: build and read curated mouse experiment datasets
#[derive(Parser)]
#[command(name = "stroopmouse")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Root of the raw data repository (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_repo: Option<PathBuf>,

    /// Directory holding dataset files (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub dataset_repo: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a dataset and edit it with commands read from stdin
    New {
        /// Dataset name or path
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Description of the changes, recorded in the activity log
        #[arg(short = 'm', long)]
        message: String,
    },

    /// Edit an existing dataset with commands read from stdin
    Edit {
        /// Dataset name or path
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Description of the changes, recorded in the activity log
        #[arg(short = 'm', long)]
        message: String,
    },

    /// Print the activity log of a dataset
    Log {
        /// Dataset name or path
        #[arg(value_name = "DATASET")]
        dataset: String,
    },

    /// Summarize the mice, dates and blocks of a dataset
    Status {
        /// Dataset name or path
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract one field from every selected experiment
    Extract {
        /// Dataset name or path
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Field path inside each block record (e.g. "trials/reaction_time")
        #[arg(value_name = "FIELD")]
        field: String,

        /// Read an attribute instead of an array
        #[arg(long)]
        attr: bool,

        /// Decode values as text
        #[arg(long)]
        string: bool,

        /// How to shape the values
        #[arg(long, default_value = "nested")]
        layout: Layout,

        /// Output format
        #[arg(short, long, default_value = "csv")]
        format: OutputFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only this mouse
        #[arg(long)]
        mouse: Option<String>,
    },

    /// List the raw repository or the dataset directory
    List {
        #[command(subcommand)]
        target: ListTarget,
    },
}

#[derive(Subcommand)]
pub enum ListTarget {
    /// Mice in the raw repository
    Mice,

    /// Dates recorded for a mouse
    Dates {
        mouse: String,
    },

    /// Block files recorded for a mouse on a date
    Blocks {
        mouse: String,
        date: String,
    },

    /// Dataset files in the dataset directory
    Datasets,
}

/// Shape of extracted values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// One sequence per experiment
    #[default]
    Nested,
    /// Every experiment concatenated
    Vector,
    /// NaN-padded matrix, one row per experiment
    Matrix,
}

impl std::str::FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nested" => Ok(Layout::Nested),
            "vector" => Ok(Layout::Vector),
            "matrix" => Ok(Layout::Matrix),
            _ => Err(format!("Unknown layout: {}. Use nested, vector, or matrix.", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use csv, tsv, or json.", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Tsv => write!(f, "tsv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
