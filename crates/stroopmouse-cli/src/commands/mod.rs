//! CLI command implementations.

pub mod edit;
pub mod extract;
pub mod list;
pub mod log;
pub mod status;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use stroopmouse::{FsRepository, StroopConfig};
use tracing::debug;

use crate::cli::Cli;

/// Configuration and repository shared by every command.
pub struct Context {
    pub config: StroopConfig,
    pub repo: Arc<FsRepository>,
}

impl Context {
    /// Load the config file (if any) and apply command-line overrides.
    pub fn from_cli(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = match &cli.config {
            Some(path) => StroopConfig::load(path)?,
            None => StroopConfig::new(),
        };
        if let Some(dir) = &cli.data_repo {
            config = config.with_data_repo(dir);
        }
        if let Some(dir) = &cli.dataset_repo {
            config = config.with_dataset_repo(dir);
        }
        debug!(?config, "resolved configuration");

        let repo = Arc::new(FsRepository::from_config(&config));
        Ok(Self { config, repo })
    }

    /// A dataset argument is either a path to a file or a name inside the
    /// dataset directory.
    pub fn dataset_path(&self, dataset: &str) -> PathBuf {
        let as_path = Path::new(dataset);
        if as_path.components().count() > 1 || as_path.extension().is_some() {
            as_path.to_path_buf()
        } else {
            self.config.dataset_path(dataset)
        }
    }
}
