//! Shared fixture: a raw repository of block records in a temp directory.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use stroopmouse::dataset::FixedClock;
use stroopmouse::{ArrayData, AttrValue, FsRepository, HierarchicalStore, JsonStore};

/// Contents of one block record.
pub struct Block {
    pub outcome: Vec<f64>,
    pub protocol: &'static str,
    pub quality: &'static str,
    pub message: Option<&'static str>,
    pub num_trials: Option<f64>,
}

impl Block {
    pub fn new(outcome: &[f64]) -> Self {
        Self {
            outcome: outcome.to_vec(),
            protocol: "stroop_v1",
            quality: "y",
            message: None,
            num_trials: None,
        }
    }

    pub fn protocol(mut self, protocol: &'static str) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn flagged(mut self, message: &'static str) -> Self {
        self.quality = "n";
        self.message = Some(message);
        self
    }

    pub fn num_trials(mut self, n: f64) -> Self {
        self.num_trials = Some(n);
        self
    }
}

/// Temp directory holding `raw/` (the repository) and `datasets/`.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// Empty repository.
    pub fn empty() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("raw")).expect("Failed to create raw dir");
        fs::create_dir_all(dir.path().join("datasets")).expect("Failed to create datasets dir");
        Self { dir }
    }

    /// The standard layout used across the tests:
    ///
    /// ```text
    /// raw/
    /// ├── .DS_Store
    /// ├── test/
    /// ├── 101/
    /// │   ├── notes/
    /// │   ├── 2023-01-02/   block1 [1,0,1] (training), block2 [1,1]
    /// │   ├── 2023-01-03/   block1 [0,1,1,1]
    /// │   ├── 2023-01-04/   block1 [0] flagged
    /// │   └── 2023-01-05/   block1 [1], block2 [0,0], block3 [1,1,1]
    /// └── 205/
    ///     └── 2023-02-01/   block1 [1,1], num_trials 40
    /// ```
    pub fn standard() -> Self {
        let fixture = Self::empty();
        fixture.add_block(
            "101",
            "2023-01-02",
            1,
            Block::new(&[1.0, 0.0, 1.0]).protocol("stroop_training"),
        );
        fixture.add_block("101", "2023-01-02", 2, Block::new(&[1.0, 1.0]));
        fixture.add_block("101", "2023-01-03", 1, Block::new(&[0.0, 1.0, 1.0, 1.0]));
        fixture.add_block(
            "101",
            "2023-01-04",
            1,
            Block::new(&[0.0]).flagged("lick port clogged"),
        );
        fixture.add_block("101", "2023-01-05", 1, Block::new(&[1.0]));
        fixture.add_block("101", "2023-01-05", 2, Block::new(&[0.0, 0.0]));
        fixture.add_block("101", "2023-01-05", 3, Block::new(&[1.0, 1.0, 1.0]));
        fixture.add_block(
            "205",
            "2023-02-01",
            1,
            Block::new(&[1.0, 1.0]).num_trials(40.0),
        );

        let raw = fixture.raw();
        fs::create_dir_all(raw.join("101/notes")).expect("Failed to create notes dir");
        fs::create_dir_all(raw.join("test")).expect("Failed to create test dir");
        fs::write(raw.join(".DS_Store"), "").expect("Failed to write .DS_Store");
        fixture
    }

    pub fn raw(&self) -> PathBuf {
        self.dir.path().join("raw")
    }

    pub fn repo(&self) -> Arc<FsRepository> {
        Arc::new(FsRepository::new(self.raw()))
    }

    pub fn dataset_path(&self, name: &str) -> PathBuf {
        self.dir.path().join("datasets").join(format!("{}.json", name))
    }

    /// Write `ms<mouse>_<date>_block<n>.json`.
    pub fn add_block(&self, mouse: &str, date: &str, number: u32, block: Block) {
        let path = self
            .raw()
            .join(mouse)
            .join(date)
            .join(format!("ms{}_{}_block{}.json", mouse, date, number));
        write_block(&path, &block);
    }
}

fn write_block(path: &Path, block: &Block) {
    let mut store = JsonStore::open_append(path).expect("Failed to create block record");

    store
        .set_attribute("", "protocol_name", AttrValue::from(block.protocol))
        .unwrap();
    store
        .set_attribute("", "experimental_quality", AttrValue::from(block.quality))
        .unwrap();
    if let Some(message) = block.message {
        store
            .set_attribute("", "experimental_message", AttrValue::from(message))
            .unwrap();
    }
    if let Some(n) = block.num_trials {
        store.set_attribute("", "num_trials", AttrValue::from(n)).unwrap();
    }

    let side: Vec<String> = (0..block.outcome.len())
        .map(|i| if i % 2 == 0 { "L" } else { "R" }.to_string())
        .collect();
    let reaction_time: Vec<f64> = block.outcome.iter().map(|o| 250.0 + 100.0 * o).collect();

    store.set_array("outcome", ArrayData::from(block.outcome.clone())).unwrap();
    store.set_array("side", ArrayData::from(side)).unwrap();
    store
        .set_array("trials/reaction_time", ArrayData::from(reaction_time))
        .unwrap();
    store.flush().unwrap();
}

/// A clock frozen at 2023-01-02 12:00:00.
pub fn frozen_clock() -> FixedClock {
    FixedClock(
        NaiveDate::from_ymd_opt(2023, 1, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap(),
    )
}
