//! Curation session: a command dispatcher over a [`Dataset`].
//!
//! Each [`Command`] maps to one dataset operation and returns an
//! [`Outcome`]; prompting and printing are left to the front end.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use stroopmouse::dataset::Dataset;
//! # use stroopmouse::repository::FsRepository;
//! # use stroopmouse::store::StoreMode;
//! use stroopmouse::session::{Command, CurationSession};
//!
//! # let repo = Arc::new(FsRepository::new("/data/mice"));
//! # let dataset = Dataset::open("reversal.json", StoreMode::Append, repo).unwrap();
//! let mut session = CurationSession::begin(dataset, "Adding reversal week").unwrap();
//! let command: Command = "add-mouse 101".parse().unwrap();
//! let outcome = session.execute(command).unwrap();
//! ```

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use crate::dataset::{Dataset, Date, LogEntry, Mouse, MouseEditor, QualityFlag};
use crate::error::{Result, StroopmouseError};

/// Help text listing every command.
pub const HELP: &str = "\
add-mouse <mouse>                       select a mouse
rm-mouse <mouse>                        remove a mouse and all its dates
add-date <mouse> <date>                 (re)select a date, clearing its blocks
rm-date <mouse> <date>                  remove a date
range <mouse> <start> <end>             select every date from start to end
blocks <mouse> <date> <n>...            replace the selected blocks of a date
ls | lsf                                list available | selected mice
ls-dates <mouse> | lsf-dates <mouse>    list available | selected dates
lsp <mouse>                             list dates with their protocol
ls-blocks <mouse> <date>                list available block numbers
lsf-blocks <mouse> <date>               list selected block numbers
log                                     print the activity log
help                                    show this help
quit                                    end the session";

/// One curation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddMouse(String),
    RemoveMouse(String),
    AddDate { mouse: String, date: String },
    RemoveDate { mouse: String, date: String },
    DateRange { mouse: String, start: String, end: String },
    SelectBlocks { mouse: String, date: String, blocks: Vec<char> },
    ListMice,
    ListSelectedMice,
    ListDates(String),
    ListSelectedDates(String),
    ListProtocols(String),
    ListBlocks { mouse: String, date: String },
    ListSelectedBlocks { mouse: String, date: String },
    ShowLog,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = StroopmouseError;

    fn from_str(line: &str) -> Result<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let unknown = || StroopmouseError::UnknownCommand(line.trim().to_string());
        let owned = |s: &str| s.to_string();

        let command = match tokens.as_slice() {
            ["add-mouse", mouse] => Command::AddMouse(owned(mouse)),
            ["rm-mouse", mouse] => Command::RemoveMouse(owned(mouse)),
            ["add-date", mouse, date] => Command::AddDate {
                mouse: owned(mouse),
                date: owned(date),
            },
            ["rm-date", mouse, date] => Command::RemoveDate {
                mouse: owned(mouse),
                date: owned(date),
            },
            ["range", mouse, start, end] => Command::DateRange {
                mouse: owned(mouse),
                start: owned(start),
                end: owned(end),
            },
            ["blocks", mouse, date, numbers @ ..] => {
                let blocks = numbers
                    .iter()
                    .map(|n| {
                        let mut chars = n.chars();
                        match (chars.next(), chars.next()) {
                            (Some(c), None) => Ok(c),
                            _ => Err(unknown()),
                        }
                    })
                    .collect::<Result<Vec<char>>>()?;
                Command::SelectBlocks {
                    mouse: owned(mouse),
                    date: owned(date),
                    blocks,
                }
            }
            ["ls"] => Command::ListMice,
            ["lsf"] => Command::ListSelectedMice,
            ["ls-dates", mouse] => Command::ListDates(owned(mouse)),
            ["lsf-dates", mouse] => Command::ListSelectedDates(owned(mouse)),
            ["lsp", mouse] => Command::ListProtocols(owned(mouse)),
            ["ls-blocks", mouse, date] => Command::ListBlocks {
                mouse: owned(mouse),
                date: owned(date),
            },
            ["lsf-blocks", mouse, date] => Command::ListSelectedBlocks {
                mouse: owned(mouse),
                date: owned(date),
            },
            ["log"] => Command::ShowLog,
            ["help"] | ["h"] => Command::Help,
            ["quit"] | ["q"] => Command::Quit,
            _ => return Err(unknown()),
        };

        Ok(command)
    }
}

/// Result of executing a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Names, dates or block numbers.
    Listing(Vec<String>),
    /// The dataset changed.
    Changed(String),
    /// Nothing to do.
    Unchanged(String),
    /// Activity log entries.
    Log(Vec<LogEntry>),
    /// Command reference.
    Help(&'static str),
    /// End of the session.
    Quit,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Listing(items) => write!(f, "{}", items.join(", ")),
            Outcome::Changed(msg) | Outcome::Unchanged(msg) => write!(f, "{}", msg),
            Outcome::Log(entries) => {
                for entry in entries {
                    writeln!(f, "{}: {}", entry.key, entry.message)?;
                }
                Ok(())
            }
            Outcome::Help(text) => write!(f, "{}", text),
            Outcome::Quit => Ok(()),
        }
    }
}

/// Decides whether a flagged block should be selected anyway.
pub type Confirmer = Box<dyn FnMut(&QualityFlag) -> bool>;

/// An editing session over one dataset.
pub struct CurationSession {
    dataset: Dataset,
    confirm: Confirmer,
}

impl CurationSession {
    /// Start a session, recording the user's description of the changes.
    pub fn begin(mut dataset: Dataset, note: &str) -> Result<Self> {
        dataset.log_event(&format!("User Message: {}", note))?;
        Ok(Self::new(dataset))
    }

    /// Start a session without a note. Flagged blocks are declined.
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            confirm: Box::new(|_| false),
        }
    }

    /// Use another policy for flagged blocks.
    pub fn with_confirmer(mut self, confirm: impl FnMut(&QualityFlag) -> bool + 'static) -> Self {
        self.confirm = Box::new(confirm);
        self
    }

    /// The dataset being edited.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Flush and hand back the dataset.
    pub fn finish(mut self) -> Result<Dataset> {
        self.dataset.flush()?;
        info!("session finished");
        Ok(self.dataset)
    }

    /// Run one command.
    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        debug!(?command, "execute");

        match command {
            Command::AddMouse(id) => Ok(if self.dataset.add_mouse(&id)? {
                Outcome::Changed(format!("Added mouse {}", id))
            } else {
                Outcome::Unchanged(format!("Mouse {} already in dataset", id))
            }),

            Command::RemoveMouse(id) => Ok(if self.dataset.remove_mouse(&id)? {
                Outcome::Changed(format!("Removed mouse {}", id))
            } else {
                Outcome::Unchanged(format!("Mouse {} not in dataset", id))
            }),

            Command::AddDate { mouse, date } => self.add_date(&mouse, &date),

            Command::RemoveDate { mouse, date } => {
                let removed = self.editor(&mouse)?.remove_date(&date)?;
                Ok(if removed {
                    Outcome::Changed(format!("Removed {}", date))
                } else {
                    Outcome::Unchanged(format!("{} not in dataset for mouse {}", date, mouse))
                })
            }

            Command::DateRange { mouse, start, end } => {
                let range = self.selected(&mouse)?.available_range(&start, &end)?;
                for date in &range {
                    self.add_date(&mouse, date)?;
                }
                Ok(Outcome::Changed(format!("Added {} dates", range.len())))
            }

            Command::SelectBlocks {
                mouse,
                date,
                blocks,
            } => self.select_blocks(&mouse, &date, &blocks),

            Command::ListMice => Ok(Outcome::Listing(self.dataset.available_mice().to_vec())),

            Command::ListSelectedMice => Ok(Outcome::Listing(
                self.dataset.mouse_ids().into_iter().map(String::from).collect(),
            )),

            Command::ListDates(mouse) => Ok(Outcome::Listing(
                self.selected(&mouse)?
                    .list_available_dates()
                    .map(String::from)
                    .collect(),
            )),

            Command::ListSelectedDates(mouse) => Ok(Outcome::Listing(
                self.selected(&mouse)?
                    .selected_dates()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            )),

            Command::ListProtocols(mouse) => {
                let protocols = self
                    .selected(&mouse)?
                    .list_protocols(self.dataset.repository())?;
                Ok(Outcome::Listing(
                    protocols
                        .into_iter()
                        .map(|p| match p.protocol {
                            Some(protocol) => format!("{}: {}", p.date, protocol),
                            None => p.date,
                        })
                        .collect(),
                ))
            }

            Command::ListBlocks { mouse, date } => {
                let date = self.selected_date(&mouse, &date)?;
                let mut numbers: Vec<String> = date
                    .available_block_numbers()
                    .iter()
                    .map(|n| n.to_string())
                    .collect();
                numbers.sort();
                Ok(Outcome::Listing(numbers))
            }

            Command::ListSelectedBlocks { mouse, date } => Ok(Outcome::Listing(
                self.selected_date(&mouse, &date)?
                    .selected_blocks()
                    .iter()
                    .map(|n| n.to_string())
                    .collect(),
            )),

            Command::ShowLog => Ok(Outcome::Log(self.dataset.activity_log().entries().collect())),

            Command::Help => Ok(Outcome::Help(HELP)),

            Command::Quit => Ok(Outcome::Quit),
        }
    }

    /// Parse and run one line of input.
    pub fn execute_line(&mut self, line: &str) -> Result<Outcome> {
        let command: Command = line.parse()?;
        self.execute(command)
    }

    fn selected(&self, mouse: &str) -> Result<&Mouse> {
        self.dataset
            .mouse(mouse)
            .ok_or_else(|| StroopmouseError::UnknownMouse(mouse.to_string()))
    }

    fn selected_date(&self, mouse: &str, date: &str) -> Result<&Date> {
        self.selected(mouse)?
            .date(date)
            .ok_or_else(|| StroopmouseError::UnknownDate {
                mouse: mouse.to_string(),
                date: date.to_string(),
            })
    }

    fn editor(&mut self, mouse: &str) -> Result<MouseEditor<'_>> {
        self.dataset
            .mouse_mut(mouse)
            .ok_or_else(|| StroopmouseError::UnknownMouse(mouse.to_string()))
    }

    /// Select a date; a date with a single block gets that block selected
    /// automatically, subject to the quality check.
    fn add_date(&mut self, mouse: &str, date: &str) -> Result<Outcome> {
        let confirm = &mut self.confirm;
        let mut editor = self
            .dataset
            .mouse_mut(mouse)
            .ok_or_else(|| StroopmouseError::UnknownMouse(mouse.to_string()))?;
        let mut date_editor = editor.add_date(date)?;

        let only_block = match date_editor.date().available_blocks() {
            [only] => Some(only.clone()),
            _ => None,
        };

        if let Some(block) = only_block {
            let flag = date_editor.check_quality_flag(&block)?;
            if !flag.requires_confirmation || confirm(&flag) {
                date_editor.add_blocks(&[block.as_str()])?;
                return Ok(Outcome::Changed(format!("Added {} with {}", date, block)));
            }
        }

        Ok(Outcome::Changed(format!("Added {}", date)))
    }

    fn select_blocks(&mut self, mouse: &str, date: &str, numbers: &[char]) -> Result<Outcome> {
        let confirm = &mut self.confirm;
        let mut editor = self
            .dataset
            .mouse_mut(mouse)
            .ok_or_else(|| StroopmouseError::UnknownMouse(mouse.to_string()))?;
        let mut date_editor = editor.date_mut(date).ok_or_else(|| StroopmouseError::UnknownDate {
            mouse: mouse.to_string(),
            date: date.to_string(),
        })?;

        let mut accepted = Vec::with_capacity(numbers.len());
        let mut declined = Vec::new();
        for number in numbers {
            let file = date_editor
                .date()
                .block_file(*number)
                .map(|f| f.to_string())
                .ok_or_else(|| StroopmouseError::UnknownBlock {
                    mouse: mouse.to_string(),
                    date: date.to_string(),
                    block: number.to_string(),
                })?;

            let flag = date_editor.check_quality_flag(&file)?;
            if !flag.requires_confirmation || confirm(&flag) {
                accepted.push(file);
            } else {
                declined.push(*number);
            }
        }

        let selected = date_editor.add_blocks(&accepted)?;
        let listed: Vec<String> = selected.iter().map(|n| n.to_string()).collect();
        let mut message = format!("Selected blocks [{}] for {}", listed.join(", "), date);
        if !declined.is_empty() {
            let declined: Vec<String> = declined.iter().map(|n| n.to_string()).collect();
            message.push_str(&format!(" (declined flagged: {})", declined.join(", ")));
        }

        Ok(Outcome::Changed(message))
    }
}
