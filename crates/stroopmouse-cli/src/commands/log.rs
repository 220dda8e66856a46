//! Log command - print a dataset's activity log.

use colored::Colorize;
use stroopmouse::{Dataset, StoreMode};

use super::Context;

pub fn run(ctx: &Context, dataset: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = ctx.dataset_path(dataset);
    let dataset = Dataset::open(&path, StoreMode::ReadOnly, ctx.repo.clone())?;
    let log = dataset.activity_log();

    if log.is_empty() {
        println!("{}", "Activity log is empty.".dimmed());
        return Ok(());
    }

    for entry in log.entries() {
        let message = if entry.message.starts_with("User Message:") {
            entry.message.cyan().to_string()
        } else if entry.message.starts_with("Removed") {
            entry.message.red().to_string()
        } else {
            entry.message.clone()
        };
        println!("{}  {}", entry.key.dimmed(), message);
    }

    Ok(())
}
