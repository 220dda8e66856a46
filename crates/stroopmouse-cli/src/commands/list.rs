//! List command - browse the raw repository and the dataset directory.

use colored::Colorize;
use stroopmouse::repository::block_number;
use stroopmouse::RawRepository;

use super::Context;
use crate::cli::ListTarget;

pub fn run(ctx: &Context, target: ListTarget) -> Result<(), Box<dyn std::error::Error>> {
    match target {
        ListTarget::Mice => print_all(ctx.repo.mice()?),

        ListTarget::Dates { mouse } => print_all(ctx.repo.dates(&mouse)?),

        ListTarget::Blocks { mouse, date } => {
            for block in ctx.repo.blocks(&mouse, &date)? {
                match block_number(&block) {
                    Ok(n) => println!("{}  {}", n.to_string().cyan().bold(), block),
                    Err(e) => println!("{}  {}", "?".red(), e),
                }
            }
        }

        ListTarget::Datasets => print_all(ctx.config.list_datasets()?),
    }

    Ok(())
}

fn print_all(items: Vec<String>) {
    if items.is_empty() {
        println!("{}", "(none)".dimmed());
    }
    for item in items {
        println!("{}", item);
    }
}
