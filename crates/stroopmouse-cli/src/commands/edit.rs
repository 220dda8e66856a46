//! New/edit commands - interactive curation session over stdin.

use std::io::{self, BufRead, IsTerminal, Write};

use colored::Colorize;
use stroopmouse::session::{CurationSession, Outcome};
use stroopmouse::{Dataset, QualityFlag, StoreMode};

use super::Context;

pub fn run(
    ctx: &Context,
    dataset: &str,
    message: &str,
    create: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = ctx.dataset_path(dataset);

    let opened = if create {
        Dataset::create(&path, ctx.repo.clone())?
    } else {
        if !path.exists() {
            return Err(format!(
                "Dataset not found: {}\nRun 'stroopmouse new {} -m <message>' first.",
                path.display(),
                dataset
            )
            .into());
        }
        Dataset::open(&path, StoreMode::Append, ctx.repo.clone())?
    };

    let interactive = io::stdin().is_terminal();
    let mut session = CurationSession::begin(opened, message)?.with_confirmer(confirm_flagged);

    println!(
        "{} {} (type {} for commands)",
        if create { "Created" } else { "Editing" }.cyan().bold(),
        path.display().to_string().white(),
        "help".cyan()
    );

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        if interactive {
            print!("{} ", ">".cyan());
            io::stdout().flush()?;
        }

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match session.execute_line(&line) {
            Ok(Outcome::Quit) => break,
            Ok(outcome) => print_outcome(&outcome),
            Err(e) if e.is_recoverable() => {
                println!("{} {}", "Error:".red().bold(), e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    session.finish()?;
    println!("{} {}", "Saved".green().bold(), path.display());

    Ok(())
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Changed(msg) => println!("{} {}", "✓".green(), msg),
        Outcome::Unchanged(msg) => println!("{} {}", "·".dimmed(), msg.dimmed()),
        Outcome::Listing(items) if items.is_empty() => println!("{}", "(none)".dimmed()),
        Outcome::Listing(items) => {
            for item in items {
                println!("  {}", item);
            }
        }
        Outcome::Log(entries) => {
            for entry in entries {
                println!("{}  {}", entry.key.dimmed(), entry.message);
            }
        }
        Outcome::Help(text) => println!("{}", text),
        Outcome::Quit => {}
    }
}

/// Ask on stdin whether to keep a block the experimenter flagged.
fn confirm_flagged(flag: &QualityFlag) -> bool {
    println!(
        "{} {} was flagged: {}",
        "Warning:".yellow().bold(),
        flag.block,
        flag.message.as_deref().unwrap_or("(no message)")
    );
    print!("Include it anyway? [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
