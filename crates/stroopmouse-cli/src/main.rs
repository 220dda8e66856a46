//! Stroopmouse CLI - build and read curated mouse experiment datasets.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Context;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "STROOPMOUSE_LOG";

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = Context::from_cli(&cli).and_then(|ctx| match cli.command {
        Commands::New { dataset, message } => commands::edit::run(&ctx, &dataset, &message, true),

        Commands::Edit { dataset, message } => {
            commands::edit::run(&ctx, &dataset, &message, false)
        }

        Commands::Log { dataset } => commands::log::run(&ctx, &dataset),

        Commands::Status { dataset, json } => commands::status::run(&ctx, &dataset, json),

        Commands::Extract {
            dataset,
            field,
            attr,
            string,
            layout,
            format,
            output,
            mouse,
        } => commands::extract::run(
            &ctx,
            commands::extract::Request {
                dataset,
                field,
                attr,
                string,
                layout,
                format,
                output,
                mouse,
            },
        ),

        Commands::List { target } => commands::list::run(&ctx, target),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
