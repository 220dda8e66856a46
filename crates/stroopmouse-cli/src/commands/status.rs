//! Status command - summarize the selection of a dataset.

use colored::Colorize;
use stroopmouse::{Dataset, StoreMode};

use super::Context;

pub fn run(
    ctx: &Context,
    dataset: &str,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = ctx.dataset_path(dataset);
    let dataset = Dataset::open(&path, StoreMode::ReadOnly, ctx.repo.clone())?;

    if json_output {
        let mice: Vec<serde_json::Value> = dataset
            .mice()
            .iter()
            .map(|mouse| {
                let dates: serde_json::Map<String, serde_json::Value> = mouse
                    .dates()
                    .iter()
                    .map(|date| {
                        let blocks: Vec<String> =
                            date.selected_blocks().iter().map(|b| b.to_string()).collect();
                        (date.date().to_string(), serde_json::json!(blocks))
                    })
                    .collect();
                serde_json::json!({
                    "id": mouse.id(),
                    "available_dates": mouse.list_available_dates().count(),
                    "dates": dates,
                    "blocks": mouse.block_count(),
                })
            })
            .collect();

        let status = serde_json::json!({
            "file": path.display().to_string(),
            "mice": mice,
            "available_mice": dataset.available_mice(),
            "log_entries": dataset.activity_log().len(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Dataset status for".cyan().bold(),
        path.display().to_string().white()
    );
    println!();

    if dataset.mice().is_empty() {
        println!("{}", "No mice selected.".dimmed());
    }

    for mouse in dataset.mice() {
        println!(
            "{} {}  ({} of {} dates, {} blocks)",
            "Mouse".yellow().bold(),
            mouse.id().white().bold(),
            mouse.dates().len(),
            mouse.list_available_dates().count(),
            mouse.block_count()
        );
        for date in mouse.dates() {
            let blocks: Vec<String> =
                date.selected_blocks().iter().map(|b| b.to_string()).collect();
            let blocks = if blocks.is_empty() {
                "no blocks".red().to_string()
            } else {
                format!("blocks {}", blocks.join(", ")).green().to_string()
            };
            println!("  {}  {}", date.date(), blocks);
        }
    }
    println!();
    println!(
        "Activity log: {} entries",
        dataset.activity_log().len().to_string().white()
    );

    Ok(())
}
