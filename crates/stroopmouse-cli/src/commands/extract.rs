//! Extract command - export one field of every selected experiment.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use colored::Colorize;
use serde_json::{Value, json};
use stroopmouse::{
    ArrayData, DatasetReader, ExtractOptions, Extracted, MouseData, StroopmouseError,
};

use super::Context;
use crate::cli::{Layout, OutputFormat};

/// Arguments of one extraction.
pub struct Request {
    pub dataset: String,
    pub field: String,
    pub attr: bool,
    pub string: bool,
    pub layout: Layout,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub mouse: Option<String>,
}

impl Request {
    fn options(&self) -> ExtractOptions {
        let mut options = ExtractOptions::new();
        if self.attr {
            options = options.attribute();
        }
        if self.string {
            options = options.string();
        }
        if self.layout == Layout::Vector {
            options = options.vector();
        }
        options
    }
}

/// Extracted values of one mouse, labelled per row.
struct MouseTable {
    mouse: String,
    /// `(date, block)` per row; empty for a vector.
    labels: Vec<(String, char)>,
    rows: Vec<Vec<Value>>,
}

pub fn run(ctx: &Context, request: Request) -> Result<(), Box<dyn std::error::Error>> {
    let path = ctx.dataset_path(&request.dataset);
    let reader = DatasetReader::open(&path, ctx.repo.as_ref())?;
    let options = request.options();

    let mice: Vec<&MouseData> = match &request.mouse {
        Some(id) => vec![reader
            .mouse(id)
            .ok_or_else(|| StroopmouseError::UnknownMouse(id.clone()))?],
        None => reader.mice().iter().collect(),
    };

    let tables = mice
        .into_iter()
        .map(|mouse| build_table(mouse, &request, options))
        .collect::<Result<Vec<MouseTable>, StroopmouseError>>()?;

    let out: Box<dyn Write> = match &request.output {
        Some(file) => Box::new(BufWriter::new(File::create(file)?)),
        None => Box::new(io::stdout().lock()),
    };

    match request.format {
        OutputFormat::Json => write_json(out, &tables, request.layout)?,
        OutputFormat::Csv => write_delimited(out, &tables, request.layout, b',')?,
        OutputFormat::Tsv => write_delimited(out, &tables, request.layout, b'\t')?,
    }

    if let Some(file) = &request.output {
        let rows: usize = tables.iter().map(|t| t.rows.len()).sum();
        eprintln!(
            "{} Wrote {} rows of '{}' to {} ({})",
            "[OK]".green().bold(),
            rows,
            request.field,
            file.display(),
            request.format
        );
    }

    Ok(())
}

fn build_table(
    mouse: &MouseData,
    request: &Request,
    options: ExtractOptions,
) -> Result<MouseTable, StroopmouseError> {
    let extracted = mouse.extract_field(&request.field, options)?;
    let labels: Vec<(String, char)> = mouse
        .experiments()
        .iter()
        .map(|e| (e.date().to_string(), e.block()))
        .collect();

    let (labels, rows) = match (&extracted, request.layout) {
        (Extracted::Vector(values), _) => (Vec::new(), vec![cells(values)]),
        (Extracted::PerExperiment(parts), Layout::Matrix) if !parts.is_empty() => {
            let matrix = extracted.to_matrix()?;
            let rows = matrix
                .rows()
                .into_iter()
                .map(|row| row.iter().map(|v| number(*v)).collect())
                .collect();
            (labels, rows)
        }
        (Extracted::PerExperiment(parts), _) => (labels, parts.iter().map(cells).collect()),
    };

    Ok(MouseTable {
        mouse: mouse.id().to_string(),
        labels,
        rows,
    })
}

fn number(v: f64) -> Value {
    if v.is_nan() { Value::Null } else { json!(v) }
}

fn cells(values: &ArrayData) -> Vec<Value> {
    match values {
        ArrayData::Numeric(v) => v.iter().map(|n| number(*n)).collect(),
        ArrayData::Text(v) => v.iter().map(|s| Value::String(s.clone())).collect(),
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn write_json(
    mut out: Box<dyn Write>,
    tables: &[MouseTable],
    layout: Layout,
) -> Result<(), Box<dyn std::error::Error>> {
    let mice: Vec<Value> = tables
        .iter()
        .map(|table| match layout {
            Layout::Vector => json!({
                "mouse": table.mouse,
                "values": table.rows.first().cloned().unwrap_or_default(),
            }),
            Layout::Nested | Layout::Matrix => {
                let experiments: Vec<Value> = table
                    .labels
                    .iter()
                    .zip(&table.rows)
                    .map(|((date, block), values)| {
                        json!({ "date": date, "block": block.to_string(), "values": values })
                    })
                    .collect();
                json!({ "mouse": table.mouse, "experiments": experiments })
            }
        })
        .collect();

    serde_json::to_writer_pretty(&mut out, &mice)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn write_delimited(
    out: Box<dyn Write>,
    tables: &[MouseTable],
    layout: Layout,
    delimiter: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(out);

    match layout {
        Layout::Vector => {
            writer.write_record(["mouse", "index", "value"])?;
            for table in tables {
                for (i, value) in table.rows.iter().flatten().enumerate() {
                    writer.write_record([table.mouse.clone(), i.to_string(), cell_text(value)])?;
                }
            }
        }
        Layout::Nested | Layout::Matrix => {
            let width = tables
                .iter()
                .flat_map(|t| t.rows.iter().map(|r| r.len()))
                .max()
                .unwrap_or(0);
            let mut header = vec!["mouse".to_string(), "date".to_string(), "block".to_string()];
            header.extend((1..=width).map(|i| format!("trial_{}", i)));
            writer.write_record(&header)?;

            for table in tables {
                for ((date, block), values) in table.labels.iter().zip(&table.rows) {
                    let mut record = vec![table.mouse.clone(), date.clone(), block.to_string()];
                    record.extend(values.iter().map(cell_text));
                    writer.write_record(&record)?;
                }
            }
        }
    }

    writer.flush()?;
    Ok(())
}
