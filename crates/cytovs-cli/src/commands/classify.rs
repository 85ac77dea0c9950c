//! `cytovs classify` command implementation
//!
//! Labels an export that already carries the compartment columns, without
//! contacting any service. Output is the input columns in file order plus the
//! label column.

use crate::error::Result;
use crate::ClassifyArgs;
use colored::Colorize;
use cytovs_core::classify::annotate_table;
use cytovs_core::input::load_csv;
use cytovs_core::{Table, LABEL_COLUMN};
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Classify the export and write it as CSV
pub async fn run(config_path: Option<&Path>, args: &ClassifyArgs) -> Result<()> {
    let config = args.resolve(config_path)?;
    let input = load_csv(config.input_path()?, &config.identifier_column)?;

    let mut table = input.to_table();
    let counts = annotate_table(&mut table, &config.thresholds, config.psm_cutoff)?;
    for (label, count) in &counts {
        info!(%label, count, "Classified");
    }

    let mut columns = input.columns.clone();
    columns.push(LABEL_COLUMN.to_string());

    match &args.output {
        Some(path) => {
            write_csv(File::create(path)?, &columns, &table)?;
            eprintln!(
                "{} Classified {} proteins, written to {}",
                "✓".green(),
                table.len(),
                path.display().to_string().cyan()
            );
        }
        None => write_csv(std::io::stdout().lock(), &columns, &table)?,
    }
    Ok(())
}

/// Write `columns` of every row as CSV
pub fn write_csv<W: Write>(writer: W, columns: &[String], table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(columns)?;
    for row in table.rows() {
        writer.write_record(columns.iter().map(|c| format_cell(row.get(c))))?;
    }
    writer.flush()?;
    Ok(())
}

/// Whole numbers print without a fractional part, as they appear in exports
fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}
