//! `cytovs run` command implementation
//!
//! Runs the full pipeline against the configured Cytoscape session and prints
//! what it did.

use crate::api::CytoscapeClient;
use crate::error::Result;
use crate::pipeline::{Pipeline, RunReport};
use crate::RunArgs;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use std::path::Path;
use tracing::info;

/// Identifiers listed in the summary before it is cut short
const EXCLUDED_PREVIEW: usize = 10;

/// Run the pipeline
pub async fn run(config_path: Option<&Path>, args: &RunArgs) -> Result<()> {
    let config = args.resolve(config_path)?;
    info!(
        cytoscape = %config.cytoscape_url,
        string = %config.string_url,
        "Starting run"
    );

    let session = CytoscapeClient::new(&config.cytoscape_url)?;
    let pipeline = Pipeline::new(config, session)?;
    let report = pipeline.run().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("{} Published {} proteins to Cytoscape", "✓".green().bold(), report.published_rows);
    println!();

    println!("{}", "Input:".cyan().bold());
    println!("  Records:            {}", report.input_records);
    println!("  Duplicate rows:     {}", report.duplicates_dropped);
    println!("  Mapped to STRING:   {}", report.mapped);
    println!("  Excluded:           {}", report.excluded.len());
    if !report.excluded.is_empty() {
        println!("    {}", excluded_preview(&report.excluded).dimmed());
    }
    println!("  Hidden nodes:       {}", report.hidden_nodes.len());
    println!();

    println!("{}", "Classification:".cyan().bold());
    println!("{}", label_table(report));
    println!();

    println!("{}", "Reference:".cyan().bold());
    println!(
        "  Known O-GlcNAc proteins: {} of {} published ({} in reference)",
        report.reference_matches, report.published_rows, report.reference_size
    );
    println!("  Style:                   {}", report.style_name);
    println!(
        "  Duration:                {:.1}s",
        (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0
    );
}

/// Per-label counts as a table
pub fn label_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Label", "Proteins"]);

    for (label, count) in &report.label_counts {
        table.add_row(vec![label.to_string(), count.to_string()]);
    }
    table
}

fn excluded_preview(excluded: &[String]) -> String {
    let shown: Vec<&str> = excluded
        .iter()
        .take(EXCLUDED_PREVIEW)
        .map(String::as_str)
        .collect();
    let rest = excluded.len().saturating_sub(EXCLUDED_PREVIEW);
    if rest == 0 {
        shown.join(", ")
    } else {
        format!("{} and {} more", shown.join(", "), rest)
    }
}
