//! `cytovs ping` command implementation

use crate::api::{CytoscapeClient, VisualizationService};
use crate::config::RunConfig;
use crate::error::Result;
use colored::Colorize;
use std::path::Path;

/// Check that Cytoscape answers at the configured URL
pub async fn run(config_path: Option<&Path>, cytoscape_url: Option<String>) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    let url = cytoscape_url.unwrap_or(config.cytoscape_url);

    let client = CytoscapeClient::new(url)?;
    let version = client.ping().await?;

    println!(
        "{} Cytoscape {} is reachable at {}",
        "✓".green(),
        version,
        client.base_url().cyan()
    );
    Ok(())
}
