//! Build automation tasks for cytovs
//!
//! - `generate-cli-docs`: write the command reference from the clap definitions
//! - `check-cli-docs`: fail when the committed reference is out of date

use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for cytovs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in markdown
    GenerateCliDocs {
        /// Output file
        #[arg(short, long, default_value = "docs/cli.md")]
        output: PathBuf,
    },

    /// Check that the committed CLI reference matches the source
    CheckCliDocs {
        /// Reference file to compare against
        #[arg(short, long, default_value = "docs/cli.md")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output } => generate_cli_docs(&output)?,
        Command::CheckCliDocs { output } => check_cli_docs(&output)?,
    }

    Ok(())
}

/// Reference body without the date line, so regeneration is stable
fn reference_body() -> String {
    let markdown = clap_markdown::help_markdown::<cytovs_cli::Cli>();

    format!(
        r#"# cytovs CLI Reference

cytovs classifies the proteins of an O-GlcNAc proteomics export by
subcellular localization and HexNAc evidence, maps them to STRING and
publishes the annotated network to a running Cytoscape session.

## Quick Start

```bash
# Check that Cytoscape (with the STRING app and CyREST) is running
cytovs ping

# Full run with the default thresholds
cytovs run --input proteins.csv --species 9606

# Lower the cytosol threshold and raise the PSM cutoff
cytovs run --input proteins.csv --cytosol 3.5 --psm-cutoff 10

# Offline classification of an export that carries compartment scores
cytovs classify --input scored.csv --output labelled.csv
```

## Commands

{}

## Environment Variables

- `CYTOVS_CONFIG` - Configuration file (default: `<config dir>/cytovs/config.toml`)
- `CYTOVS_STRING_URL` - STRING API root (default: `https://string-db.org/api`)
- `CYTOVS_REFERENCE_URL` - O-GlcNAc reference list (CSV, accession in the first column)
- `CYTOVS_CYTOSCAPE_URL` - CyREST root (default: `http://localhost:1234`)
- `CYTOVS_MAPPING_TIMEOUT_SECS` - Timeout of one STRING request (default: `300`)
- `LOG_LEVEL`, `LOG_FORMAT`, `LOG_FILTER` - Logging (stderr)
- `LOG_DIR` - Also write daily rolling `cytovs.<date>` log files here

## Configuration

Every option can be set in a TOML file. Command-line flags win over
environment variables, which win over the file.

```toml
identifier_column = "Protein Accessions"
batch_size = 1000
species = 9606
psm_cutoff = 5.0

[[thresholds.intracellular]]
column = "compartment::cytosol"
threshold = 4.0

[[thresholds.extracellular]]
column = "compartment::extracellular"
threshold = 4.4
```

A threshold group given in the file replaces the whole default group.
"#,
        markdown
    )
}

fn generate_cli_docs(output: &Path) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let content = format!(
        "{}\n---\n\n*Generated {} by `cargo run -p xtask -- generate-cli-docs`.*\n",
        reference_body(),
        chrono::Utc::now().format("%Y-%m-%d")
    );

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, content)?;

    println!("✅ Generated CLI documentation at: {}", output.display());
    Ok(())
}

fn check_cli_docs(output: &Path) -> anyhow::Result<()> {
    let committed = fs::read_to_string(output)?;
    if !committed.starts_with(&reference_body()) {
        anyhow::bail!(
            "{} is out of date; run `cargo run -p xtask -- generate-cli-docs`",
            output.display()
        );
    }
    println!("✅ {} is up to date", output.display());
    Ok(())
}
