//! Cytovs CLI Library
//!
//! Classifies proteins of an O-GlcNAc proteomics export and publishes them as
//! an annotated, styled STRING network in a running Cytoscape session.
//!
//! # Overview
//!
//! - **Full run**: map, merge, classify, flag and publish (`cytovs run`)
//! - **Offline classification**: label an export that already carries
//!   compartment scores (`cytovs classify`)
//! - **Liveness**: check that Cytoscape answers (`cytovs ping`)
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod pipeline;

// Re-export commonly used types
pub use config::RunConfig;
pub use error::{CliError, Result};
pub use pipeline::{Pipeline, RunReport};

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Cytovs - O-GlcNAc proteomics to Cytoscape
#[derive(Parser, Debug)]
#[command(name = "cytovs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML); defaults to the per-user config when present
    #[arg(short, long, global = true, env = "CYTOVS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the command reference as markdown
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Map, classify and publish an export to Cytoscape
    Run(RunArgs),

    /// Classify an export offline and write it as CSV
    Classify(ClassifyArgs),

    /// Check that Cytoscape is reachable
    Ping {
        /// CyREST root URL
        #[arg(long)]
        cytoscape_url: Option<String>,
    },
}

/// Input file options shared by commands that read an export
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Proteomics CSV export
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Column holding protein accessions
    #[arg(long)]
    pub identifier_column: Option<String>,
}

/// Per-compartment threshold overrides
#[derive(Args, Debug, Clone, Default)]
pub struct ThresholdArgs {
    /// Cytosol enrichment threshold
    #[arg(long)]
    pub cytosol: Option<f64>,

    /// Nucleus enrichment threshold
    #[arg(long)]
    pub nucleus: Option<f64>,

    /// Mitochondrion enrichment threshold
    #[arg(long)]
    pub mitochondrion: Option<f64>,

    /// Endoplasmic reticulum enrichment threshold
    #[arg(long)]
    pub endoplasmic_reticulum: Option<f64>,

    /// Golgi apparatus enrichment threshold
    #[arg(long)]
    pub golgi_apparatus: Option<f64>,

    /// Plasma membrane enrichment threshold
    #[arg(long)]
    pub plasma_membrane: Option<f64>,

    /// Extracellular enrichment threshold
    #[arg(long)]
    pub extracellular: Option<f64>,

    /// PSM count above which an intracellular hit is a top target
    #[arg(long)]
    pub psm_cutoff: Option<f64>,
}

impl ThresholdArgs {
    /// Compartment names paired with the thresholds given on the command line
    pub fn overrides(&self) -> Vec<(&'static str, f64)> {
        [
            ("cytosol", self.cytosol),
            ("nucleus", self.nucleus),
            ("mitochondrion", self.mitochondrion),
            ("endoplasmic reticulum", self.endoplasmic_reticulum),
            ("golgi apparatus", self.golgi_apparatus),
            ("plasma membrane", self.plasma_membrane),
            ("extracellular", self.extracellular),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }
}

/// Options of `cytovs run`
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,

    /// Identifiers per STRING mapping request
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// NCBI taxon id to restrict identifier mapping (e.g. 9606)
    #[arg(long)]
    pub species: Option<u32>,

    /// Visual style template; the bundled style when omitted
    #[arg(long)]
    pub style: Option<PathBuf>,

    /// STRING API root URL
    #[arg(long)]
    pub string_url: Option<String>,

    /// O-GlcNAc reference list URL
    #[arg(long)]
    pub reference_url: Option<String>,

    /// CyREST root URL
    #[arg(long)]
    pub cytoscape_url: Option<String>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Options of `cytovs classify`
#[derive(Args, Debug, Clone, Default)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,

    /// Output CSV; standard output when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl InputArgs {
    fn apply(&self, config: &mut RunConfig) {
        if let Some(input) = &self.input {
            config.input = Some(input.clone());
        }
        if let Some(column) = &self.identifier_column {
            config.identifier_column = column.clone();
        }
    }
}

impl ThresholdArgs {
    fn apply(&self, config: &mut RunConfig) -> Result<()> {
        config.apply_thresholds(self.overrides())?;
        if let Some(cutoff) = self.psm_cutoff {
            config.psm_cutoff = cutoff;
        }
        Ok(())
    }
}

impl RunArgs {
    /// Load the configuration and layer these flags on top
    pub fn resolve(&self, config_path: Option<&Path>) -> Result<RunConfig> {
        let mut config = RunConfig::load(config_path)?;
        self.input.apply(&mut config);
        self.thresholds.apply(&mut config)?;

        if let Some(size) = self.batch_size {
            config.batch_size = size;
        }
        if self.species.is_some() {
            config.species = self.species;
        }
        if let Some(style) = &self.style {
            config.style = Some(style.clone());
        }
        if let Some(url) = &self.string_url {
            config.string_url = url.clone();
        }
        if let Some(url) = &self.reference_url {
            config.reference_url = url.clone();
        }
        if let Some(url) = &self.cytoscape_url {
            config.cytoscape_url = url.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

impl ClassifyArgs {
    /// Load the configuration and layer these flags on top
    pub fn resolve(&self, config_path: Option<&Path>) -> Result<RunConfig> {
        let mut config = RunConfig::load(config_path)?;
        self.input.apply(&mut config);
        self.thresholds.apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "cytovs",
            "run",
            "--input",
            "proteins.csv",
            "--cytosol",
            "3.5",
            "--psm-cutoff",
            "8",
            "--batch-size",
            "200",
            "--species",
            "9606",
        ])
        .unwrap();

        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.thresholds.overrides(), vec![("cytosol", 3.5)]);
        assert_eq!(args.thresholds.psm_cutoff, Some(8.0));
        assert_eq!(args.batch_size, Some(200));
        assert_eq!(args.species, Some(9606));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "batch_size = 50\npsm_cutoff = 2.0\ninput = \"from-file.csv\"\n")
            .unwrap();

        let args = RunArgs {
            input: InputArgs {
                input: Some(PathBuf::from("from-flag.csv")),
                identifier_column: None,
            },
            thresholds: ThresholdArgs {
                golgi_apparatus: Some(7.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let config = args.resolve(Some(&path)).unwrap();

        assert_eq!(config.input, Some(PathBuf::from("from-flag.csv")));
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.psm_cutoff, 2.0);
        assert_eq!(
            config
                .thresholds
                .extracellular
                .iter()
                .find(|t| t.column == "compartment::golgi apparatus")
                .unwrap()
                .threshold,
            7.0
        );
    }

    #[test]
    fn test_negative_flag_is_rejected() {
        let args = ClassifyArgs {
            thresholds: ThresholdArgs {
                nucleus: Some(-1.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        std::fs::write(&path, "").unwrap();
        assert!(args.resolve(Some(&path)).is_err());
    }
}
