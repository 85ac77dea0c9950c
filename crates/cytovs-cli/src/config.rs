//! Run configuration for the cytovs pipeline
//!
//! One [`RunConfig`] value carries every input of a run. It is assembled once
//! from bundled defaults, an optional TOML file, environment variables and
//! command-line flags (later sources win), validated, and then handed to the
//! pipeline unchanged.

use crate::api::glyco::GLYCO_FLAG_COLUMN;
use crate::api::string_db::MAPPING_COLUMNS;
use crate::error::{CliError, Result};
use cytovs_core::input::DEFAULT_IDENTIFIER_COLUMN;
use cytovs_core::thresholds::{CompartmentThresholds, DEFAULT_PSM_CUTOFF};
use cytovs_core::{StyleTemplate, LABEL_COLUMN};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

// ============================================================================
// Configuration Constants
// ============================================================================

/// STRING API root used for identifier mapping
pub const DEFAULT_STRING_URL: &str = "https://string-db.org/api";

/// Reference list of known O-GlcNAcylated proteins (CSV, accession first)
pub const DEFAULT_REFERENCE_URL: &str = "https://www.oglcnac.mcw.edu/download/oglcnac_proteins.csv";

/// CyREST root of a locally running Cytoscape
pub const DEFAULT_CYTOSCAPE_URL: &str = "http://localhost:1234";

/// Identifiers per mapping request
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Timeout of one identifier-mapping request in seconds.
/// Overridden by CYTOVS_MAPPING_TIMEOUT_SECS.
pub const DEFAULT_MAPPING_TIMEOUT_SECS: u64 = 300;

pub const ENV_STRING_URL: &str = "CYTOVS_STRING_URL";
pub const ENV_REFERENCE_URL: &str = "CYTOVS_REFERENCE_URL";
pub const ENV_CYTOSCAPE_URL: &str = "CYTOVS_CYTOSCAPE_URL";
pub const ENV_MAPPING_TIMEOUT_SECS: &str = "CYTOVS_MAPPING_TIMEOUT_SECS";

/// Everything one pipeline run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Proteomics CSV export
    pub input: Option<PathBuf>,

    /// Column of the export holding protein accessions
    pub identifier_column: String,

    /// Identifiers per mapping request
    pub batch_size: usize,

    /// NCBI taxon id restricting identifier mapping
    pub species: Option<u32>,

    /// PSM count above which an intracellular hit is a top target
    pub psm_cutoff: f64,

    pub thresholds: CompartmentThresholds,

    /// Style template; the bundled one when unset
    pub style: Option<PathBuf>,

    pub string_url: String,
    pub reference_url: String,
    pub cytoscape_url: String,
    pub mapping_timeout_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: None,
            identifier_column: DEFAULT_IDENTIFIER_COLUMN.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            species: None,
            psm_cutoff: DEFAULT_PSM_CUTOFF,
            thresholds: CompartmentThresholds::default(),
            style: None,
            string_url: DEFAULT_STRING_URL.to_string(),
            reference_url: DEFAULT_REFERENCE_URL.to_string(),
            cytoscape_url: DEFAULT_CYTOSCAPE_URL.to_string(),
            mapping_timeout_secs: DEFAULT_MAPPING_TIMEOUT_SECS,
        }
    }
}

impl RunConfig {
    /// Location of the per-user config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cytovs").join("config.toml"))
    }

    /// Defaults, then the config file, then environment variables
    ///
    /// An explicit `path` must exist. The per-user file is read only when
    /// present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.with_env_overrides()
    }

    /// Parse a TOML config file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Reading config file");
        let text = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Apply the CYTOVS_* environment variables
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_STRING_URL) {
            self.string_url = url;
        }
        if let Some(url) = lookup(ENV_REFERENCE_URL) {
            self.reference_url = url;
        }
        if let Some(url) = lookup(ENV_CYTOSCAPE_URL) {
            self.cytoscape_url = url;
        }
        if let Some(secs) = lookup(ENV_MAPPING_TIMEOUT_SECS) {
            self.mapping_timeout_secs = secs.trim().parse().map_err(|_| {
                CliError::config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_MAPPING_TIMEOUT_SECS, secs
                ))
            })?;
        }
        Ok(self)
    }

    /// Override single compartment thresholds by compartment name
    pub fn apply_thresholds<'a, I>(&mut self, overrides: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        for (compartment, threshold) in overrides {
            self.thresholds.set(compartment, threshold)?;
        }
        Ok(())
    }

    /// Reject values that would only fail halfway through a run
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(CliError::config("batch_size must be greater than zero"));
        }
        if !self.psm_cutoff.is_finite() || self.psm_cutoff < 0.0 {
            return Err(CliError::config(format!(
                "psm_cutoff must be a non-negative number, got {}",
                self.psm_cutoff
            )));
        }
        if self.identifier_column.trim().is_empty() {
            return Err(CliError::config("identifier_column must not be empty"));
        }
        // The reference lookup reads the local accession back from this column
        let id = self.identifier_column.as_str();
        if MAPPING_COLUMNS.contains(&id) || id == LABEL_COLUMN || id == GLYCO_FLAG_COLUMN {
            return Err(CliError::config(format!(
                "identifier_column '{}' collides with a column cytovs writes; rename it in the input",
                id
            )));
        }
        if self.mapping_timeout_secs == 0 {
            return Err(CliError::config("mapping_timeout_secs must be greater than zero"));
        }
        self.thresholds.validate()?;
        Ok(())
    }

    /// Input path, required for every command that reads an export
    pub fn input_path(&self) -> Result<&Path> {
        self.input
            .as_deref()
            .ok_or_else(|| CliError::config("no input file given; pass --input or set 'input'"))
    }

    pub fn mapping_timeout(&self) -> Duration {
        Duration::from_secs(self.mapping_timeout_secs)
    }

    /// Configured style template, or the bundled one
    pub fn style_template(&self) -> Result<StyleTemplate> {
        Ok(match &self.style {
            Some(path) => StyleTemplate::load(path)?,
            None => StyleTemplate::bundled(),
        })
    }
}
