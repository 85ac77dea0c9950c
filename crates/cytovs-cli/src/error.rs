//! Error types for the cytovs CLI
//!
//! Every failure is terminal for the current run. The variants keep the
//! failure classes apart so the operator can tell a broken input file from an
//! unreachable service or a missing reference list.

use cytovs_core::CoreError;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Comprehensive error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// Input, threshold or style problem raised by the offline core
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A remote service answered with a non-success status
    #[error("{service} request '{call}' failed with status {status}{}", body_suffix(.body))]
    Upstream {
        service: &'static str,
        call: String,
        status: StatusCode,
        body: Option<String>,
    },

    /// One identifier-mapping batch failed; nothing is retried
    #[error("Identifier mapping batch {batch} of {of} failed with status {status}. The STRING API may be rate limiting; retry later or lower --batch-size.")]
    MappingBatch {
        batch: usize,
        of: usize,
        status: StatusCode,
    },

    /// A command reached Cytoscape but reported errors
    #[error("Cytoscape command '{command}' reported errors: {message}")]
    Command { command: String, message: String },

    /// The reference list could not be fetched
    #[error("Glycosylation reference list unavailable at '{url}': {reason}. Annotation cannot continue without it.")]
    ReferenceUnavailable { url: String, reason: String },

    /// The reference list was fetched but held no identifiers
    #[error("Glycosylation reference list at '{url}' contains no identifiers. This is a data availability problem, not a result.")]
    ReferenceEmpty { url: String },

    /// No input identifier mapped to the interaction network
    #[error("None of the {0} input identifiers matched a STRING identifier. Check the identifier column and --species.")]
    NothingMapped(usize),

    /// The network query produced no node matching a mapped identifier
    #[error("The Cytoscape network has no node matching the {0} mapped identifiers")]
    NoNetworkNodes(usize),

    /// Cytoscape is not reachable
    #[error("Cytoscape is not reachable at '{url}': {reason}. Start Cytoscape with the STRING app installed and CyREST enabled.")]
    ServiceUnavailable { url: String, reason: String },

    /// HTTP request failed
    #[error("Network request failed: {0}. Check your internet connection and service URLs.")]
    Http(#[from] reqwest::Error),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// CSV output failed
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("Failed to parse configuration file: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your config file, environment variables and flags.")]
    Config(String),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create an upstream error
    pub fn upstream(
        service: &'static str,
        call: impl Into<String>,
        status: StatusCode,
        body: Option<String>,
    ) -> Self {
        Self::Upstream {
            service,
            call: call.into(),
            status,
            body: body.filter(|b| !b.trim().is_empty()),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a reference unavailable error
    pub fn reference_unavailable(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::ReferenceUnavailable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a service unavailable error
    pub fn service_unavailable(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::ServiceUnavailable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

fn body_suffix(body: &Option<String>) -> String {
    match body {
        Some(body) => format!(": {}", truncate(body, 200)),
        None => String::new(),
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
