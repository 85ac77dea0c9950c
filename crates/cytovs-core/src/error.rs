//! Error types for the offline part of the pipeline
//!
//! Covers input errors (malformed or incomplete CSV exports) and
//! configuration-mismatch errors (thresholds or style anchors that do not line
//! up with the data they are applied to).

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Main error type for cytovs core operations
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the input header
    #[error("Missing required column '{column}'. The input must provide '{column}' in its header row.")]
    MissingColumn { column: String },

    /// A cell could not be read as the expected value
    #[error("Invalid value '{value}' in column '{column}'{}: {reason}", row_suffix(.row))]
    InvalidValue {
        row: Option<usize>,
        column: String,
        value: String,
        reason: String,
    },

    /// Input file has a header but no data rows
    #[error("Input contains no data rows")]
    EmptyInput,

    /// A threshold references a column the merged table does not carry
    #[error("{group} threshold column '{column}' is not present in the merged table. Check the compartment names in your configuration.")]
    MissingThresholdColumn { group: String, column: String },

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// Style template and resolver disagree on the anchor placeholders
    #[error("Style anchor '{anchor}' not found in template. The template does not match this version of cytovs.")]
    StyleAnchorMissing { anchor: String },

    #[error("Cannot resolve style bounds: no score values")]
    EmptyScores,
}

impl CoreError {
    /// Create a missing column error
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    /// Create an invalid value error for a cell without row context
    pub fn invalid_cell(
        column: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            row: None,
            column: column.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(
        row: usize,
        column: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            row: Some(row),
            column: column.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing threshold column error
    pub fn missing_threshold_column(group: impl ToString, column: impl Into<String>) -> Self {
        Self::MissingThresholdColumn {
            group: group.to_string(),
            column: column.into(),
        }
    }

    /// Create an invalid threshold error
    pub fn invalid_threshold(msg: impl Into<String>) -> Self {
        Self::InvalidThreshold(msg.into())
    }

    /// Attach a 1-based row number to a cell error
    pub fn at_row(self, row: usize) -> Self {
        match self {
            Self::InvalidValue {
                row: None,
                column,
                value,
                reason,
            } => Self::InvalidValue {
                row: Some(row),
                column,
                value,
                reason,
            },
            other => other,
        }
    }
}

fn row_suffix(row: &Option<usize>) -> String {
    row.map(|r| format!(" at row {}", r)).unwrap_or_default()
}
