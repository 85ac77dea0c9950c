//! Compartment enrichment thresholds
//!
//! Two fixed groups of `(column, threshold)` pairs. Columns follow the
//! `compartment::<name>` naming the STRING app uses for its enrichment scores.

use crate::error::{CoreError, Result};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of compartment enrichment columns
pub const COMPARTMENT_PREFIX: &str = "compartment::";

/// Default threshold for intracellular compartments
pub const DEFAULT_INTRACELLULAR_THRESHOLD: f64 = 4.0;

/// Default threshold for extracellular compartments
pub const DEFAULT_EXTRACELLULAR_THRESHOLD: f64 = 4.4;

/// Default PSM cutoff for top targets
pub const DEFAULT_PSM_CUTOFF: f64 = 5.0;

pub const INTRACELLULAR_COMPARTMENTS: &[&str] = &["cytosol", "nucleus", "mitochondrion"];

pub const EXTRACELLULAR_COMPARTMENTS: &[&str] = &[
    "endoplasmic reticulum",
    "golgi apparatus",
    "plasma membrane",
    "extracellular",
];

/// Named compartment group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompartmentGroup {
    Intracellular,
    Extracellular,
}

impl fmt::Display for CompartmentGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompartmentGroup::Intracellular => write!(f, "Intracellular"),
            CompartmentGroup::Extracellular => write!(f, "Extracellular"),
        }
    }
}

/// Enrichment cutoff for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompartmentThreshold {
    pub column: String,
    pub threshold: f64,
}

impl CompartmentThreshold {
    pub fn new(column: impl Into<String>, threshold: f64) -> Self {
        Self {
            column: column.into(),
            threshold,
        }
    }

    /// Threshold for a compartment name, column derived with [`COMPARTMENT_PREFIX`]
    pub fn compartment(name: &str, threshold: f64) -> Self {
        Self::new(compartment_column(name), threshold)
    }
}

/// Column name for a compartment
pub fn compartment_column(name: &str) -> String {
    format!("{}{}", COMPARTMENT_PREFIX, name)
}

/// Both threshold groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompartmentThresholds {
    pub intracellular: Vec<CompartmentThreshold>,
    pub extracellular: Vec<CompartmentThreshold>,
}

impl Default for CompartmentThresholds {
    fn default() -> Self {
        Self {
            intracellular: INTRACELLULAR_COMPARTMENTS
                .iter()
                .map(|c| CompartmentThreshold::compartment(c, DEFAULT_INTRACELLULAR_THRESHOLD))
                .collect(),
            extracellular: EXTRACELLULAR_COMPARTMENTS
                .iter()
                .map(|c| CompartmentThreshold::compartment(c, DEFAULT_EXTRACELLULAR_THRESHOLD))
                .collect(),
        }
    }
}

impl CompartmentThresholds {
    pub fn group(&self, group: CompartmentGroup) -> &[CompartmentThreshold] {
        match group {
            CompartmentGroup::Intracellular => &self.intracellular,
            CompartmentGroup::Extracellular => &self.extracellular,
        }
    }

    /// Override the threshold of an existing compartment
    ///
    /// Accepts either the bare compartment name or the full column name.
    pub fn set(&mut self, compartment: &str, threshold: f64) -> Result<()> {
        let column = if compartment.starts_with(COMPARTMENT_PREFIX) {
            compartment.to_string()
        } else {
            compartment_column(compartment)
        };

        self.intracellular
            .iter_mut()
            .chain(self.extracellular.iter_mut())
            .find(|t| t.column == column)
            .map(|t| t.threshold = threshold)
            .ok_or_else(|| {
                CoreError::invalid_threshold(format!("unknown compartment '{}'", compartment))
            })
    }

    /// Reject non-finite or negative thresholds and columns listed twice
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for t in self.intracellular.iter().chain(&self.extracellular) {
            if !t.threshold.is_finite() || t.threshold < 0.0 {
                return Err(CoreError::invalid_threshold(format!(
                    "'{}' must be a non-negative number, got {}",
                    t.column, t.threshold
                )));
            }
            if !seen.insert(t.column.as_str()) {
                return Err(CoreError::invalid_threshold(format!(
                    "'{}' is listed more than once",
                    t.column
                )));
            }
        }
        Ok(())
    }

    /// Fail unless every referenced column exists in `table`
    pub fn check_columns(&self, table: &Table) -> Result<()> {
        for group in [CompartmentGroup::Extracellular, CompartmentGroup::Intracellular] {
            if let Some(missing) = self.group(group).iter().find(|t| !table.has_column(&t.column)) {
                return Err(CoreError::missing_threshold_column(group, missing.column.as_str()));
            }
        }
        Ok(())
    }
}
