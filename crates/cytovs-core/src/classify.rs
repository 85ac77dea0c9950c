//! O-GlcNAc evidence classification
//!
//! Every protein gets exactly one label. The rules run in a fixed order and
//! the first one that matches wins:
//!
//! 1. `HexNAc == 0` gives [`ClassificationLabel::NoEvidence`]
//! 2. any extracellular enrichment above its threshold gives
//!    [`ClassificationLabel::ExtracellularEvidence`]
//! 3. any intracellular enrichment above its threshold gives
//!    [`ClassificationLabel::TopIntracellularTarget`] when `PSM` is above the
//!    cutoff, [`ClassificationLabel::IntracellularEvidence`] otherwise
//! 4. anything else is [`ClassificationLabel::UnlocalizedEvidence`]
//!
//! Comparisons are strict: a value equal to its threshold does not exceed it.
//! A null enrichment cell never exceeds its threshold.

use crate::error::{CoreError, Result};
use crate::input::{HEXNAC_COLUMN, PSM_COLUMN};
use crate::table::{Row, Table};
use crate::thresholds::{CompartmentThreshold, CompartmentThresholds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Column holding the label in published tables
pub const LABEL_COLUMN: &str = "O-GlcNAc probability";

/// Evidence category of one protein
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClassificationLabel {
    #[serde(rename = "No HexNAc")]
    NoEvidence,
    #[serde(rename = "Extracellular HexNAc")]
    ExtracellularEvidence,
    #[serde(rename = "O-GlcNAcylated proteins")]
    IntracellularEvidence,
    #[serde(rename = "Top O-GlcNAc Targets")]
    TopIntracellularTarget,
    /// HexNAc evidence without any compartment above threshold
    #[serde(rename = "Unknown HexNAc")]
    UnlocalizedEvidence,
}

impl ClassificationLabel {
    pub const ALL: [ClassificationLabel; 5] = [
        ClassificationLabel::NoEvidence,
        ClassificationLabel::ExtracellularEvidence,
        ClassificationLabel::IntracellularEvidence,
        ClassificationLabel::TopIntracellularTarget,
        ClassificationLabel::UnlocalizedEvidence,
    ];

    /// Text written to the label column
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationLabel::NoEvidence => "No HexNAc",
            ClassificationLabel::ExtracellularEvidence => "Extracellular HexNAc",
            ClassificationLabel::IntracellularEvidence => "O-GlcNAcylated proteins",
            ClassificationLabel::TopIntracellularTarget => "Top O-GlcNAc Targets",
            ClassificationLabel::UnlocalizedEvidence => "Unknown HexNAc",
        }
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify one row
///
/// The row must carry `HexNAc` and `PSM`. Threshold columns that are absent
/// from the row read as null; use [`classify_table`] to enforce that the
/// table carries every threshold column.
pub fn classify(
    row: &Row,
    intracellular: &[CompartmentThreshold],
    extracellular: &[CompartmentThreshold],
    psm_cutoff: f64,
) -> Result<ClassificationLabel> {
    let hexnac = required_number(row, HEXNAC_COLUMN)?;
    if hexnac == 0.0 {
        return Ok(ClassificationLabel::NoEvidence);
    }

    if exceeds_any(row, extracellular)? {
        return Ok(ClassificationLabel::ExtracellularEvidence);
    }

    if exceeds_any(row, intracellular)? {
        let psm = required_number(row, PSM_COLUMN)?;
        return Ok(if psm > psm_cutoff {
            ClassificationLabel::TopIntracellularTarget
        } else {
            ClassificationLabel::IntracellularEvidence
        });
    }

    Ok(ClassificationLabel::UnlocalizedEvidence)
}

/// True when at least one column in the group is strictly above its threshold
///
/// Every column is read, so a malformed cell fails regardless of where it
/// sits in the group.
fn exceeds_any(row: &Row, group: &[CompartmentThreshold]) -> Result<bool> {
    let mut exceeded = false;
    for t in group {
        if let Some(value) = row.number(&t.column)? {
            exceeded |= value > t.threshold;
        }
    }
    Ok(exceeded)
}

fn required_number(row: &Row, column: &str) -> Result<f64> {
    row.number(column)?.ok_or_else(|| {
        if row.contains(column) {
            CoreError::invalid_cell(column, "null", "a value is required")
        } else {
            CoreError::missing_column(column)
        }
    })
}

/// Classify every row of a merged table
///
/// Fails before classifying anything when a threshold column, `HexNAc` or
/// `PSM` is missing from the table.
pub fn classify_table(
    table: &Table,
    thresholds: &CompartmentThresholds,
    psm_cutoff: f64,
) -> Result<Vec<ClassificationLabel>> {
    for column in [HEXNAC_COLUMN, PSM_COLUMN] {
        if !table.has_column(column) {
            return Err(CoreError::missing_column(column));
        }
    }
    thresholds.check_columns(table)?;

    let labels = table
        .rows()
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            classify(
                row,
                &thresholds.intracellular,
                &thresholds.extracellular,
                psm_cutoff,
            )
            .map_err(|e| e.at_row(idx + 1))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(rows = labels.len(), "Classified merged table");
    Ok(labels)
}

/// Classify a table and write the result into [`LABEL_COLUMN`]
pub fn annotate_table(
    table: &mut Table,
    thresholds: &CompartmentThresholds,
    psm_cutoff: f64,
) -> Result<BTreeMap<ClassificationLabel, usize>> {
    let labels = classify_table(table, thresholds, psm_cutoff)?;
    let counts = count_labels(&labels);
    table.set_column(LABEL_COLUMN, labels.iter().map(|l| l.as_str()).collect());
    Ok(counts)
}

/// Number of rows per label, every label present
pub fn count_labels(labels: &[ClassificationLabel]) -> BTreeMap<ClassificationLabel, usize> {
    let mut counts: BTreeMap<ClassificationLabel, usize> =
        ClassificationLabel::ALL.iter().map(|l| (*l, 0)).collect();
    for label in labels {
        *counts.entry(*label).or_default() += 1;
    }
    counts
}
