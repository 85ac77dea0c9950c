//! Proteomics CSV export loading
//!
//! The export carries one row per protein with an identifier column, the
//! `HexNAc` and `PSM` counts, and any number of extra numeric columns
//! (typically compartment enrichments). Rows whose parsed values equal an
//! earlier row are dropped, so `2` and `2.0` or padded cells count as the same
//! value. Rows that share an identifier but differ elsewhere are kept and
//! reported, since nothing in the export says which one is right.

use crate::error::{CoreError, Result};
use crate::table::{Row, Table};
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Default name of the identifier column
pub const DEFAULT_IDENTIFIER_COLUMN: &str = "identifier";

/// HexNAc evidence count column
pub const HEXNAC_COLUMN: &str = "HexNAc";

/// Peptide-spectrum-match count column
pub const PSM_COLUMN: &str = "PSM";

/// One protein from the input export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProteinRecord {
    pub identifier: String,
    pub hexnac: f64,
    pub psm: f64,
    /// Every other column, numeric where the cell parses as a number
    pub extra: BTreeMap<String, Value>,
}

impl ProteinRecord {
    /// Render the record as a table row, identifier under `identifier_column`
    pub fn to_row(&self, identifier_column: &str) -> Row {
        let mut row = Row::new();
        for (column, value) in &self.extra {
            row.insert(column.as_str(), value.clone());
        }
        row.insert(identifier_column, self.identifier.as_str());
        row.insert(HEXNAC_COLUMN, number_value(self.hexnac));
        row.insert(PSM_COLUMN, number_value(self.psm));
        row
    }

    /// Parsed values in column order; equal keys mean duplicate rows
    fn dedup_key(&self) -> Vec<String> {
        let mut key = vec![
            self.identifier.clone(),
            self.hexnac.to_string(),
            self.psm.to_string(),
        ];
        key.extend(self.extra.values().map(Value::to_string));
        key
    }
}

/// Parsed and deduplicated input export
#[derive(Debug, Clone)]
pub struct InputTable {
    pub identifier_column: String,
    /// Header in file order
    pub columns: Vec<String>,
    pub records: Vec<ProteinRecord>,
    /// Exact duplicate rows removed while loading
    pub duplicates_dropped: usize,
}

impl InputTable {
    /// Identifiers in input order
    pub fn identifiers(&self) -> Vec<String> {
        self.records.iter().map(|r| r.identifier.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Identifiers that occur on more than one (non-identical) row
    pub fn conflicting_identifiers(&self) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in &self.records {
            *counts.entry(record.identifier.as_str()).or_default() += 1;
        }
        let mut conflicts: Vec<String> = counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(id, _)| id.to_string())
            .collect();
        conflicts.sort();
        conflicts
    }

    pub fn to_table(&self) -> Table {
        let rows = self
            .records
            .iter()
            .map(|r| r.to_row(&self.identifier_column))
            .collect();
        Table::with_columns(self.columns.iter().cloned(), rows)
    }
}

/// Load an export from disk
pub fn load_csv(path: impl AsRef<Path>, identifier_column: &str) -> Result<InputTable> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading input export");
    let file = File::open(path)?;
    read_csv(file, identifier_column)
}

/// Parse an export from any reader
pub fn read_csv<R: Read>(reader: R, identifier_column: &str) -> Result<InputTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
    let position = |name: &str| {
        columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| CoreError::missing_column(name))
    };
    let id_idx = position(identifier_column)?;
    let hexnac_idx = position(HEXNAC_COLUMN)?;
    let psm_idx = position(PSM_COLUMN)?;

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut records = Vec::new();
    let mut duplicates_dropped = 0;

    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let row = idx + 1;

        let identifier = record.get(id_idx).unwrap_or_default().trim().to_string();
        if identifier.is_empty() {
            return Err(CoreError::invalid_value(
                row,
                identifier_column,
                "",
                "identifier is empty",
            ));
        }

        let mut extra = BTreeMap::new();
        for (col_idx, cell) in record.iter().enumerate() {
            if col_idx == id_idx || col_idx == hexnac_idx || col_idx == psm_idx {
                continue;
            }
            extra.insert(columns[col_idx].clone(), parse_cell(cell));
        }

        let protein = ProteinRecord {
            identifier,
            hexnac: parse_count(record.get(hexnac_idx).unwrap_or_default(), row, HEXNAC_COLUMN)?,
            psm: parse_count(record.get(psm_idx).unwrap_or_default(), row, PSM_COLUMN)?,
            extra,
        };

        if !seen.insert(protein.dedup_key()) {
            duplicates_dropped += 1;
            continue;
        }
        records.push(protein);
    }

    if records.is_empty() {
        return Err(CoreError::EmptyInput);
    }

    let table = InputTable {
        identifier_column: identifier_column.to_string(),
        columns,
        records,
        duplicates_dropped,
    };

    let conflicts = table.conflicting_identifiers();
    if !conflicts.is_empty() {
        warn!(
            count = conflicts.len(),
            identifiers = ?conflicts,
            "Identifiers appear on several rows with differing values; all rows are kept"
        );
    }

    debug!(
        records = table.len(),
        duplicates_dropped,
        "Input export parsed"
    );
    Ok(table)
}

/// Parse a non-negative count column
fn parse_count(cell: &str, row: usize, column: &str) -> Result<f64> {
    let value: f64 = cell
        .trim()
        .parse()
        .map_err(|_| CoreError::invalid_value(row, column, cell, "not a number"))?;

    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::invalid_value(
            row,
            column,
            cell,
            "must be a non-negative number",
        ));
    }
    Ok(value)
}

fn parse_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => number_value(n),
        _ => Value::String(trimmed.to_string()),
    }
}

fn number_value(n: f64) -> Value {
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}
