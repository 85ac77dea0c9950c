//! Row-aligned tables exchanged with the visualization service
//!
//! Rows are JSON objects keyed by column name, which is the shape the node
//! table endpoints accept and return. A [`Table`] also tracks its header so
//! that an empty table still knows which columns it carries.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

/// One table row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// String value of a cell, if it holds a string
    pub fn text(&self, column: &str) -> Option<&str> {
        self.0.get(column).and_then(Value::as_str)
    }

    /// Numeric value of a cell
    ///
    /// `Ok(None)` for an absent or null cell. Numeric strings are accepted
    /// because CSV-derived and service-derived rows disagree on typing.
    pub fn number(&self, column: &str) -> Result<Option<f64>> {
        match self.0.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| CoreError::invalid_cell(column, s.as_str(), "not a number")),
            Some(other) => Err(CoreError::invalid_cell(
                column,
                other.to_string(),
                "not a number",
            )),
        }
    }

    /// Keep only the cells whose column `keep` accepts
    pub fn retain<F: Fn(&str) -> bool>(&mut self, keep: F) {
        self.0.retain(|column, _| keep(column));
    }

    /// Copy every cell of `other` into this row, overwriting collisions
    pub fn overlay(&mut self, other: &Row) {
        for (column, value) in &other.0 {
            self.0.insert(column.clone(), value.clone());
        }
    }

    /// Copy the cells of `other` whose columns this row does not have yet
    pub fn fill_missing(&mut self, other: &Row) {
        for (column, value) in &other.0 {
            if !self.0.contains_key(column) {
                self.0.insert(column.clone(), value.clone());
            }
        }
    }
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Ordered rows plus the header they share
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: BTreeSet<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table whose header is the union of its rows' columns
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let columns = rows
            .iter()
            .flat_map(|row| row.columns().map(str::to_owned))
            .collect();
        Self { columns, rows }
    }

    /// Build a table with an explicit header
    pub fn with_columns<I, S>(columns: I, rows: Vec<Row>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::from_rows(rows);
        table.columns.extend(columns.into_iter().map(Into::into));
        table
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &BTreeSet<String> {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    pub fn push(&mut self, row: Row) {
        self.columns.extend(row.columns().map(str::to_owned));
        self.rows.push(row);
    }

    /// Set `column` on every row from a per-row value list
    ///
    /// `values` must be row-aligned with the table.
    pub fn set_column<V: Into<Value>>(&mut self, column: &str, values: Vec<V>) {
        debug_assert_eq!(values.len(), self.rows.len());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(column, value);
        }
        self.columns.insert(column.to_string());
    }

    /// Drop every column `keep` rejects, header included
    pub fn retain_columns<F: Fn(&str) -> bool>(&mut self, keep: F) {
        self.columns.retain(|column| keep(column));
        for row in &mut self.rows {
            row.retain(&keep);
        }
    }

    /// String values of `column`, skipping rows where it is absent
    pub fn text_values(&self, column: &str) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.text(column).map(str::to_owned))
            .collect()
    }

    /// Numeric values of `column`, skipping null cells
    pub fn number_values(&self, column: &str) -> Result<Vec<f64>> {
        if !self.has_column(column) {
            return Err(CoreError::missing_column(column));
        }

        let mut values = Vec::with_capacity(self.rows.len());
        for (idx, row) in self.rows.iter().enumerate() {
            if let Some(value) = row.number(column).map_err(|e| e.at_row(idx + 1))? {
                values.push(value);
            }
        }
        Ok(values)
    }

    /// Inner join on `self[left_key] == other[right_key]`
    ///
    /// Output follows `self`'s row order. A left row matching several right
    /// rows yields one output row per match. On column collisions the right
    /// side wins.
    pub fn inner_join(&self, other: &Table, left_key: &str, right_key: &str) -> Table {
        self.join_with(other, left_key, right_key, Row::overlay)
    }

    /// Same as [`Table::inner_join`], but the left side wins on collisions
    pub fn inner_join_keep_left(&self, other: &Table, left_key: &str, right_key: &str) -> Table {
        self.join_with(other, left_key, right_key, Row::fill_missing)
    }

    fn join_with(
        &self,
        other: &Table,
        left_key: &str,
        right_key: &str,
        merge: fn(&mut Row, &Row),
    ) -> Table {
        let mut index: HashMap<&str, Vec<&Row>> = HashMap::new();
        for row in &other.rows {
            if let Some(key) = row.text(right_key) {
                index.entry(key).or_default().push(row);
            }
        }

        let mut joined = Table {
            columns: self.columns.union(&other.columns).cloned().collect(),
            rows: Vec::new(),
        };

        for left in &self.rows {
            let Some(matches) = left.text(left_key).and_then(|key| index.get(key)) else {
                continue;
            };
            for right in matches {
                let mut row = left.clone();
                merge(&mut row, right);
                joined.rows.push(row);
            }
        }

        joined
    }
}
