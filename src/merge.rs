//! Left-joins per-field intermediate tables onto the unique-key skeleton.

use std::collections::HashMap;

use crate::{
    data::{Cell, Value},
    error::Result,
    table::Table,
};

/// Intermediate result for one requested field: at most one row per key.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTable {
    pub field: String,
    pub columns: Vec<String>,
    rows: Vec<(Value, Vec<Cell>)>,
}

impl FieldTable {
    pub fn new(field: &str, columns: Vec<String>) -> Self {
        Self {
            field: field.to_string(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, key: Value, cells: Vec<Cell>) {
        debug_assert_eq!(cells.len(), self.columns.len());
        self.rows.push((key, cells));
    }

    pub fn rows(&self) -> &[(Value, Vec<Cell>)] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&[Cell]> {
        self.rows
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, cells)| cells.as_slice())
    }

    fn lookup(&self) -> HashMap<&Value, &[Cell]> {
        let mut lookup = HashMap::with_capacity(self.rows.len());
        for (key, cells) in &self.rows {
            if lookup.insert(key, cells.as_slice()).is_some() {
                panic!(
                    "field table '{}' holds key '{}' more than once; per-field tables must be one row per key",
                    self.field, key
                );
            }
        }
        lookup
    }
}

/// Builds the final table: `key_field` first, then every part's columns in
/// order. Every skeleton key yields exactly one row; keys missing from a part
/// get null cells for its columns.
///
/// # Panics
///
/// Panics when a part holds the same key twice.
pub fn merge_all(key_field: &str, skeleton: &[Value], parts: &[FieldTable]) -> Result<Table> {
    let mut columns = vec![key_field.to_string()];
    for part in parts {
        columns.extend(part.columns.iter().cloned());
    }
    let mut merged = Table::new(columns)?;

    let lookups: Vec<HashMap<&Value, &[Cell]>> = parts.iter().map(FieldTable::lookup).collect();
    for key in skeleton {
        let mut row = Vec::with_capacity(merged.column_count());
        row.push(Some(key.clone()));
        for (part, lookup) in parts.iter().zip(&lookups) {
            match lookup.get(key) {
                Some(cells) => row.extend(cells.iter().cloned()),
                None => row.extend(std::iter::repeat_n(None, part.columns.len())),
            }
        }
        merged.push_row(row)?;
    }
    Ok(merged)
}
