//! In-memory, row-major table model shared by every reshaping step.
//!
//! A [`Table`] owns an ordered list of uniquely named columns and rows of
//! [`Cell`]s. Reshaping operations borrow it immutably; only the cleaners in
//! [`crate::transform`] mutate it, and always keep the row count intact.

use std::collections::{HashMap, HashSet};

use crate::{
    data::{Cell, Value},
    error::{ReshapeError, Result},
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates an empty table with the given column names.
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(ReshapeError::InvalidArgument(format!(
                    "Duplicate column name '{name}'"
                )));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let mut table = Self::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Builds a text-only table; empty strings become nulls.
    pub fn from_text_rows(columns: &[&str], rows: &[&[&str]]) -> Result<Self> {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|raw| (!raw.is_empty()).then(|| Value::from(*raw)))
                    .collect()
            })
            .collect();
        Self::from_rows(columns, rows)
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ReshapeError::InvalidArgument(format!(
                "Row {} has {} cell(s) but the table has {} column(s)",
                self.rows.len() + 1,
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ReshapeError::field_not_found(name))
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        &self.rows[row][column]
    }

    /// Returns the cells of a single column in row order.
    pub fn column_cells(&self, name: &str) -> Result<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Applies `f` to every cell of the column at `column`.
    pub fn map_column<F>(&mut self, column: usize, mut f: F)
    where
        F: FnMut(&mut Cell),
    {
        for row in &mut self.rows {
            f(&mut row[column]);
        }
    }

    /// Replaces the column `name` with `values`, appending it when absent.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(ReshapeError::InvalidArgument(format!(
                "Column '{name}' has {} value(s) but the table has {} row(s)",
                values.len(),
                self.rows.len()
            )));
        }
        match self.columns.iter().position(|c| c == name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Fails with [`ReshapeError::KeyConstraintViolation`] unless every
    /// non-null value of `key_field` occurs on exactly one row.
    pub fn ensure_unique_key(&self, key_field: &str) -> Result<()> {
        let key_idx = self.column_index(key_field)?;
        let mut counts: HashMap<&Value, usize> = HashMap::new();
        for row in &self.rows {
            if let Some(key) = &row[key_idx] {
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        // Report the first offending key in row order so errors are stable.
        for row in &self.rows {
            if let Some(key) = &row[key_idx] {
                let count = counts[key];
                if count > 1 {
                    return Err(ReshapeError::KeyConstraintViolation {
                        field: key_field.to_string(),
                        key: key.as_display(),
                        count,
                    });
                }
            }
        }
        Ok(())
    }

    /// Sets `field` on the single row identified by `key`. The key column must
    /// be unique; otherwise nothing is written.
    pub fn update_by_key(
        &mut self,
        key_field: &str,
        key: &Value,
        field: &str,
        value: Cell,
    ) -> Result<bool> {
        self.ensure_unique_key(key_field)?;
        let key_idx = self.column_index(key_field)?;
        let field_idx = self.column_index(field)?;
        let target = self
            .rows
            .iter_mut()
            .find(|row| row[key_idx].as_ref() == Some(key));
        match target {
            Some(row) => {
                row[field_idx] = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_duplicate_columns() {
        let err = Table::new(vec!["a".into(), "a".into()]).unwrap_err();
        assert!(matches!(err, ReshapeError::InvalidArgument(_)));
    }

    #[test]
    fn push_row_rejects_ragged_rows() {
        let mut table = Table::new(vec!["a".into(), "b".into()]).unwrap();
        assert!(table.push_row(vec![None]).is_err());
        assert!(table.push_row(vec![None, Some(Value::from("x"))]).is_ok());
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn column_index_reports_missing_field() {
        let table = Table::from_text_rows(&["key"], &[&["1"]]).unwrap();
        let err = table.column_index("nope").unwrap_err();
        assert!(matches!(err, ReshapeError::FieldNotFound { ref field } if field == "nope"));
    }

    #[test]
    fn set_column_appends_and_replaces() {
        let mut table = Table::from_text_rows(&["key"], &[&["1"], &["2"]]).unwrap();
        table
            .set_column("extra", vec![Some(Value::from("x")), None])
            .unwrap();
        assert_eq!(table.columns(), &["key".to_string(), "extra".to_string()]);
        table.set_column("extra", vec![None, None]).unwrap();
        assert!(table.column_cells("extra").unwrap().iter().all(|c| c.is_none()));
        assert!(table.set_column("extra", vec![None]).is_err());
    }

    #[test]
    fn update_by_key_requires_unique_keys_and_leaves_table_untouched() {
        let mut table =
            Table::from_text_rows(&["key", "val"], &[&["a", "1"], &["a", "2"], &["b", "3"]])
                .unwrap();
        let before = table.clone();
        let err = table
            .update_by_key("key", &Value::from("b"), "val", None)
            .unwrap_err();
        assert!(matches!(
            err,
            ReshapeError::KeyConstraintViolation { ref key, count: 2, .. } if key == "a"
        ));
        assert_eq!(table, before);
    }

    #[test]
    fn update_by_key_writes_single_row() {
        let mut table = Table::from_text_rows(&["key", "val"], &[&["a", "1"], &["b", "3"]]).unwrap();
        let updated = table
            .update_by_key("key", &Value::from("b"), "val", Some(Value::from("9")))
            .unwrap();
        assert!(updated);
        assert_eq!(table.cell(1, 1), &Some(Value::from("9")));
        let missing = table
            .update_by_key("key", &Value::from("zz"), "val", None)
            .unwrap();
        assert!(!missing);
    }
}
