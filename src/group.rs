//! Group-by-key layer shared by profiling and widening.
//!
//! Grouping is done once per invocation; the profiler and the widener both
//! read the same [`KeyGroups`] so their per-key distinct counts can never
//! diverge.

use indexmap::{IndexMap, IndexSet};
use log::warn;

use crate::{
    data::Value,
    error::Result,
    table::Table,
};

/// Row indices per key, keys in first-occurrence order.
///
/// Rows whose key is null belong to no group: they are counted in
/// [`KeyGroups::skipped_null_keys`], reported with a warning and never reach
/// a profile or a widened table. This differs from grouping that treats null
/// as a key of its own, which would emit one extra row for them.
#[derive(Debug, Clone)]
pub struct KeyGroups {
    key_field: String,
    groups: IndexMap<Value, Vec<usize>>,
    skipped_null_keys: usize,
}

impl KeyGroups {
    pub fn build(table: &Table, key_field: &str) -> Result<Self> {
        let key_index = table.column_index(key_field)?;
        let mut groups: IndexMap<Value, Vec<usize>> = IndexMap::new();
        let mut skipped_null_keys = 0usize;
        for (row_idx, row) in table.rows().iter().enumerate() {
            match &row[key_index] {
                Some(key) => groups.entry(key.clone()).or_default().push(row_idx),
                None => skipped_null_keys += 1,
            }
        }
        if skipped_null_keys > 0 {
            warn!(
                "Skipped {} row(s) with an empty '{}' key",
                skipped_null_keys, key_field
            );
        }
        Ok(Self {
            key_field: key_field.to_string(),
            groups,
            skipped_null_keys,
        })
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn skipped_null_keys(&self) -> usize {
        self.skipped_null_keys
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.groups.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &[usize])> {
        self.groups.iter().map(|(key, rows)| (key, rows.as_slice()))
    }

    /// Distinct non-null values of column `field_index` for each key, in
    /// encounter order. Keys whose values are all null yield an empty set.
    pub fn distinct_values<'t>(
        &'t self,
        table: &'t Table,
        field_index: usize,
    ) -> impl Iterator<Item = (&'t Value, IndexSet<&'t Value>)> + 't {
        self.groups.iter().map(move |(key, rows)| {
            let values = rows
                .iter()
                .filter_map(|row| table.cell(*row, field_index).as_ref())
                .collect::<IndexSet<_>>();
            (key, values)
        })
    }

    /// Number of distinct non-null values per key, in key order.
    pub fn distinct_counts(&self, table: &Table, field_index: usize) -> Vec<usize> {
        self.distinct_values(table, field_index)
            .map(|(_, values)| values.len())
            .collect()
    }
}
