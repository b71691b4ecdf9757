//! Uniqueness profiling: how many distinct non-null values each field takes
//! per key.
//!
//! Equivalent to `SELECT key, COUNT(DISTINCT field) FROM t GROUP BY key`
//! aggregated with min / max / mean over the keys. The resulting
//! [`UniquesProfile`] is an immutable value; the widener consumes it as-is
//! instead of recounting.

use std::{fs::File, io::Write, path::Path};

use indexmap::IndexMap;
use itertools::{Itertools, MinMaxResult};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    data::Value,
    error::{ReshapeError, Result},
    group::KeyGroups,
    table::Table,
};

pub const REPORT_HEADERS: [&str; 4] = ["field", "max_uniques", "avg_uniques", "min_uniques"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldProfile {
    pub min_uniques: usize,
    pub max_uniques: usize,
    pub avg_uniques: f64,
}

impl FieldProfile {
    fn from_counts(counts: &[usize]) -> Self {
        let (min_uniques, max_uniques) = match counts.iter().copied().minmax() {
            MinMaxResult::NoElements => (0, 0),
            MinMaxResult::OneElement(only) => (only, only),
            MinMaxResult::MinMax(min, max) => (min, max),
        };
        let avg_uniques = if counts.is_empty() {
            0.0
        } else {
            counts.iter().sum::<usize>() as f64 / counts.len() as f64
        };
        Self {
            min_uniques,
            max_uniques,
            avg_uniques,
        }
    }

    /// True when no key carries more than one distinct value.
    pub fn is_single_valued(&self) -> bool {
        self.max_uniques <= 1
    }
}

/// Field profiles keyed by field name, in the order the fields were profiled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniquesProfile {
    fields: IndexMap<String, FieldProfile>,
}

impl UniquesProfile {
    pub fn get(&self, field: &str) -> Option<&FieldProfile> {
        self.fields.get(field)
    }

    /// Like [`UniquesProfile::get`] but reports a missing field as an error.
    pub fn require(&self, field: &str) -> Result<&FieldProfile> {
        self.fields
            .get(field)
            .ok_or_else(|| ReshapeError::field_not_found(field))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldProfile)> {
        self.fields.iter().map(|(name, stats)| (name.as_str(), stats))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// One row per field matching [`REPORT_HEADERS`].
    pub fn report_rows(&self) -> Vec<Vec<String>> {
        self.fields
            .iter()
            .map(|(name, stats)| {
                vec![
                    name.clone(),
                    stats.max_uniques.to_string(),
                    format!("{:?}", stats.avg_uniques),
                    stats.min_uniques.to_string(),
                ]
            })
            .collect()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(REPORT_HEADERS)?;
        for row in self.report_rows() {
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes the report to `path`, overwriting any existing file.
    pub fn write_csv_path(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_csv(file)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Groups `table` by `key_field` and profiles `fields`.
pub fn profile(table: &Table, key_field: &str, fields: &[String]) -> Result<UniquesProfile> {
    let groups = KeyGroups::build(table, key_field)?;
    profile_uniques(table, &groups, fields)
}

/// Profiles `fields` over already-built key groups.
pub fn profile_uniques(
    table: &Table,
    groups: &KeyGroups,
    fields: &[String],
) -> Result<UniquesProfile> {
    if fields.is_empty() {
        return Err(ReshapeError::InvalidArgument(
            "At least one field must be specified for profiling".to_string(),
        ));
    }
    let mut profiled = IndexMap::with_capacity(fields.len());
    for field in fields {
        let field_index = table.column_index(field)?;
        let counts = groups.distinct_counts(table, field_index);
        let stats = FieldProfile::from_counts(&counts);
        debug!(
            "Profiled '{}' over {} key(s): min={} max={} avg={:.4}",
            field,
            counts.len(),
            stats.min_uniques,
            stats.max_uniques,
            stats.avg_uniques
        );
        profiled.insert(field.clone(), stats);
    }
    Ok(UniquesProfile { fields: profiled })
}

/// Keys carrying more than one distinct value for `field`, with those values
/// in encounter order.
pub fn multivalued_keys(
    table: &Table,
    groups: &KeyGroups,
    field: &str,
) -> Result<Vec<(Value, Vec<Value>)>> {
    let field_index = table.column_index(field)?;
    Ok(groups
        .distinct_values(table, field_index)
        .filter(|(_, values)| values.len() > 1)
        .map(|(key, values)| (key.clone(), values.into_iter().cloned().collect()))
        .collect())
}
