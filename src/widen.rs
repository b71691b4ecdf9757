//! Reshapes a table with repeated keys into one row per key.
//!
//! Fields whose profile shows at most one distinct value per key are
//! collapsed; the rest are widened into `field, field_1, … field_{n-1}` where
//! `n = min(max_uniques, limit)`. Values land in columns in the order they are
//! first encountered while scanning the key's rows, so output is reproducible
//! for a fixed input row order. Distinct values beyond `n` are dropped.

use std::collections::HashSet;

use log::{debug, info};

use crate::{
    data::Value,
    error::{ReshapeError, Result},
    group::KeyGroups,
    merge::{FieldTable, merge_all},
    profile::{FieldProfile, UniquesProfile, profile_uniques},
    table::Table,
};

pub const DEFAULT_LIMIT: usize = 10;

/// How a requested field is carried into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// At most one distinct value per key: deduplicate into a single column.
    Trivial,
    /// Several values per key: spread across `columns` widened columns.
    Multivalued { columns: usize },
}

impl FieldShape {
    pub fn from_profile(stats: &FieldProfile, limit: usize) -> Self {
        if stats.is_single_valued() {
            FieldShape::Trivial
        } else {
            FieldShape::Multivalued {
                columns: stats.max_uniques.min(limit),
            }
        }
    }

    pub fn column_count(&self) -> usize {
        match self {
            FieldShape::Trivial => 1,
            FieldShape::Multivalued { columns } => *columns,
        }
    }
}

/// Result of [`widen_multivalues`]: the reshaped table plus the profile that
/// drove it.
#[derive(Debug, Clone)]
pub struct WidenOutcome {
    pub table: Table,
    pub profile: UniquesProfile,
}

/// Name of the `index`-th widened column of `field`.
pub fn widened_column_name(field: &str, index: usize) -> String {
    if index == 0 {
        field.to_string()
    } else {
        format!("{field}_{index}")
    }
}

/// Distinct keys in first-occurrence order.
pub fn unique_keys(groups: &KeyGroups) -> Vec<Value> {
    groups.keys().cloned().collect()
}

pub fn unique_keys_for(table: &Table, key_field: &str) -> Result<Vec<Value>> {
    let groups = KeyGroups::build(table, key_field)?;
    Ok(unique_keys(&groups))
}

/// Deduplicates `field` to one value per key. Keys with only nulls are left
/// out; a key with more than one distinct value is a
/// [`ReshapeError::KeyConstraintViolation`].
/// Index of `field` in `table`, checking that `groups` was built from one of
/// its columns and that `field` is not that key.
fn grouped_field_index(table: &Table, groups: &KeyGroups, field: &str) -> Result<usize> {
    table.column_index(groups.key_field())?;
    if field == groups.key_field() {
        return Err(ReshapeError::InvalidArgument(format!(
            "Key column '{field}' cannot also be widened"
        )));
    }
    table.column_index(field)
}

pub fn collapse(table: &Table, groups: &KeyGroups, field: &str) -> Result<FieldTable> {
    let field_index = grouped_field_index(table, groups, field)?;
    let mut output = FieldTable::new(field, vec![field.to_string()]);
    for (key, values) in groups.distinct_values(table, field_index) {
        match values.len() {
            0 => {}
            1 => {
                let value = values.into_iter().next().cloned();
                output.push(key.clone(), vec![value]);
            }
            count => {
                return Err(ReshapeError::KeyConstraintViolation {
                    field: field.to_string(),
                    key: key.as_display(),
                    count,
                });
            }
        }
    }
    Ok(output)
}

/// Fixed-capacity, insertion-ordered set of values for one key.
struct SlotList<'t> {
    slots: Vec<&'t Value>,
    capacity: usize,
    overflow: HashSet<&'t Value>,
}

impl<'t> SlotList<'t> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            overflow: HashSet::new(),
        }
    }

    fn offer(&mut self, value: &'t Value) {
        if self.slots.contains(&value) {
            return;
        }
        if self.slots.len() < self.capacity {
            self.slots.push(value);
        } else {
            self.overflow.insert(value);
        }
    }

    fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn dropped(&self) -> usize {
        self.overflow.len()
    }

    fn into_cells(self) -> Vec<Option<Value>> {
        let mut cells: Vec<Option<Value>> = self.slots.into_iter().cloned().map(Some).collect();
        cells.resize(self.capacity, None);
        cells
    }
}

/// Spreads the distinct values of `field` across `min(max_uniques, limit)`
/// columns. `profile` must describe `table` as it is now; it is not
/// recomputed here.
pub fn widen_field(
    table: &Table,
    groups: &KeyGroups,
    field: &str,
    profile: &UniquesProfile,
    limit: usize,
) -> Result<FieldTable> {
    if limit == 0 {
        return Err(ReshapeError::InvalidArgument(
            "Widening limit must be at least 1".to_string(),
        ));
    }
    let stats = profile.require(field)?;
    let field_index = grouped_field_index(table, groups, field)?;
    let capacity = stats.max_uniques.min(limit);
    let columns = (0..capacity)
        .map(|idx| widened_column_name(field, idx))
        .collect();

    let mut output = FieldTable::new(field, columns);
    let mut dropped = 0usize;
    for (key, rows) in groups.iter() {
        let mut slots = SlotList::with_capacity(capacity);
        for row in rows {
            if let Some(value) = table.cell(*row, field_index) {
                slots.offer(value);
            }
        }
        if slots.is_empty() {
            continue;
        }
        dropped += slots.dropped();
        output.push(key.clone(), slots.into_cells());
    }
    if dropped > 0 {
        debug!(
            "Dropped {} value(s) of '{}' beyond the {} column limit",
            dropped, field, capacity
        );
    }
    Ok(output)
}

fn validate_request(table: &Table, key_field: &str, fields: &[String], limit: usize) -> Result<()> {
    if fields.is_empty() {
        return Err(ReshapeError::InvalidArgument(
            "At least one field must be specified for widening".to_string(),
        ));
    }
    if limit == 0 {
        return Err(ReshapeError::InvalidArgument(
            "Widening limit must be at least 1".to_string(),
        ));
    }
    table.column_index(key_field)?;
    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        table.column_index(field)?;
        if field == key_field {
            return Err(ReshapeError::InvalidArgument(format!(
                "Key column '{key_field}' cannot also be widened"
            )));
        }
        if !seen.insert(field.as_str()) {
            return Err(ReshapeError::InvalidArgument(format!(
                "Field '{field}' requested more than once"
            )));
        }
    }
    Ok(())
}

/// Profiles `fields`, then collapses or widens each of them and joins the
/// results onto the distinct keys of `key_field`.
pub fn widen_multivalues(
    table: &Table,
    key_field: &str,
    fields: &[String],
    limit: usize,
) -> Result<WidenOutcome> {
    validate_request(table, key_field, fields, limit)?;

    let groups = KeyGroups::build(table, key_field)?;
    let profile = profile_uniques(table, &groups, fields)?;
    let skeleton = unique_keys(&groups);

    let mut parts = Vec::with_capacity(fields.len());
    for field in fields {
        let shape = FieldShape::from_profile(profile.require(field)?, limit);
        debug!("Field '{}' shaped as {:?}", field, shape);
        let part = match shape {
            FieldShape::Trivial => collapse(table, &groups, field)?,
            FieldShape::Multivalued { .. } => widen_field(table, &groups, field, &profile, limit)?,
        };
        parts.push(part);
    }

    let merged = merge_all(key_field, &skeleton, &parts)?;
    info!(
        "Widened {} row(s) into {} key(s) across {} column(s)",
        table.row_count(),
        merged.row_count(),
        merged.column_count()
    );
    Ok(WidenOutcome {
        table: merged,
        profile,
    })
}
