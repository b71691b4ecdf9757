use std::{collections::HashSet, sync::OnceLock};

use log::info;
use regex::Regex;

use crate::{
    data::{Cell, Value},
    error::Result,
    table::Table,
    transform::ColumnCleaner,
};

static NON_ALPHANUMERIC: OnceLock<Regex> = OnceLock::new();

fn non_alphanumeric() -> &'static Regex {
    NON_ALPHANUMERIC.get_or_init(|| Regex::new(r"^[^a-zA-Z0-9]*$").expect("static pattern"))
}

/// Column indices for `fields`, or every column when `fields` is empty.
fn resolve_targets(table: &Table, fields: &[String]) -> Result<Vec<usize>> {
    if fields.is_empty() {
        Ok((0..table.column_count()).collect())
    } else {
        fields.iter().map(|f| table.column_index(f)).collect()
    }
}

/// Nulls every text cell in `targets` for which `matches` holds. Numeric
/// cells are left alone. Returns the number of cells nulled.
fn nullify_text_where<F>(table: &mut Table, targets: &[usize], matches: F) -> usize
where
    F: Fn(&str) -> bool,
{
    let mut nulled = 0usize;
    for &column in targets {
        table.map_column(column, |cell: &mut Cell| {
            let hit = cell.as_ref().and_then(Value::as_text).is_some_and(&matches);
            if hit {
                *cell = None;
                nulled += 1;
            }
        });
    }
    nulled
}

/// Nulls text values with no ASCII letter or digit, such as `---` or `  `.
#[derive(Debug, Clone, Default)]
pub struct NullifyNonAlphanumeric {
    fields: Vec<String>,
}

impl NullifyNonAlphanumeric {
    /// An empty `fields` list targets every column.
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

impl ColumnCleaner for NullifyNonAlphanumeric {
    fn name(&self) -> &'static str {
        "nullify_non_alphanumeric"
    }

    fn apply(&self, table: &mut Table) -> Result<()> {
        let targets = resolve_targets(table, &self.fields)?;
        let pattern = non_alphanumeric();
        let nulled = nullify_text_where(table, &targets, |text| pattern.is_match(text));
        info!("Nulled {} value(s) without alphanumeric characters", nulled);
        Ok(())
    }
}

/// Nulls text values matching a user-supplied regular expression.
#[derive(Debug, Clone)]
pub struct NullifyPattern {
    pattern: Regex,
    fields: Vec<String>,
}

impl NullifyPattern {
    pub fn new(pattern: &str, fields: Vec<String>) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            fields,
        })
    }
}

impl ColumnCleaner for NullifyPattern {
    fn name(&self) -> &'static str {
        "nullify_pattern"
    }

    fn apply(&self, table: &mut Table) -> Result<()> {
        let targets = resolve_targets(table, &self.fields)?;
        let nulled = nullify_text_where(table, &targets, |text| self.pattern.is_match(text));
        info!(
            "Nulled {} value(s) matching /{}/",
            nulled,
            self.pattern.as_str()
        );
        Ok(())
    }
}

/// Nulls values equal to any blacklisted string.
#[derive(Debug, Clone)]
pub struct Blacklist {
    values: HashSet<String>,
    fields: Vec<String>,
}

impl Blacklist {
    pub fn new<I>(values: I, fields: Vec<String>) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            values: values.into_iter().collect(),
            fields,
        }
    }
}

impl ColumnCleaner for Blacklist {
    fn name(&self) -> &'static str {
        "blacklist"
    }

    fn apply(&self, table: &mut Table) -> Result<()> {
        let targets = resolve_targets(table, &self.fields)?;
        let mut nulled = 0usize;
        for column in targets {
            table.map_column(column, |cell| {
                let listed = cell
                    .as_ref()
                    .is_some_and(|value| self.values.contains(&value.as_display()));
                if listed {
                    *cell = None;
                    nulled += 1;
                }
            });
        }
        info!("Nulled {} blacklisted value(s)", nulled);
        Ok(())
    }
}
