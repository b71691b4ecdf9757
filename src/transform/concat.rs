use crate::{
    data::{Cell, Value},
    error::{ReshapeError, Result},
    table::Table,
    transform::ColumnCleaner,
};

/// Concatenates `fields` row by row with `separator`, rendering nulls as
/// `null_substitute`. The joined text is trimmed and an empty result becomes
/// null. A single field is returned unchanged.
pub fn concat_fields(
    table: &Table,
    fields: &[String],
    separator: &str,
    null_substitute: &str,
) -> Result<Vec<Cell>> {
    let indices = fields
        .iter()
        .map(|field| table.column_index(field))
        .collect::<Result<Vec<_>>>()?;
    match indices.as_slice() {
        [] => Err(ReshapeError::InvalidArgument(
            "At least one field must be designated for concatenation".to_string(),
        )),
        [only] => Ok(table.rows().iter().map(|row| row[*only].clone()).collect()),
        _ => Ok(table
            .rows()
            .iter()
            .map(|row| {
                let joined = indices
                    .iter()
                    .map(|idx| match &row[*idx] {
                        Some(value) => value.as_display(),
                        None => null_substitute.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(separator);
                let trimmed = joined.trim();
                (!trimmed.is_empty()).then(|| Value::from(trimmed))
            })
            .collect()),
    }
}

/// Writes the concatenation of `fields` into `target`, adding the column when
/// it does not exist yet.
#[derive(Debug, Clone)]
pub struct Concat {
    pub target: String,
    pub fields: Vec<String>,
    pub separator: String,
    pub null_substitute: String,
}

impl Concat {
    pub fn new(target: &str, fields: Vec<String>) -> Self {
        Self {
            target: target.to_string(),
            fields,
            separator: " ".to_string(),
            null_substitute: String::new(),
        }
    }

    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    pub fn with_null_substitute(mut self, substitute: &str) -> Self {
        self.null_substitute = substitute.to_string();
        self
    }
}

impl ColumnCleaner for Concat {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn apply(&self, table: &mut Table) -> Result<()> {
        let values = concat_fields(table, &self.fields, &self.separator, &self.null_substitute)?;
        table.set_column(&self.target, values)
    }
}
