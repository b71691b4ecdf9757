//! Phone-number normalization backed by libphonenumber metadata.
//!
//! Each non-null phone value is parsed against a region, taken from a region
//! column, a fixed region code, or the column with the code as fallback. A
//! number that parses and is valid for that region is replaced by its
//! national number (digits only). A number that parses but is not valid for
//! the region becomes null. A value that cannot be parsed at all becomes null,
//! or keeps its original text when `use_original_on_error` is set.

use indexmap::IndexSet;
use log::{debug, info};
use phonenumber::country;

use crate::{
    data::{Cell, Value},
    error::{ReshapeError, Result},
    table::Table,
    transform::ColumnCleaner,
};

/// Parses a region code such as `US` or `CA`. Codes are case-sensitive.
fn region_id(code: &str) -> Option<country::Id> {
    if !code.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }
    code.parse::<country::Id>().ok()
}

/// Returns the codes among `regions` that the phone metadata does not know,
/// in the order given.
pub fn unsupported_regions<'a, I>(regions: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    regions
        .into_iter()
        .filter(|code| region_id(code).is_none())
        .map(str::to_string)
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Outcome of normalizing one phone value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhoneOutcome {
    National(String),
    Invalid,
    Unparseable,
}

/// Normalizes `raw` for `region`. Without a region only numbers written with
/// an international prefix can parse, and none of them count as valid.
pub fn normalize_number(raw: &str, region: Option<country::Id>) -> PhoneOutcome {
    let number = match phonenumber::parse(region, raw) {
        Ok(number) => number,
        Err(_) => return PhoneOutcome::Unparseable,
    };
    let in_region = region.is_some() && number.country().id() == region;
    if in_region && phonenumber::is_valid(&number) {
        PhoneOutcome::National(number.national().value().to_string())
    } else {
        PhoneOutcome::Invalid
    }
}

#[derive(Debug, Clone)]
pub struct NormalizePhone {
    field: String,
    key: Option<String>,
    target: Option<String>,
    region: Option<String>,
    region_field: Option<String>,
    use_original_on_error: bool,
}

impl NormalizePhone {
    /// Normalizes `field` in place. At least one of [`Self::with_region`] or
    /// [`Self::with_region_field`] must be set before applying.
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
            key: None,
            target: None,
            region: None,
            region_field: None,
            use_original_on_error: false,
        }
    }

    /// Requires `key` to be unique before anything is written.
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    /// Writes results into `target` instead of `field`, creating it when
    /// missing. Rows with a null phone keep the target's current value.
    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    pub fn with_region_field(mut self, field: &str) -> Self {
        self.region_field = Some(field.to_string());
        self
    }

    pub fn use_original_on_error(mut self, keep: bool) -> Self {
        self.use_original_on_error = keep;
        self
    }

    fn check_regions(&self, table: &Table, region_idx: Option<usize>) -> Result<()> {
        let mut codes: Vec<String> = self.region.iter().cloned().collect();
        if let Some(idx) = region_idx {
            codes.extend(
                table
                    .rows()
                    .iter()
                    .filter_map(|row| row[idx].as_ref())
                    .map(Value::as_display),
            );
        }
        let unsupported = unsupported_regions(codes.iter().map(String::as_str));
        if unsupported.is_empty() {
            Ok(())
        } else {
            Err(ReshapeError::InvalidArgument(format!(
                "Unsupported phone region(s): {}",
                unsupported.join(", ")
            )))
        }
    }
}

impl ColumnCleaner for NormalizePhone {
    fn name(&self) -> &'static str {
        "normalize_phone"
    }

    fn apply(&self, table: &mut Table) -> Result<()> {
        if self.region.is_none() && self.region_field.is_none() {
            return Err(ReshapeError::InvalidArgument(
                "Phone normalization needs a region code or a region column".to_string(),
            ));
        }
        let phone_idx = table.column_index(&self.field)?;
        let region_idx = self
            .region_field
            .as_deref()
            .map(|field| table.column_index(field))
            .transpose()?;
        self.check_regions(table, region_idx)?;
        if let Some(key) = &self.key {
            table.ensure_unique_key(key)?;
        }
        let fallback = self.region.as_deref().and_then(region_id);

        let target = self.target.as_deref().unwrap_or(&self.field);
        let mut values: Vec<Cell> = match table.column_index(target) {
            Ok(idx) => table.rows().iter().map(|row| row[idx].clone()).collect(),
            Err(_) => vec![None; table.row_count()],
        };
        let (mut normalized, mut nulled, mut kept) = (0usize, 0usize, 0usize);
        for (row, slot) in table.rows().iter().zip(values.iter_mut()) {
            let Some(phone) = &row[phone_idx] else {
                continue;
            };
            let region = region_idx
                .and_then(|idx| row[idx].as_ref())
                .and_then(|code| region_id(&code.as_display()))
                .or(fallback);
            *slot = match normalize_number(&phone.as_display(), region) {
                PhoneOutcome::National(digits) => {
                    normalized += 1;
                    Some(Value::from(digits))
                }
                PhoneOutcome::Unparseable if self.use_original_on_error => {
                    kept += 1;
                    Some(phone.clone())
                }
                PhoneOutcome::Invalid | PhoneOutcome::Unparseable => {
                    nulled += 1;
                    None
                }
            };
        }
        table.set_column(target, values)?;
        debug!("Phone column '{}' written to '{}'", self.field, target);
        info!(
            "Normalized {} phone number(s), nulled {}, kept {} unparseable value(s)",
            normalized, nulled, kept
        );
        Ok(())
    }
}
