//! Field-level cleaners applied before profiling and widening.
//!
//! Every cleaner keeps the row count intact and only replaces or nulls values
//! in place (or adds a column, for [`concat::Concat`] and a
//! [`phone::NormalizePhone`] target). A chain run
//! through [`apply_all`] is all-or-nothing: a failing cleaner leaves the
//! table exactly as it was before the chain started.

pub mod cleaning;
pub mod concat;
pub mod phone;

use log::debug;

use crate::{error::Result, table::Table};

pub trait ColumnCleaner {
    /// Short label used in log output.
    fn name(&self) -> &'static str;

    fn apply(&self, table: &mut Table) -> Result<()>;
}

/// Runs `cleaners` in order on a working copy and swaps it in only when the
/// whole chain succeeds, so any failure leaves `table` as it was.
pub fn apply_all(table: &mut Table, cleaners: &[Box<dyn ColumnCleaner>]) -> Result<()> {
    let rows = table.row_count();
    let mut working = table.clone();
    for cleaner in cleaners {
        cleaner.apply(&mut working)?;
        debug_assert_eq!(working.row_count(), rows, "{} changed the row count", cleaner.name());
        debug!("Applied cleaner '{}'", cleaner.name());
    }
    *table = working;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::cleaning::{Blacklist, NullifyNonAlphanumeric};

    #[test]
    fn later_failure_rolls_back_earlier_cleaners() {
        let mut table = Table::from_text_rows(&["key", "val"], &[&["a", "---"], &["b", "x"]]).unwrap();
        let before = table.clone();
        let nullify: Box<dyn ColumnCleaner> =
            Box::new(NullifyNonAlphanumeric::new(vec!["val".to_string()]));
        let blacklist: Box<dyn ColumnCleaner> =
            Box::new(Blacklist::new(["x".to_string()], vec!["missing".to_string()]));
        let err = apply_all(&mut table, &[nullify, blacklist]).unwrap_err();
        assert!(matches!(err, crate::error::ReshapeError::FieldNotFound { .. }));
        assert_eq!(table, before);
    }

    #[test]
    fn successful_chain_is_committed() {
        let mut table = Table::from_text_rows(&["key", "val"], &[&["a", "---"], &["b", "x"]]).unwrap();
        let nullify: Box<dyn ColumnCleaner> =
            Box::new(NullifyNonAlphanumeric::new(vec!["val".to_string()]));
        apply_all(&mut table, &[nullify]).unwrap();
        assert_eq!(table.cell(0, 1), &None);
        assert_eq!(table.cell(1, 1), &Some(crate::data::Value::from("x")));
    }
}
