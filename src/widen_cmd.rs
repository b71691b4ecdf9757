use anyhow::{Context, Result};
use log::info;

use crate::{
    LoadedInput,
    cli::WidenArgs,
    io_utils, load_input,
    plan::ReshapePlan,
    printable_delimiter, render,
    transform::{self, ColumnCleaner, cleaning::NullifyNonAlphanumeric},
    widen::widen_multivalues,
};

pub fn execute(args: &WidenArgs) -> Result<()> {
    let mut plan = ReshapePlan::load_optional(args.plan.as_deref())?;
    plan.apply_overrides(args.key.as_deref(), &args.columns, args.limit);
    let key = plan.require_key()?;
    let fields = plan.require_fields()?;
    let limit = plan.effective_limit();

    let LoadedInput {
        mut table,
        delimiter,
    } = load_input(&args.input, &plan)?;

    let mut cleaners = plan.build_cleaners().context("Building cleaners from plan")?;
    if args.nullify_non_alnum {
        let cleaner: Box<dyn ColumnCleaner> = Box::new(NullifyNonAlphanumeric::new(fields.to_vec()));
        cleaners.push(cleaner);
    }
    transform::apply_all(&mut table, &cleaners).context("Cleaning input before widening")?;

    let outcome = widen_multivalues(&table, key, fields, limit)
        .with_context(|| format!("Widening {} column(s) on key '{key}'", fields.len()))?;

    if let Some(path) = &args.report {
        outcome
            .profile
            .write_csv_path(path)
            .with_context(|| format!("Writing profile report to {path:?}"))?;
        info!("Profile report written to {:?}", path);
    }

    if args.table {
        render::print_table(&outcome.table, 0);
        return Ok(());
    }

    let output_path = args.output.output.as_deref();
    let output_delimiter =
        io_utils::resolve_output_delimiter(output_path, args.output.output_delimiter, delimiter);
    let encoding = io_utils::resolve_encoding(args.output.output_encoding.as_deref())?;
    io_utils::write_table(&outcome.table, output_path, output_delimiter, encoding)
        .context("Writing widened table")?;
    info!(
        "Wrote {} key(s) and {} column(s) to {} with delimiter '{}'",
        outcome.table.row_count(),
        outcome.table.column_count(),
        output_path
            .map(|p| format!("{p:?}"))
            .unwrap_or_else(|| "stdout".to_string()),
        printable_delimiter(output_delimiter)
    );
    Ok(())
}
