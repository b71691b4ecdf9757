use anyhow::{Context, Result};
use log::info;

use crate::{
    LoadedInput,
    cli::CleanArgs,
    io_utils, load_input,
    plan::{CleanerSpec, ReshapePlan},
    transform,
};

/// Plan cleaners first, then the command-line ones in flag order:
/// non-alphanumeric, patterns, blacklist, concatenations, phone numbers.
fn collect_specs(args: &CleanArgs, plan: &ReshapePlan) -> Result<Vec<CleanerSpec>> {
    let fields = args
        .columns
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();

    let mut specs = plan.cleaners.clone();
    if args.nullify_non_alnum {
        specs.push(CleanerSpec::NullifyNonAlphanumeric {
            fields: fields.clone(),
        });
    }
    for pattern in &args.nullify_patterns {
        specs.push(CleanerSpec::NullifyPattern {
            pattern: pattern.clone(),
            fields: fields.clone(),
        });
    }
    if !args.blacklist.is_empty() {
        specs.push(CleanerSpec::Blacklist {
            values: args.blacklist.clone(),
            fields: fields.clone(),
        });
    }
    for entry in &args.concat {
        specs.push(CleanerSpec::parse_concat(entry, &args.separator)?);
    }
    if let Some(field) = &args.phone {
        if args.phone_region.is_none() && args.phone_region_column.is_none() {
            return Err(anyhow::anyhow!(
                "--phone needs --phone-region or --phone-region-column"
            ));
        }
        specs.push(CleanerSpec::NormalizePhone {
            field: field.clone(),
            key: args.phone_key.clone(),
            target: args.phone_target.clone(),
            region: args.phone_region.clone(),
            region_field: args.phone_region_column.clone(),
            use_original_on_error: args.keep_unparseable_phones,
        });
    }
    Ok(specs)
}

pub fn execute(args: &CleanArgs) -> Result<()> {
    let plan = ReshapePlan::load_optional(args.plan.as_deref())?;
    let specs = collect_specs(args, &plan)?;
    if specs.is_empty() {
        return Err(anyhow::anyhow!(
            "No cleaners requested (use --nullify-non-alnum, --nullify-pattern, --blacklist, --concat, --phone or a plan)"
        ));
    }
    let cleaners = specs
        .iter()
        .map(CleanerSpec::build)
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Building cleaners")?;

    let LoadedInput {
        mut table,
        delimiter,
    } = load_input(&args.input, &plan)?;
    transform::apply_all(&mut table, &cleaners).context("Applying cleaners")?;

    let output_path = args.output.output.as_deref();
    let output_delimiter =
        io_utils::resolve_output_delimiter(output_path, args.output.output_delimiter, delimiter);
    let encoding = io_utils::resolve_encoding(args.output.output_encoding.as_deref())?;
    io_utils::write_table(&table, output_path, output_delimiter, encoding)
        .context("Writing cleaned table")?;
    info!(
        "Applied {} cleaner(s) to {} row(s)",
        cleaners.len(),
        table.row_count()
    );
    Ok(())
}
