use anyhow::{Context, Result};
use itertools::Itertools;
use log::{debug, info};

use crate::{
    LoadedInput,
    cli::ProfileArgs,
    group::KeyGroups,
    load_input,
    plan::ReshapePlan,
    profile::{REPORT_HEADERS, multivalued_keys, profile_uniques},
    render, transform,
};

pub fn execute(args: &ProfileArgs) -> Result<()> {
    let mut plan = ReshapePlan::load_optional(args.plan.as_deref())?;
    plan.apply_overrides(args.key.as_deref(), &args.columns, None);
    let key = plan.require_key()?;
    let fields = plan.require_fields()?;

    let LoadedInput { mut table, .. } = load_input(&args.input, &plan)?;
    let cleaners = plan.build_cleaners().context("Building cleaners from plan")?;
    transform::apply_all(&mut table, &cleaners).context("Applying plan cleaners")?;

    let groups = KeyGroups::build(&table, key)
        .with_context(|| format!("Grouping rows by key column '{key}'"))?;
    let profile = profile_uniques(&table, &groups, fields)
        .with_context(|| format!("Profiling {} column(s)", fields.len()))?;

    if args.json {
        println!("{}", profile.to_json().context("Serializing profile as JSON")?);
    } else {
        let headers = REPORT_HEADERS.iter().map(|h| h.to_string()).collect_vec();
        render::print_rows(&headers, &profile.report_rows());
    }

    if let Some(path) = &args.report {
        profile
            .write_csv_path(path)
            .with_context(|| format!("Writing profile report to {path:?}"))?;
        info!("Profile report written to {:?}", path);
    }

    for (field, stats) in profile.iter() {
        if stats.is_single_valued() {
            continue;
        }
        let multiples = multivalued_keys(&table, &groups, field)?;
        if args.show_multiples {
            println!();
            println!("{} key(s) with multiple values for '{}':", multiples.len(), field);
            for (key_value, values) in &multiples {
                println!(
                    "  {}: {}",
                    key_value,
                    values.iter().map(|v| v.as_display()).join(", ")
                );
            }
        } else {
            debug!(
                "{} key(s) carry multiple values for '{}'",
                multiples.len(),
                field
            );
        }
    }

    info!(
        "Profiled {} column(s) over {} key(s)",
        profile.len(),
        groups.len()
    );
    Ok(())
}
