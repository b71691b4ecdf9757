pub mod clean_cmd;
pub mod cli;
pub mod data;
pub mod error;
pub mod group;
pub mod io_utils;
pub mod merge;
pub mod plan;
pub mod profile;
pub mod profile_cmd;
pub mod render;
pub mod table;
pub mod transform;
pub mod widen;
pub mod widen_cmd;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, InputArgs},
    plan::ReshapePlan,
    table::Table,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_widen", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Profile(args) => profile_cmd::execute(&args),
        Commands::Widen(args) => widen_cmd::execute(&args),
        Commands::Clean(args) => clean_cmd::execute(&args),
    }
}

/// Table loaded for a command along with the delimiter it was read with.
pub(crate) struct LoadedInput {
    pub table: Table,
    pub delimiter: u8,
}

/// Reads the command input, treating the plan's null tokens and any
/// `--null-value` flags as nulls.
pub(crate) fn load_input(args: &InputArgs, plan: &ReshapePlan) -> Result<LoadedInput> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let mut null_tokens = plan.null_values.clone();
    null_tokens.extend(args.null_values.iter().cloned());
    debug!("Null tokens: {:?}", null_tokens);
    info!(
        "Reading '{}' with delimiter '{}' ({})",
        args.input.display(),
        printable_delimiter(delimiter),
        encoding.name()
    );
    let table = io_utils::read_table(&args.input, delimiter, encoding, &null_tokens)
        .with_context(|| format!("Loading input {:?}", args.input))?;
    info!(
        "Loaded {} row(s) across {} column(s)",
        table.row_count(),
        table.column_count()
    );
    Ok(LoadedInput { table, delimiter })
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
