use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Profile and widen denormalized CSV files into one row per key",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report how many distinct values each column carries per key
    Profile(ProfileArgs),
    /// Reshape a CSV file so each key occupies exactly one row
    Widen(WidenArgs),
    /// Nullify junk values or concatenate columns before widening
    Clean(CleanArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input CSV file (use '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Additional tokens to load as null, such as `NA` (repeatable)
    #[arg(long = "null-value", action = clap::ArgAction::Append)]
    pub null_values: Vec<String>,
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter for the output file (defaults to the input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding for the output file (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// YAML plan supplying key, columns and null tokens
    #[arg(long)]
    pub plan: Option<PathBuf>,
    /// Column identifying the entity each row belongs to
    #[arg(short = 'k', long = "key")]
    pub key: Option<String>,
    /// Comma-separated list of columns to profile (repeatable)
    #[arg(short = 'C', long = "columns", action = clap::ArgAction::Append)]
    pub columns: Vec<String>,
    /// Write the profile report as CSV to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
    /// Print the profile as JSON instead of a table
    #[arg(long)]
    pub json: bool,
    /// List keys carrying more than one distinct value per column
    #[arg(long = "show-multiples")]
    pub show_multiples: bool,
}

#[derive(Debug, Args)]
pub struct WidenArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    /// YAML plan supplying key, columns, limit and cleaners
    #[arg(long)]
    pub plan: Option<PathBuf>,
    /// Column identifying the entity each row belongs to
    #[arg(short = 'k', long = "key")]
    pub key: Option<String>,
    /// Comma-separated list of columns to carry into the output (repeatable)
    #[arg(short = 'C', long = "columns", action = clap::ArgAction::Append)]
    pub columns: Vec<String>,
    /// Maximum number of widened columns per field (defaults to 10)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Write the profile report that drove the reshape to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
    /// Null values without letters or digits in the widened columns first
    #[arg(long = "nullify-non-alnum")]
    pub nullify_non_alnum: bool,
    /// Render the result as a table on stdout instead of CSV
    #[arg(long)]
    pub table: bool,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    /// YAML plan whose cleaners run before any given on the command line
    #[arg(long)]
    pub plan: Option<PathBuf>,
    /// Restrict nullifying cleaners to this comma-separated list of columns
    #[arg(short = 'C', long = "columns", action = clap::ArgAction::Append)]
    pub columns: Vec<String>,
    /// Null values without letters or digits
    #[arg(long = "nullify-non-alnum")]
    pub nullify_non_alnum: bool,
    /// Null values matching this regular expression (repeatable)
    #[arg(long = "nullify-pattern", action = clap::ArgAction::Append)]
    pub nullify_patterns: Vec<String>,
    /// Null values equal to this string (repeatable)
    #[arg(long = "blacklist", action = clap::ArgAction::Append)]
    pub blacklist: Vec<String>,
    /// Concatenated column of the form `name=col_a,col_b` (repeatable)
    #[arg(long = "concat", action = clap::ArgAction::Append)]
    pub concat: Vec<String>,
    /// Separator placed between concatenated values
    #[arg(long, default_value = " ")]
    pub separator: String,
    /// Phone column to normalize to national numbers
    #[arg(long = "phone")]
    pub phone: Option<String>,
    /// Region code used to parse phone numbers, such as `US` or `CA`
    #[arg(long = "phone-region", requires = "phone")]
    pub phone_region: Option<String>,
    /// Column holding a per-row region code; `--phone-region` is the fallback
    #[arg(long = "phone-region-column", requires = "phone")]
    pub phone_region_column: Option<String>,
    /// Write normalized phone numbers to this column instead of in place
    #[arg(long = "phone-target", requires = "phone")]
    pub phone_target: Option<String>,
    /// Column that must be unique before phone numbers are written
    #[arg(long = "phone-key", requires = "phone")]
    pub phone_key: Option<String>,
    /// Keep values that cannot be parsed as phone numbers instead of nulling them
    #[arg(long = "keep-unparseable-phones", requires = "phone")]
    pub keep_unparseable_phones: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
