//! I/O utilities for loading and writing tables as CSV.
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override support.
//! - **Encoding**: input decoding and output encoding via `encoding_rs`,
//!   defaulting to UTF-8.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.
//! - **Nulls**: empty fields and configured null tokens load as null cells and
//!   nulls are written back as empty fields.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

use crate::{
    data::{parse_cell, render_cell},
    table::Table,
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn resolve_output_delimiter(path: Option<&Path>, provided: Option<u8>, fallback: u8) -> u8 {
    if let Some(delim) = provided {
        return delim;
    }
    if let Some(path) = path {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => return DEFAULT_TSV_DELIMITER,
            Some(ext) if ext.eq_ignore_ascii_case("csv") => return DEFAULT_CSV_DELIMITER,
            _ => {}
        }
    }
    fallback
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false)
        .from_reader(reader)
}

pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if is_dash(path) {
        Ok(Box::new(std::io::stdin().lock()))
    } else {
        Ok(Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        )))
    }
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Reads a whole CSV stream into a [`Table`].
pub fn read_table_from<R>(
    reader: R,
    delimiter: u8,
    encoding: &'static Encoding,
    null_tokens: &[String],
) -> Result<Table>
where
    R: Read,
{
    let mut reader = open_csv_reader(reader, delimiter);
    let headers = decode_record(reader.byte_headers()?, encoding).context("Decoding header row")?;
    let mut table = Table::new(headers).context("Validating header row")?;
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        let cells = decoded
            .iter()
            .map(|raw| parse_cell(raw, null_tokens))
            .collect();
        table
            .push_row(cells)
            .with_context(|| format!("Loading row {}", row_idx + 2))?;
    }
    Ok(table)
}

pub fn read_table(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    null_tokens: &[String],
) -> Result<Table> {
    let input = open_input(path)?;
    read_table_from(input, delimiter, encoding, null_tokens)
        .with_context(|| format!("Reading table from {path:?}"))
}

/// Serializes `table` as CSV bytes in `encoding`.
pub fn table_to_bytes(
    table: &Table,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .from_writer(Vec::new());
    writer
        .write_record(table.columns())
        .context("Writing headers")?;
    for (row_idx, row) in table.rows().iter().enumerate() {
        writer
            .write_record(row.iter().map(render_cell))
            .with_context(|| format!("Writing output row {}", row_idx + 2))?;
    }
    let utf8 = writer
        .into_inner()
        .map_err(|err| anyhow!("Flushing CSV buffer: {}", err.error()))?;
    if encoding == UTF_8 {
        return Ok(utf8);
    }
    let text = String::from_utf8(utf8).context("CSV output is not valid UTF-8")?;
    let (encoded, _, had_errors) = encoding.encode(&text);
    if had_errors {
        return Err(anyhow!(
            "Failed to encode output using {}",
            encoding.name()
        ));
    }
    Ok(encoded.into_owned())
}

/// Writes `table` to `path`, or stdout when `path` is `None` or `-`.
pub fn write_table(
    table: &Table,
    path: Option<&Path>,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<()> {
    let bytes = table_to_bytes(table, delimiter, encoding)?;
    let mut sink: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout().lock()),
    };
    sink.write_all(&bytes).context("Writing CSV output")?;
    sink.flush().context("Flushing CSV output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use std::path::PathBuf;

    #[test]
    fn delimiter_follows_extension_unless_overridden() {
        assert_eq!(resolve_input_delimiter(&PathBuf::from("a.tsv"), None), b'\t');
        assert_eq!(resolve_input_delimiter(&PathBuf::from("a.csv"), None), b',');
        assert_eq!(resolve_input_delimiter(&PathBuf::from("a.tsv"), Some(b';')), b';');
        assert_eq!(resolve_output_delimiter(Some(&PathBuf::from("o.tsv")), None, b','), b'\t');
        assert_eq!(resolve_output_delimiter(None, None, b'|'), b'|');
    }

    #[test]
    fn read_table_maps_empty_fields_and_tokens_to_null() {
        let input = "key,val\naa,y\nbb,\ncc,NA\n";
        let table =
            read_table_from(input.as_bytes(), b',', UTF_8, &["NA".to_string()]).unwrap();
        assert_eq!(table.columns(), &["key", "val"]);
        assert_eq!(table.cell(0, 1), &Some(Value::from("y")));
        assert_eq!(table.cell(1, 1), &None);
        assert_eq!(table.cell(2, 1), &None);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let input = "key,val\naa\n";
        assert!(read_table_from(input.as_bytes(), b',', UTF_8, &[]).is_err());
    }

    #[test]
    fn output_round_trips_through_latin1() {
        let table =
            Table::from_text_rows(&["id", "name"], &[&["1", "café"], &["2", ""]]).unwrap();
        let encoding = resolve_encoding(Some("latin1")).unwrap();
        let bytes = table_to_bytes(&table, b',', encoding).unwrap();
        assert_eq!(bytes, b"id,name\n1,caf\xe9\n2,\n".to_vec());
        let back = read_table_from(bytes.as_slice(), b',', encoding, &[]).unwrap();
        assert_eq!(back.cell(0, 1), &Some(Value::from("café")));
        assert_eq!(back.cell(1, 1), &None);
    }

    #[test]
    fn unknown_encoding_label_is_an_error() {
        assert!(resolve_encoding(Some("not-an-encoding")).is_err());
    }
}
