//! Elastic plain-text rendering of tables for terminal output.

use std::{borrow::Cow, fmt::Write as _};

use crate::{data::Cell, table::Table};

const NULL_MARKER: &str = "<null>";
const COLUMN_GAP: &str = "  ";

/// Renders `headers` and string `rows` as left-aligned columns separated by two
/// spaces, with a dashed separator under the header line.
pub fn render_rows(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h).max(1)).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }

    let mut output = String::new();
    push_line(&mut output, headers.iter().map(String::as_str), &widths);
    let dashes: Vec<String> = widths.iter().map(|w| "-".repeat((*w).max(3))).collect();
    let dash_widths: Vec<usize> = widths.iter().map(|w| (*w).max(3)).collect();
    push_line(&mut output, dashes.iter().map(String::as_str), &dash_widths);
    for row in rows {
        push_line(&mut output, row.iter().map(String::as_str), &widths);
    }
    output
}

/// Renders a [`Table`], showing nulls as `<null>`. `limit` caps the number of
/// data rows (0 renders everything).
pub fn render_table(table: &Table, limit: usize) -> String {
    let take = if limit == 0 { table.row_count() } else { limit };
    let rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .take(take)
        .map(|row| row.iter().map(display_cell).collect())
        .collect();
    render_rows(table.columns(), &rows)
}

pub fn print_rows(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_rows(headers, rows));
}

pub fn print_table(table: &Table, limit: usize) {
    print!("{}", render_table(table, limit));
}

fn display_cell(cell: &Cell) -> String {
    match cell {
        Some(value) => value.as_display(),
        None => NULL_MARKER.to_string(),
    }
}

fn push_line<'a>(output: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| {
            let clean = sanitize_cell(cell);
            let padding = width.saturating_sub(display_width(&clean));
            format!("{clean}{}", " ".repeat(padding))
        })
        .collect();
    let line = padded.join(COLUMN_GAP);
    let _ = writeln!(output, "{}", line.trim_end_matches(' '));
}

// ANSI colour sequences take no space on screen.
fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
