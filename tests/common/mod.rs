#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv_widen::{data::Value, io_utils, table::Table};
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Loads a UTF-8, comma separated fixture with empty fields as nulls.
pub fn load_fixture(name: &str) -> Table {
    let encoding = io_utils::resolve_encoding(None).expect("utf-8 encoding");
    io_utils::read_table(&fixture_path(name), b',', encoding, &[]).expect("load fixture")
}

/// Column `name` rendered as optional strings for easy comparison.
pub fn column_strings(table: &Table, name: &str) -> Vec<Option<String>> {
    table
        .column_cells(name)
        .expect("column exists")
        .into_iter()
        .map(|cell| cell.as_ref().map(Value::as_display))
        .collect()
}

/// Builds the expected form of [`column_strings`] from literals; `""` is null.
pub fn expected(values: &[&str]) -> Vec<Option<String>> {
    values
        .iter()
        .map(|v| (!v.is_empty()).then(|| v.to_string()))
        .collect()
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Returns the path `name` would occupy inside the workspace.
    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Reads a file previously produced inside the workspace.
    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.join(name)).expect("read workspace file")
    }
}
