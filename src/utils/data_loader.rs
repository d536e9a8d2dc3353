//! Data loading utilities
//!
//! Uploads are read with every column as a string so categorical codes
//! such as `t`/`f` or `1`/`2` stay tokens instead of becoming numbers.

use crate::error::{LabError, Result};
use polars::prelude::*;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Loader for delimited text tables
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Field separator; `None` picks one from the file name
    separator: Option<u8>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self { separator: None }
    }

    /// Force a field separator instead of guessing from the extension
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Separator for a file name: tab for `.tsv`, comma otherwise
    pub fn separator_for(&self, file_name: &str) -> u8 {
        self.separator.unwrap_or_else(|| {
            if file_name.to_ascii_lowercase().ends_with(".tsv") {
                b'\t'
            } else {
                b','
            }
        })
    }

    /// Load a delimited file from disk
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let name = path.to_string_lossy();
        let file = File::open(path)?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_parse_options(CsvParseOptions::default().with_separator(self.separator_for(&name)))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| malformed(&name, e))?;

        debug!(path = %name, rows = df.height(), cols = df.width(), "Loaded table");
        Ok(df)
    }

    /// Load an uploaded file held in memory; `file_name` only picks the separator
    pub fn load_bytes(&self, bytes: &[u8], file_name: &str) -> Result<DataFrame> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(LabError::InputValidation(format!(
                "uploaded file '{}' is empty",
                file_name
            )));
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_parse_options(
                CsvParseOptions::default().with_separator(self.separator_for(file_name)),
            )
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()
            .map_err(|e| malformed(file_name, e))?;

        debug!(file = file_name, rows = df.height(), cols = df.width(), "Loaded upload");
        Ok(df)
    }
}

fn malformed(name: &str, err: PolarsError) -> LabError {
    LabError::InputValidation(format!("could not parse '{}' as a delimited table: {}", name, err))
}

/// Save DataFrame to disk
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV
    pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file).finish(df)?;
        Ok(())
    }
}
