#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Immutable in-memory reference tables.
//!
//! Every scorer reads its reference data through a [`Table`]: a CSV file
//! parsed once at start-up into string cells keyed by the header row.
//! Lookups by key column are exact and case-sensitive. Numeric access goes
//! through [`coerce_numeric`], which treats anything unparseable or
//! non-finite as missing rather than failing.

use std::io::Read;
use std::path::Path;

use thiserror::Error;

/// Errors from loading a reference table.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Reading the file failed.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File that could not be read.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The CSV could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file has no header row.
    #[error("Table has no header row")]
    NoHeader,

    /// A column required by the caller is absent.
    #[error("Missing column '{column}'")]
    MissingColumn {
        /// The absent column name.
        column: String,
    },
}

/// A parsed CSV table held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Loads a table from a CSV file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the file cannot be opened or parsed.
    pub fn from_csv_path(path: &Path) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_reader(file)?;
        log::info!(
            "Loaded {} rows x {} columns from {}",
            table.len(),
            table.headers.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parses a table from any CSV byte source. The first record is the
    /// header row; short rows are padded with empty cells.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the CSV is malformed or has no header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_owned())
            .collect();

        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(DatasetError::NoHeader);
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: Vec<String> = (0..headers.len())
                .map(|i| record.get(i).unwrap_or("").trim().to_owned())
                .collect();
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Column names in file order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Like [`Self::column_index`] but reports a missing column as an error.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::MissingColumn`] if no header equals `name`.
    pub fn require_column(&self, name: &str) -> Result<usize, DatasetError> {
        self.column_index(name)
            .ok_or_else(|| DatasetError::MissingColumn {
                column: name.to_owned(),
            })
    }

    /// Iterates rows in file order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row { table: self, cells })
    }

    /// Returns the first row whose `key_column` cell equals `key` exactly.
    #[must_use]
    pub fn find_row(&self, key_column: &str, key: &str) -> Option<Row<'_>> {
        let idx = self.column_index(key_column)?;
        self.rows
            .iter()
            .find(|cells| cells.get(idx).is_some_and(|cell| cell == key))
            .map(|cells| Row { table: self, cells })
    }

    /// Returns every cell of a column coerced with [`coerce_numeric`].
    #[must_use]
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|cells| cells.get(idx).and_then(|c| coerce_numeric(c)))
                .collect(),
        )
    }
}

/// A borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    cells: &'a [String],
}

impl<'a> Row<'a> {
    /// Raw cell text for `column`, or `None` if the column does not exist.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.table.column_index(column)?;
        self.cells.get(idx).map(String::as_str)
    }

    /// Raw cell text, treating empty cells as missing.
    #[must_use]
    pub fn get_non_empty(&self, column: &str) -> Option<&'a str> {
        self.get(column).filter(|s| !s.is_empty())
    }

    /// Cell coerced with [`coerce_numeric`].
    #[must_use]
    pub fn numeric(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(coerce_numeric)
    }
}

/// Parses a cell as a finite `f64`.
///
/// Empty, unparseable, `NaN` and infinite values all return `None`, so a
/// caller can decide whether missing means zero or means "skip".
#[must_use]
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
