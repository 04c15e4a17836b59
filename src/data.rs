//! # Tabular Data
//!
//! Rows are ordered `(column, value)` lists under a header list. Input
//! adapters build datasets through [`Dataset::filtered`], which drops rows
//! whose every cell is blank.
//!
//! CSV is the one format read here; other spreadsheet formats should be
//! converted to this shape before they reach the crate.

use serde::Serialize;
use std::io::Read;
use std::path::Path;

use crate::error::FieldpressError;

/// One data row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    pub fn new<K, V, I>(cells: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            cells: cells
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw (untrimmed) cell value for a column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }

    /// True when every cell is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.trim().is_empty())
    }

    pub fn cells(&self) -> &[(String, String)] {
        &self.cells
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset from rows as given.
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    /// Build a dataset, dropping blank rows.
    pub fn filtered(headers: Vec<String>, rows: Vec<Row>) -> Self {
        let rows = rows.into_iter().filter(|row| !row.is_blank()).collect();
        Self { headers, rows }
    }

    /// Read CSV with a header line. Short rows are padded with empty cells.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, FieldpressError> {
        let mut csv = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = csv
            .headers()
            .map_err(|e| FieldpressError::Data(format!("Failed to read CSV header: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (i, record) in csv.records().enumerate() {
            let record = record.map_err(|e| {
                FieldpressError::Data(format!("Failed to read CSV row {}: {}", i + 1, e))
            })?;
            let cells = headers
                .iter()
                .enumerate()
                .map(|(col, header)| (header.clone(), record.get(col).unwrap_or("").to_string()));
            rows.push(Row::new(cells));
        }

        Ok(Self::filtered(headers, rows))
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, FieldpressError> {
        let file = std::fs::File::open(path).map_err(|e| {
            FieldpressError::Data(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Self::from_csv_reader(file)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
