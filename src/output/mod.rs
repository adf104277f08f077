use crate::error::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub mod csv;
pub mod flatten;
pub mod json;
pub mod parquet;

pub use flatten::FlatTable;

/// Serializes a flattened table to one file.
pub trait OutputWriter {
    fn write(&self, table: &FlatTable, path: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Parquet,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Parquet => "parquet",
        }
    }

    pub fn writer(&self) -> Box<dyn OutputWriter> {
        match self {
            ExportFormat::Csv => Box::new(csv::CsvOutput),
            ExportFormat::Json => Box::new(json::JsonOutput),
            ExportFormat::Parquet => Box::new(parquet::ParquetOutput),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "parquet" => Ok(ExportFormat::Parquet),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Nothing was fetched, so no file was written.
    Skipped,
    Written { path: PathBuf, records: usize },
}

impl ExportOutcome {
    pub fn records(&self) -> usize {
        match self {
            ExportOutcome::Skipped => 0,
            ExportOutcome::Written { records, .. } => *records,
        }
    }
}

pub struct Exporter {
    directory: PathBuf,
    format: String,
}

impl Exporter {
    /// `format` stays unparsed until the first export.
    pub fn new(directory: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            format: format.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Writes `features` to `<directory>/<filename>.<ext>`.
    pub fn export(&self, features: &[Value], filename: &str) -> Result<ExportOutcome> {
        if features.is_empty() {
            log::info!("No data to export for {}", filename);
            return Ok(ExportOutcome::Skipped);
        }

        let format: ExportFormat = self.format.parse()?;
        let table = FlatTable::from_features(features);
        let path = self
            .directory
            .join(format!("{}.{}", filename, format.extension()));

        format.writer().write(&table, &path)?;

        log::info!("Exported {} ({} records)", filename, table.len());
        Ok(ExportOutcome::Written {
            path,
            records: table.len(),
        })
    }
}
