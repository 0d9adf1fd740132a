pub mod csv_writer;
pub mod json_writer;
pub mod parquet_writer;

pub use csv_writer::CsvWriter;
pub use json_writer::JsonWriter;
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};

use crate::error::{ProcessingError, Result};
use crate::models::GlobalAnnualAnomaly;
use crate::utils::constants::{ANOMALY_COLUMN, ANOMALY_KEY, TEMPERATURE_COLUMN, TEMPERATURE_KEY};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
    Parquet,
}

impl OutputFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    /// An explicit choice wins over the extension; CSV otherwise
    pub fn resolve(explicit: Option<Self>, path: &Path) -> Self {
        explicit
            .or_else(|| Self::from_path(path))
            .unwrap_or(OutputFormat::Csv)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "parquet" | "pq" => Ok(OutputFormat::Parquet),
            other => Err(ProcessingError::Config(format!(
                "Unsupported output format: {}",
                other
            ))),
        }
    }
}

/// What the second column of a written series holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeriesValue {
    #[default]
    Anomaly,
    Temperature,
}

impl SeriesValue {
    /// CSV header and Parquet field name
    pub fn column(&self) -> &'static str {
        match self {
            SeriesValue::Anomaly => ANOMALY_COLUMN,
            SeriesValue::Temperature => TEMPERATURE_COLUMN,
        }
    }

    pub fn json_key(&self) -> &'static str {
        match self {
            SeriesValue::Anomaly => ANOMALY_KEY,
            SeriesValue::Temperature => TEMPERATURE_KEY,
        }
    }
}

/// Options shared by the series-writing commands
#[derive(Debug, Clone)]
pub struct SeriesOutput {
    pub format: OutputFormat,
    pub compression: String,
    pub value: SeriesValue,
}

impl SeriesOutput {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            compression: crate::utils::constants::COMPRESSION_SNAPPY.to_string(),
            value: SeriesValue::default(),
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Self {
        self.compression = compression.to_string();
        self
    }

    pub fn with_value(mut self, value: SeriesValue) -> Self {
        self.value = value;
        self
    }

    pub fn write(&self, series: &[GlobalAnnualAnomaly], path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        match self.format {
            OutputFormat::Csv => CsvWriter::new()
                .with_value_column(self.value.column())
                .write_series(series, path)?,
            OutputFormat::Json => JsonWriter::new()
                .with_value_key(self.value.json_key())
                .write_series(series, path)?,
            OutputFormat::Parquet => ParquetWriter::new()
                .with_compression(&self.compression)?
                .with_value_column(self.value.column())
                .write_series(series, path)?,
        }

        info!(
            path = %path.display(),
            format = %self.format,
            value = self.value.column(),
            years = series.len(),
            "wrote series"
        );
        Ok(())
    }
}

/// Read a written series back, choosing the reader by extension
pub fn read_series(path: &Path) -> Result<Vec<GlobalAnnualAnomaly>> {
    match OutputFormat::resolve(None, path) {
        OutputFormat::Csv => CsvWriter::new().read_series(path),
        OutputFormat::Json => JsonWriter::new().read_series(path),
        OutputFormat::Parquet => ParquetWriter::new().read_series(path),
    }
}
