use crate::error::{ProcessingError, Result};
use crate::models::GlobalAnnualAnomaly;
use crate::utils::constants::{ANOMALY_COLUMN, YEAR_COLUMN};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Two-column CSV output: `year,<value column>`.
pub struct CsvWriter {
    value_column: String,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self {
            value_column: ANOMALY_COLUMN.to_string(),
        }
    }

    /// Header for the second column; absolute averages are not anomalies
    pub fn with_value_column(mut self, name: &str) -> Self {
        self.value_column = name.to_string();
        self
    }

    pub fn write_series(&self, series: &[GlobalAnnualAnomaly], path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(BufWriter::new(file));

        writer.write_record([YEAR_COLUMN, self.value_column.as_str()])?;
        for point in series {
            writer.write_record(&[point.year.to_string(), point.anomaly.to_string()])?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Reads any two-column `year,value` CSV with a header row
    pub fn read_series(&self, path: &Path) -> Result<Vec<GlobalAnnualAnomaly>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut series = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row?;
            let (Some(year), Some(value)) = (row.get(0), row.get(1)) else {
                return Err(ProcessingError::InvalidFormat(format!(
                    "row {} of {} has fewer than two columns",
                    index + 2,
                    path.display()
                )));
            };

            let year = year.parse::<i32>().map_err(|_| {
                ProcessingError::InvalidFormat(format!("invalid year '{}'", year))
            })?;
            let value = value.parse::<f64>().map_err(|_| {
                ProcessingError::InvalidFormat(format!("invalid value '{}'", value))
            })?;
            series.push(GlobalAnnualAnomaly::new(year, value));
        }

        Ok(series)
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}
