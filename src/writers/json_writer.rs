use crate::error::{ProcessingError, Result};
use crate::models::GlobalAnnualAnomaly;
use crate::utils::constants::{ANOMALY_KEY, YEARS_KEY};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// On-disk layout: parallel `years` and value arrays, `{"years": [...], "anomalies": [...]}`
pub struct JsonWriter {
    pretty: bool,
    value_key: String,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self {
            pretty: true,
            value_key: ANOMALY_KEY.to_string(),
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_value_key(mut self, key: &str) -> Self {
        self.value_key = key.to_string();
        self
    }

    pub fn write_series(&self, series: &[GlobalAnnualAnomaly], path: &Path) -> Result<()> {
        let years: Vec<i32> = series.iter().map(|point| point.year).collect();
        let values: Vec<f64> = series.iter().map(|point| point.anomaly).collect();

        let mut document = Map::new();
        document.insert(YEARS_KEY.to_string(), serde_json::to_value(years)?);
        document.insert(self.value_key.clone(), serde_json::to_value(values)?);

        let mut writer = BufWriter::new(File::create(path)?);
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, &document)?;
        } else {
            serde_json::to_writer(&mut writer, &document)?;
        }
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Reads the configured value key, or the only other array when it is absent
    pub fn read_series(&self, path: &Path) -> Result<Vec<GlobalAnnualAnomaly>> {
        let mut document: Map<String, Value> =
            serde_json::from_reader(BufReader::new(File::open(path)?))?;

        let years: Vec<i32> = take_array(&mut document, YEARS_KEY, path)?;
        let value_key = if document.contains_key(&self.value_key) {
            self.value_key.clone()
        } else if document.len() == 1 {
            document.keys().next().cloned().unwrap_or_default()
        } else {
            return Err(ProcessingError::InvalidFormat(format!(
                "no '{}' array in {}",
                self.value_key,
                path.display()
            )));
        };
        let values: Vec<f64> = take_array(&mut document, &value_key, path)?;

        if years.len() != values.len() {
            return Err(ProcessingError::InvalidFormat(format!(
                "{} years but {} values in {}",
                years.len(),
                values.len(),
                path.display()
            )));
        }

        Ok(years
            .into_iter()
            .zip(values)
            .map(|(year, value)| GlobalAnnualAnomaly::new(year, value))
            .collect())
    }
}

fn take_array<T: DeserializeOwned>(
    document: &mut Map<String, Value>,
    key: &str,
    path: &Path,
) -> Result<Vec<T>> {
    let value = document.remove(key).ok_or_else(|| {
        ProcessingError::InvalidFormat(format!("no '{}' array in {}", key, path.display()))
    })?;
    Ok(serde_json::from_value(value)?)
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}
