use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    MAX_VALID_TEMP, MIN_VALID_TEMP, MISSING_VALUE_SENTINEL, RAW_VALUE_SCALE,
};
use std::sync::Arc;

/// Convert a raw GHCN-M value (hundredths of a degree) to °C.
///
/// The missing-value sentinel maps to `None`.
pub fn raw_to_celsius(raw: i32) -> Option<f64> {
    if raw == MISSING_VALUE_SENTINEL {
        None
    } else {
        Some(raw as f64 / RAW_VALUE_SCALE)
    }
}

/// One station-month value in °C, `None` when the source reported it missing.
///
/// The station id is shared with the `MonthlyRecord` it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationObservation {
    pub station_id: Arc<str>,
    pub year: i32,
    pub month: u8,
    pub value: Option<f64>,
}

impl StationObservation {
    pub fn new(station_id: impl Into<Arc<str>>, year: i32, month: u8, value: Option<f64>) -> Self {
        Self {
            station_id: station_id.into(),
            year,
            month,
            value,
        }
    }

    pub fn from_raw(station_id: impl Into<Arc<str>>, year: i32, month: u8, raw: i32) -> Self {
        Self::new(station_id, year, month, raw_to_celsius(raw))
    }

    pub fn is_missing(&self) -> bool {
        self.value.is_none()
    }

    /// Zero-based month index for per-month lookup tables
    pub fn month_index(&self) -> usize {
        (self.month - 1) as usize
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=12).contains(&self.month) {
            return Err(ProcessingError::InvalidFormat(format!(
                "Month {} is outside 1..=12 for station {}",
                self.month, self.station_id
            )));
        }

        if let Some(value) = self.value {
            if !(MIN_VALID_TEMP..=MAX_VALID_TEMP).contains(&value) {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Temperature {} is outside valid range [{}, {}] for station {} ({}-{:02})",
                    value, MIN_VALID_TEMP, MAX_VALID_TEMP, self.station_id, self.year, self.month
                )));
            }
        }

        Ok(())
    }
}

/// One parsed line of a GHCN-M `.dat` file: a station-year with twelve monthly values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    pub station_id: Arc<str>,
    pub country_code: String,
    pub year: i32,
    pub element: String,
    pub values: [Option<f64>; 12],
}

impl MonthlyRecord {
    pub fn new(station_id: impl Into<Arc<str>>, year: i32, values: [Option<f64>; 12]) -> Self {
        let station_id: Arc<str> = station_id.into();
        let country_code = station_id.chars().take(2).collect();
        Self {
            station_id,
            country_code,
            year,
            element: crate::utils::constants::ELEMENT_TAVG.to_string(),
            values,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Mean of the twelve monthly values, only when none is missing
    pub fn annual_mean(&self) -> Option<f64> {
        let mut sum = 0.0;
        for value in &self.values {
            sum += (*value)?;
        }
        Some(sum / 12.0)
    }

    /// Long format: one observation per calendar month
    pub fn observations(&self) -> impl Iterator<Item = StationObservation> + '_ {
        self.values.iter().enumerate().map(move |(i, value)| StationObservation {
            station_id: Arc::clone(&self.station_id),
            year: self.year,
            month: (i + 1) as u8,
            value: *value,
        })
    }
}
