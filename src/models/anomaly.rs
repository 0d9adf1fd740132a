use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::GridBox;

/// Climatological mean for one station and calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub station_id: Arc<str>,
    pub month: u8,
    pub baseline_value: f64,
}

/// Station anomaly joined with its gridbox weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub station_id: Arc<str>,
    pub gridbox: GridBox,
    pub month: u8,
    pub year: i32,
    pub anomaly: f64,
    pub weight: f64,
}

/// Mean anomaly of every station in one gridbox for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridMonthlyAnomaly {
    pub gridbox: GridBox,
    pub month: u8,
    pub year: i32,
    pub anomaly: f64,
    pub weight: f64,
    pub station_count: usize,
}

/// One point of the published series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalAnnualAnomaly {
    pub year: i32,
    pub anomaly: f64,
}

impl GlobalAnnualAnomaly {
    pub fn new(year: i32, anomaly: f64) -> Self {
        Self { year, anomaly }
    }
}
