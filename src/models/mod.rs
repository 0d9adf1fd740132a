pub mod anomaly;
pub mod grid;
pub mod observation;
pub mod station;

pub use anomaly::{AnomalyRecord, Baseline, GlobalAnnualAnomaly, GridMonthlyAnomaly};
pub use grid::{GridBox, GridCell, LandMaskEntry, StationCell};
pub use observation::{raw_to_celsius, MonthlyRecord, StationObservation};
pub use station::StationMetadata;
