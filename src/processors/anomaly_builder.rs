use crate::models::{AnomalyRecord, StationObservation};
use crate::processors::{BaselineTable, GridAssignment};
use rayon::prelude::*;
use std::sync::Arc;

/// Subtracts each station-month baseline from the observations.
pub struct AnomalyBuilder;

impl AnomalyBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Anomalies for every observation that has a value, a baseline and a
    /// gridbox. Anything else is dropped rather than emitted as a null row.
    /// Output order follows the input order.
    pub fn build(
        &self,
        observations: &[StationObservation],
        baselines: &BaselineTable,
        assignment: &GridAssignment,
    ) -> Vec<AnomalyRecord> {
        observations
            .par_iter()
            .filter_map(|observation| {
                let value = observation.value?;
                let baseline = baselines.get(&observation.station_id, observation.month)?;
                let station_cell = assignment.get(&observation.station_id)?;

                Some(AnomalyRecord {
                    station_id: Arc::clone(&observation.station_id),
                    gridbox: station_cell.cell.gridbox,
                    month: observation.month,
                    year: observation.year,
                    anomaly: value - baseline,
                    weight: station_cell.weight,
                })
            })
            .collect()
    }
}

impl Default for AnomalyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
