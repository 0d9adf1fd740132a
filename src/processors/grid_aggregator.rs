use crate::error::{ProcessingError, Result};
use crate::models::{AnomalyRecord, GlobalAnnualAnomaly, GridBox, GridMonthlyAnomaly};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::warn;

/// Result of the global reduction.
///
/// Years with data but zero total weight are listed in `degenerate_years`
/// instead of `anomalies`; years without any data appear in neither.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalReduction {
    pub anomalies: Vec<GlobalAnnualAnomaly>,
    pub degenerate_years: Vec<i32>,
}

/// Two-stage reduction from station anomalies to a global annual series.
pub struct GridAggregator;

impl GridAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Stage 1: unweighted mean of the station anomalies in each
    /// (gridbox, month, year). Output is sorted by gridbox, month, year.
    pub fn spatial_reduction(&self, records: &[AnomalyRecord]) -> Vec<GridMonthlyAnomaly> {
        let mut groups: BTreeMap<(GridBox, u8, i32), Vec<&AnomalyRecord>> = BTreeMap::new();
        for record in records {
            groups
                .entry((record.gridbox, record.month, record.year))
                .or_default()
                .push(record);
        }

        let groups: Vec<_> = groups.into_iter().collect();
        groups
            .par_iter()
            .map(|((gridbox, month, year), members)| {
                let sum: f64 = members.iter().map(|r| r.anomaly).sum();
                GridMonthlyAnomaly {
                    gridbox: *gridbox,
                    month: *month,
                    year: *year,
                    anomaly: sum / members.len() as f64,
                    weight: members[0].weight,
                    station_count: members.len(),
                }
            })
            .collect()
    }

    /// Stage 2: weighted mean over all (gridbox, month) records of each year.
    pub fn global_reduction(&self, grid: &[GridMonthlyAnomaly]) -> GlobalReduction {
        let mut by_year: BTreeMap<i32, Vec<&GridMonthlyAnomaly>> = BTreeMap::new();
        for record in grid {
            by_year.entry(record.year).or_default().push(record);
        }

        let mut reduction = GlobalReduction::default();
        for (year, mut records) in by_year {
            records.sort_by_key(|r| (r.gridbox, r.month));

            match Self::weighted_year_mean(year, &records) {
                Ok(anomaly) => reduction.anomalies.push(anomaly),
                Err(e) => {
                    warn!(year, error = %e, "excluding year from global series");
                    reduction.degenerate_years.push(year);
                }
            }
        }

        reduction
    }

    /// `Σ(anomaly × weight) / Σ(weight)` for one year's grid records.
    ///
    /// Fails with `DegenerateWeight` when the weights sum to zero.
    pub fn weighted_year_mean(
        year: i32,
        records: &[&GridMonthlyAnomaly],
    ) -> Result<GlobalAnnualAnomaly> {
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;

        for record in records {
            weighted_sum += record.anomaly * record.weight;
            total_weight += record.weight;
        }

        if total_weight <= 0.0 || !total_weight.is_finite() {
            return Err(ProcessingError::DegenerateWeight { year });
        }

        Ok(GlobalAnnualAnomaly::new(year, weighted_sum / total_weight))
    }
}

impl Default for GridAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(
        station_id: &str,
        label: &str,
        month: u8,
        year: i32,
        anomaly: f64,
        weight: f64,
    ) -> AnomalyRecord {
        AnomalyRecord {
            station_id: station_id.into(),
            gridbox: label.parse().unwrap(),
            month,
            year,
            anomaly,
            weight,
        }
    }

    #[test]
    fn test_two_stations_same_cell_round_trip() {
        let records = vec![
            record("A0000000001", "52.5 lat -2.5 lon", 7, 2000, 1.0, 0.05),
            record("A0000000002", "52.5 lat -2.5 lon", 7, 2000, 3.0, 0.05),
        ];
        let aggregator = GridAggregator::new();

        let grid = aggregator.spatial_reduction(&records);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid[0].anomaly, 2.0);
        assert_eq!(grid[0].station_count, 2);

        let global = aggregator.global_reduction(&grid);
        assert_eq!(global.anomalies, vec![GlobalAnnualAnomaly::new(2000, 2.0)]);
        assert!(global.degenerate_years.is_empty());
    }

    #[test]
    fn test_single_record_year_ignores_weight() {
        for weight in [0.001, 0.5, 7.0] {
            let records = vec![record(
                "A0000000001",
                "-32.5 lat 152.5 lon",
                1,
                1999,
                -0.37,
                weight,
            )];
            let aggregator = GridAggregator::new();
            let global = aggregator.global_reduction(&aggregator.spatial_reduction(&records));
            assert!((global.anomalies[0].anomaly - -0.37).abs() < 1e-12);
        }
    }

    #[test]
    fn test_cells_are_weighted_stations_are_not() {
        let records = vec![
            // three stations in a heavily weighted cell
            record("A0000000001", "2.5 lat 2.5 lon", 1, 2001, 1.0, 3.0),
            record("A0000000002", "2.5 lat 2.5 lon", 1, 2001, 1.0, 3.0),
            record("A0000000003", "2.5 lat 2.5 lon", 1, 2001, 1.0, 3.0),
            // one station in a lightly weighted cell, different month
            record("B0000000001", "72.5 lat 2.5 lon", 2, 2001, 5.0, 1.0),
        ];
        let aggregator = GridAggregator::new();
        let grid = aggregator.spatial_reduction(&records);
        assert_eq!(grid.len(), 2);

        let global = aggregator.global_reduction(&grid);
        // (1.0 * 3 + 5.0 * 1) / 4
        assert!((global.anomalies[0].anomaly - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_total_weight_is_reported() {
        let records = vec![
            record("A0000000001", "-2.5 lat -32.5 lon", 1, 1995, 0.4, 0.0),
            record("A0000000002", "52.5 lat -2.5 lon", 1, 1996, 0.4, 0.05),
        ];
        let aggregator = GridAggregator::new();
        let global = aggregator.global_reduction(&aggregator.spatial_reduction(&records));

        assert_eq!(global.anomalies.len(), 1);
        assert_eq!(global.anomalies[0].year, 1996);
        assert_eq!(global.degenerate_years, vec![1995]);

        let grid = aggregator.spatial_reduction(&records[..1]);
        let refs: Vec<&GridMonthlyAnomaly> = grid.iter().collect();
        let result = GridAggregator::weighted_year_mean(1995, &refs);
        assert!(matches!(
            result,
            Err(ProcessingError::DegenerateWeight { year: 1995 })
        ));
    }

    #[test]
    fn test_zero_weight_cell_contributes_nothing() {
        let records = vec![
            record("A0000000001", "-2.5 lat -32.5 lon", 1, 1995, 10.0, 0.0),
            record("A0000000002", "52.5 lat -2.5 lon", 1, 1995, 0.5, 0.05),
        ];
        let aggregator = GridAggregator::new();
        let global = aggregator.global_reduction(&aggregator.spatial_reduction(&records));
        assert!((global.anomalies[0].anomaly - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_reduction_is_reproducible_and_ordered() {
        let mut records = Vec::new();
        for year in [2003, 2001, 2002] {
            for (i, label) in ["52.5 lat -2.5 lon", "7.5 lat 2.5 lon", "-32.5 lat 152.5 lon"]
                .iter()
                .enumerate()
            {
                for month in 1..=12u8 {
                    let anomaly = 0.1 * month as f64 + 0.01 * i as f64 + 0.001 * year as f64;
                    records.push(record("S", label, month, year, anomaly, 0.1 + i as f64));
                    records.push(record("T", label, month, year, anomaly / 3.0, 0.1 + i as f64));
                }
            }
        }

        let aggregator = GridAggregator::new();
        let first = aggregator.global_reduction(&aggregator.spatial_reduction(&records));
        let second = aggregator.global_reduction(&aggregator.spatial_reduction(&records));

        assert_eq!(first, second);
        let years: Vec<i32> = first.anomalies.iter().map(|a| a.year).collect();
        assert_eq!(years, vec![2001, 2002, 2003]);

        let grid = aggregator.spatial_reduction(&records);
        let keys: Vec<_> = grid.iter().map(|g| (g.gridbox, g.month, g.year)).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }
}
