use crate::models::{Baseline, StationObservation};
use crate::utils::constants::{BASELINE_END_YEAR, BASELINE_START_YEAR};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-station climatology, one optional mean per calendar month
#[derive(Debug, Clone, Default)]
pub struct BaselineTable {
    baselines: HashMap<Arc<str>, [Option<f64>; 12]>,
}

impl BaselineTable {
    pub fn get(&self, station_id: &str, month: u8) -> Option<f64> {
        if !(1..=12).contains(&month) {
            return None;
        }
        self.baselines
            .get(station_id)
            .and_then(|months| months[(month - 1) as usize])
    }

    /// Number of (station, month) baseline rows
    pub fn len(&self) -> usize {
        self.baselines
            .values()
            .map(|months| months.iter().filter(|m| m.is_some()).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn station_count(&self) -> usize {
        self.baselines.len()
    }
}

impl FromIterator<Baseline> for BaselineTable {
    fn from_iter<I: IntoIterator<Item = Baseline>>(rows: I) -> Self {
        let mut baselines: HashMap<Arc<str>, [Option<f64>; 12]> = HashMap::new();
        for row in rows {
            if (1..=12).contains(&row.month) {
                let months = baselines.entry(row.station_id).or_default();
                months[(row.month - 1) as usize] = Some(row.baseline_value);
            }
        }
        Self { baselines }
    }
}

/// Computes per-station, per-month means over the reference period.
pub struct BaselineCalculator {
    start_year: i32,
    end_year: i32,
}

impl BaselineCalculator {
    pub fn new() -> Self {
        Self {
            start_year: BASELINE_START_YEAR,
            end_year: BASELINE_END_YEAR,
        }
    }

    pub fn with_reference_period(start_year: i32, end_year: i32) -> Self {
        Self {
            start_year,
            end_year,
        }
    }

    pub fn reference_period(&self) -> (i32, i32) {
        (self.start_year, self.end_year)
    }

    /// Build the baseline table.
    pub fn compute(&self, observations: &[StationObservation]) -> BaselineTable {
        self.compute_rows(observations).into_iter().collect()
    }

    /// One row per (station, month) with at least one reference-period value,
    /// ordered by station then month.
    ///
    /// Runs on the current rayon pool, one task per station. Values are summed
    /// in input order so the result does not depend on scheduling.
    pub fn compute_rows(&self, observations: &[StationObservation]) -> Vec<Baseline> {
        let mut by_station: HashMap<&Arc<str>, Vec<&StationObservation>> = HashMap::new();
        for observation in observations {
            if (self.start_year..=self.end_year).contains(&observation.year)
                && (1..=12).contains(&observation.month)
            {
                by_station
                    .entry(&observation.station_id)
                    .or_default()
                    .push(observation);
            }
        }

        let mut rows: Vec<Baseline> = by_station
            .into_par_iter()
            .flat_map_iter(|(station_id, members)| {
                monthly_means(&members)
                    .into_iter()
                    .enumerate()
                    .filter_map(move |(i, mean)| {
                        mean.map(|baseline_value| Baseline {
                            station_id: Arc::clone(station_id),
                            month: (i + 1) as u8,
                            baseline_value,
                        })
                    })
            })
            .collect();

        rows.sort_by(|a, b| (&a.station_id, a.month).cmp(&(&b.station_id, b.month)));
        rows
    }
}

fn monthly_means(observations: &[&StationObservation]) -> [Option<f64>; 12] {
    let mut sums = [0.0; 12];
    let mut counts = [0usize; 12];

    for observation in observations {
        if let Some(value) = observation.value {
            let index = observation.month_index();
            sums[index] += value;
            counts[index] += 1;
        }
    }

    let mut means = [None; 12];
    for (i, mean) in means.iter_mut().enumerate() {
        if counts[i] > 0 {
            *mean = Some(sums[i] / counts[i] as f64);
        }
    }
    means
}

impl Default for BaselineCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(
        station_id: &str,
        years: std::ops::RangeInclusive<i32>,
        month: u8,
    ) -> Vec<StationObservation> {
        years
            .map(|year| {
                StationObservation::new(station_id, year, month, Some((year - 1961) as f64 * 0.1))
            })
            .collect()
    }

    #[test]
    fn test_thirty_year_baseline_equals_known_mean() {
        let observations = series("USW00014739", 1961..=1990, 7);
        let table = BaselineCalculator::new().compute(&observations);

        // 0.0, 0.1, ..., 2.9 has mean 1.45
        let baseline = table.get("USW00014739", 7).unwrap();
        assert!((baseline - 1.45).abs() < 1e-9);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_only_reference_period_contributes() {
        let mut observations = series("USW00014739", 1950..=2000, 1);
        observations.push(StationObservation::new("USW00014739", 2010, 1, Some(100.0)));

        let table = BaselineCalculator::new().compute(&observations);
        assert!((table.get("USW00014739", 1).unwrap() - 1.45).abs() < 1e-9);
    }

    #[test]
    fn test_missing_values_are_skipped_not_zeroed() {
        let observations = vec![
            StationObservation::new("USW00014739", 1970, 3, Some(4.0)),
            StationObservation::new("USW00014739", 1971, 3, None),
            StationObservation::new("USW00014739", 1972, 3, Some(6.0)),
        ];
        let table = BaselineCalculator::new().compute(&observations);
        assert_eq!(table.get("USW00014739", 3), Some(5.0));
    }

    #[test]
    fn test_no_valid_values_means_no_baseline() {
        let observations = vec![
            StationObservation::new("USW00014739", 1970, 3, None),
            StationObservation::new("USW00014739", 1970, 4, Some(1.0)),
            StationObservation::new("USW00014740", 2001, 3, Some(2.0)),
        ];
        let table = BaselineCalculator::new().compute(&observations);

        assert_eq!(table.get("USW00014739", 3), None);
        assert_eq!(table.get("USW00014739", 4), Some(1.0));
        assert_eq!(table.get("USW00014740", 3), None);
        assert_eq!(table.get("USW00014739", 13), None);
        assert_eq!(table.len(), 1);
        assert_eq!(table.station_count(), 1);
    }

    #[test]
    fn test_rows_are_ordered() {
        let observations = vec![
            StationObservation::new("B0000000002", 1980, 2, Some(2.0)),
            StationObservation::new("A0000000001", 1980, 5, Some(5.0)),
            StationObservation::new("A0000000001", 1980, 1, Some(1.0)),
        ];
        let rows = BaselineCalculator::new().compute_rows(&observations);

        let keys: Vec<(&str, u8)> = rows.iter().map(|r| (&*r.station_id, r.month)).collect();
        assert_eq!(
            keys,
            vec![("A0000000001", 1), ("A0000000001", 5), ("B0000000002", 2)]
        );

        let table: BaselineTable = rows.into_iter().collect();
        assert_eq!(table.get("A0000000001", 5), Some(5.0));
        assert_eq!(table.station_count(), 2);
    }

    #[test]
    fn test_custom_reference_period() {
        let observations = series("USW00014739", 1961..=1990, 7);
        let calculator = BaselineCalculator::with_reference_period(1981, 1990);
        assert_eq!(calculator.reference_period(), (1981, 1990));

        // 2.0 ..= 2.9 has mean 2.45
        let table = calculator.compute(&observations);
        assert!((table.get("USW00014739", 7).unwrap() - 2.45).abs() < 1e-9);
    }
}
