use crate::models::{GlobalAnnualAnomaly, MonthlyRecord};
use crate::processors::SeriesFilter;
use std::collections::BTreeMap;

/// Unweighted mean absolute temperature per year.
///
/// Only station-years with all twelve months reported take part. Each such
/// row contributes its annual mean with equal weight, so the result follows
/// the station network's composition rather than climate; it exists for
/// comparison with the gridded anomaly series.
pub struct SimpleAverager {
    filter: SeriesFilter,
}

impl SimpleAverager {
    pub fn new(filter: SeriesFilter) -> Self {
        Self { filter }
    }

    pub fn compute(&self, records: &[MonthlyRecord]) -> Vec<GlobalAnnualAnomaly> {
        let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();

        for record in records {
            if let Some(mean) = record.annual_mean() {
                let entry = by_year.entry(record.year).or_insert((0.0, 0));
                entry.0 += mean;
                entry.1 += 1;
            }
        }

        let series = by_year
            .into_iter()
            .map(|(year, (sum, count))| GlobalAnnualAnomaly::new(year, sum / count as f64))
            .collect();

        self.filter.apply(series)
    }
}

impl Default for SimpleAverager {
    fn default() -> Self {
        Self::new(SeriesFilter::for_current_date())
    }
}
