use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{GlobalAnnualAnomaly, GridMonthlyAnomaly};
use crate::processors::{
    AnomalyBuilder, BaselineCalculator, BaselineTable, GridAggregator, GridAssigner,
    SeriesFilter,
};
use crate::readers::{InputTables, RejectedLines};
use crate::utils::progress::ProgressReporter;
use std::collections::HashSet;
use tracing::{info, warn};

/// Counts gathered while running the pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub station_years: usize,
    pub observations: usize,
    pub missing_values: usize,
    pub stations: usize,
    pub land_mask_cells: usize,
    pub assigned_stations: usize,
    pub unmatched_stations: usize,
    pub baseline_rows: usize,
    pub station_months_without_baseline: usize,
    pub anomaly_records: usize,
    pub grid_monthly_records: usize,
    pub degenerate_years: Vec<i32>,
    pub output_years: usize,
    pub year_span: Option<(i32, i32)>,
    pub rejected_lines: RejectedLines,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub series: Vec<GlobalAnnualAnomaly>,
    pub grid: Vec<GridMonthlyAnomaly>,
    pub report: PipelineReport,
}

/// Runs grid assignment, baselines, anomalies and both reductions.
pub struct AnomalyPipeline {
    max_workers: usize,
    calculator: BaselineCalculator,
    filter: SeriesFilter,
    strict: bool,
}

impl AnomalyPipeline {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers,
            calculator: BaselineCalculator::new(),
            filter: SeriesFilter::for_current_date(),
            strict: false,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.max_workers)
            .with_reference_period(config.baseline_start_year, config.baseline_end_year)
            .with_filter(config.series_filter())
            .with_strict(config.strict)
    }

    pub fn with_reference_period(mut self, start_year: i32, end_year: i32) -> Self {
        self.calculator = BaselineCalculator::with_reference_period(start_year, end_year);
        self
    }

    pub fn with_filter(mut self, filter: SeriesFilter) -> Self {
        self.filter = filter;
        self
    }

    /// In strict mode a zero-weight year inside the output range fails the run
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn run(
        &self,
        inputs: &InputTables,
        progress: Option<&ProgressReporter>,
    ) -> Result<PipelineOutput> {
        Self::check_inputs(inputs)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        pool.install(|| self.run_stages(inputs, progress))
    }

    fn check_inputs(inputs: &InputTables) -> Result<()> {
        if inputs.records.is_empty() {
            return Err(ProcessingError::EmptyInput(
                "no station observations".to_string(),
            ));
        }
        if inputs.stations.is_empty() {
            return Err(ProcessingError::EmptyInput("no station metadata".to_string()));
        }
        if inputs.land_mask.is_empty() {
            return Err(ProcessingError::EmptyInput("no land-mask cells".to_string()));
        }
        Ok(())
    }

    fn run_stages(
        &self,
        inputs: &InputTables,
        progress: Option<&ProgressReporter>,
    ) -> Result<PipelineOutput> {
        let mut report = PipelineReport {
            station_years: inputs.records.len(),
            stations: inputs.stations.len(),
            land_mask_cells: inputs.land_mask.len(),
            rejected_lines: inputs.rejected.clone(),
            ..PipelineReport::default()
        };

        if let Some(p) = progress {
            p.set_message("Assigning stations to grid cells...");
        }
        let assignment = GridAssigner::new(&inputs.land_mask).assign_all(&inputs.stations)?;
        report.assigned_stations = assignment.len();
        report.unmatched_stations = assignment.unmatched_stations.len();
        info!(
            assigned = report.assigned_stations,
            unmatched = report.unmatched_stations,
            "grid assignment complete"
        );

        let observations = inputs.observations();
        report.observations = observations.len();
        report.missing_values = observations.iter().filter(|o| o.is_missing()).count();

        if let Some(p) = progress {
            p.set_message("Computing station baselines...");
        }
        let baselines = self.calculator.compute(&observations);
        report.baseline_rows = baselines.len();
        report.station_months_without_baseline =
            count_months_without_baseline(&observations, &baselines);
        info!(
            stations = baselines.station_count(),
            baseline_rows = report.baseline_rows,
            without_baseline = report.station_months_without_baseline,
            "baselines computed"
        );

        if let Some(p) = progress {
            p.set_message("Building anomalies...");
        }
        let anomalies = AnomalyBuilder::new().build(&observations, &baselines, &assignment);
        drop(observations);
        report.anomaly_records = anomalies.len();
        if anomalies.is_empty() {
            return Err(ProcessingError::EmptyInput(
                "no observation has both a baseline and a land-mask cell".to_string(),
            ));
        }

        if let Some(p) = progress {
            p.set_message("Aggregating grid cells...");
        }
        let aggregator = GridAggregator::new();
        let grid = aggregator.spatial_reduction(&anomalies);
        report.grid_monthly_records = grid.len();

        let reduction = aggregator.global_reduction(&grid);
        report.degenerate_years = reduction
            .degenerate_years
            .into_iter()
            .filter(|year| self.filter.contains(*year))
            .collect();

        if self.strict {
            if let Some(&year) = report.degenerate_years.first() {
                return Err(ProcessingError::DegenerateWeight { year });
            }
        } else if !report.degenerate_years.is_empty() {
            warn!(
                years = ?report.degenerate_years,
                "years with zero total grid weight left out of the series"
            );
        }

        let series = self.filter.apply(reduction.anomalies);
        report.output_years = series.len();
        report.year_span = series
            .first()
            .zip(series.last())
            .map(|(first, last)| (first.year, last.year));

        if let Some(p) = progress {
            p.finish_with_message(&format!("Computed {} annual anomalies", series.len()));
        }
        info!(years = report.output_years, "global series complete");

        Ok(PipelineOutput {
            series,
            grid,
            report,
        })
    }
}

impl Default for AnomalyPipeline {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

/// Station-months with at least one reported value but no baseline
fn count_months_without_baseline(
    observations: &[crate::models::StationObservation],
    baselines: &BaselineTable,
) -> usize {
    let reported: HashSet<(&str, u8)> = observations
        .iter()
        .filter(|o| !o.is_missing())
        .map(|o| (&*o.station_id, o.month))
        .collect();

    reported
        .into_iter()
        .filter(|(station_id, month)| baselines.get(station_id, *month).is_none())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GridCell, MonthlyRecord, StationMetadata};
    use pretty_assertions::assert_eq;

    fn station(id: &str, latitude: f64, longitude: f64) -> StationMetadata {
        StationMetadata::new(id.to_string(), latitude, longitude, None, id.to_string())
    }

    fn records(
        id: &str,
        years: std::ops::RangeInclusive<i32>,
        value: impl Fn(i32) -> f64,
    ) -> Vec<MonthlyRecord> {
        years
            .map(|year| MonthlyRecord::new(id, year, [Some(value(year)); 12]))
            .collect()
    }

    fn inputs() -> InputTables {
        let mut all = records("UKE00105915", 1961..=2000, |y| if y > 1990 { 11.0 } else { 10.0 });
        all.extend(records("UKE00105916", 1961..=2000, |y| if y > 1990 { 13.0 } else { 10.0 }));
        // no land-mask cell for this one
        all.extend(records("ASN00066062", 1961..=2000, |_| 50.0));

        InputTables::new(
            all,
            vec![
                station("UKE00105915", 51.478, -0.461),
                station("UKE00105916", 53.1, -1.2),
                station("ASN00066062", -33.861, 151.205),
            ],
            vec![GridCell::new("52.5 lat -2.5 lon".parse().unwrap(), 0.8)],
        )
    }

    #[test]
    fn test_end_to_end_series() {
        let output = AnomalyPipeline::new(2)
            .with_filter(SeriesFilter::new(1900, 2020))
            .run(&inputs(), None)
            .unwrap();

        assert_eq!(output.series.len(), 40);
        assert_eq!(output.series[0], GlobalAnnualAnomaly::new(1961, 0.0));
        // stations at +1.0 and +3.0 in the same cell average to 2.0
        assert!((output.series[39].anomaly - 2.0).abs() < 1e-9);
        assert!(output.series.windows(2).all(|w| w[0].year < w[1].year));

        let report = &output.report;
        assert_eq!(report.stations, 3);
        assert_eq!(report.assigned_stations, 2);
        assert_eq!(report.unmatched_stations, 1);
        assert_eq!(report.baseline_rows, 36);
        assert_eq!(report.station_months_without_baseline, 0);
        assert_eq!(report.anomaly_records, 2 * 40 * 12);
        assert_eq!(report.grid_monthly_records, 40 * 12);
        assert_eq!(report.year_span, Some((1961, 2000)));
        assert!(report.degenerate_years.is_empty());
    }

    #[test]
    fn test_filter_limits_output() {
        let output = AnomalyPipeline::new(1)
            .with_filter(SeriesFilter::new(1990, 1995))
            .run(&inputs(), None)
            .unwrap();
        let years: Vec<i32> = output.series.iter().map(|a| a.year).collect();
        assert_eq!(years, vec![1990, 1991, 1992, 1993, 1994, 1995]);
    }

    #[test]
    fn test_zero_weight_years() {
        let mut tables = inputs();
        tables.land_mask = vec![GridCell::new("52.5 lat -2.5 lon".parse().unwrap(), 0.0)];

        let pipeline = AnomalyPipeline::new(1).with_filter(SeriesFilter::new(1900, 2020));
        let output = pipeline.run(&tables, None).unwrap();
        assert!(output.series.is_empty());
        assert_eq!(output.report.degenerate_years.len(), 40);

        let strict = pipeline.with_strict(true).run(&tables, None);
        assert!(matches!(
            strict,
            Err(ProcessingError::DegenerateWeight { year: 1961 })
        ));
    }

    #[test]
    fn test_empty_inputs_are_typed_failures() {
        let pipeline = AnomalyPipeline::new(1);

        let mut tables = inputs();
        tables.records.clear();
        assert!(matches!(
            pipeline.run(&tables, None),
            Err(ProcessingError::EmptyInput(_))
        ));

        let mut tables = inputs();
        tables.land_mask.clear();
        assert!(matches!(
            pipeline.run(&tables, None),
            Err(ProcessingError::EmptyInput(_))
        ));

        // observations only after the reference period: no baselines at all
        let tables = InputTables::new(
            records("UKE00105915", 2001..=2010, |_| 10.0),
            vec![station("UKE00105915", 51.478, -0.461)],
            vec![GridCell::new("52.5 lat -2.5 lon".parse().unwrap(), 0.8)],
        );
        assert!(matches!(
            pipeline.run(&tables, None),
            Err(ProcessingError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_months_without_baseline_are_counted() {
        let mut values = [Some(5.0); 12];
        values[1] = None;
        let mut all: Vec<MonthlyRecord> = (1961..=1990)
            .map(|year| MonthlyRecord::new("UKE00105915", year, values))
            .collect();
        all.push(MonthlyRecord::new("UKE00105915", 1995, [Some(6.0); 12]));

        let tables = InputTables::new(
            all,
            vec![station("UKE00105915", 51.478, -0.461)],
            vec![GridCell::new("52.5 lat -2.5 lon".parse().unwrap(), 0.8)],
        );
        let output = AnomalyPipeline::new(1)
            .with_filter(SeriesFilter::new(1900, 2020))
            .run(&tables, None)
            .unwrap();

        assert_eq!(output.report.baseline_rows, 11);
        assert_eq!(output.report.station_months_without_baseline, 1);
        // 1995 has eleven usable months, all at +1.0
        assert_eq!(output.series.last().unwrap().year, 1995);
        assert!((output.series.last().unwrap().anomaly - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_runs_are_bit_reproducible() {
        let pipeline = AnomalyPipeline::new(4).with_filter(SeriesFilter::new(1900, 2020));
        let first = pipeline.run(&inputs(), None).unwrap();
        let second = pipeline.run(&inputs(), None).unwrap();
        assert_eq!(first.series, second.series);
    }
}
