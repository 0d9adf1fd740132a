use crate::processors::PipelineReport;
use crate::readers::{InputTables, RejectedLines};
use std::collections::HashSet;

/// Shape of the loaded input tables, before any processing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegrityReport {
    pub station_years: usize,
    pub complete_station_years: usize,
    pub observations: usize,
    pub missing_values: usize,
    pub stations: usize,
    pub countries: usize,
    pub stations_without_records: usize,
    pub stations_without_metadata: usize,
    pub land_mask_cells: usize,
    pub zero_land_cells: usize,
    pub year_span: Option<(i32, i32)>,
    pub rejected_lines: RejectedLines,
}

impl IntegrityReport {
    pub fn missing_percent(&self) -> f64 {
        if self.observations == 0 {
            0.0
        } else {
            100.0 * self.missing_values as f64 / self.observations as f64
        }
    }
}

pub struct IntegrityChecker;

impl IntegrityChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn check_integrity(&self, inputs: &InputTables) -> IntegrityReport {
        let mut report = IntegrityReport {
            station_years: inputs.records.len(),
            stations: inputs.stations.len(),
            land_mask_cells: inputs.land_mask.len(),
            rejected_lines: inputs.rejected.clone(),
            ..IntegrityReport::default()
        };

        let mut first_year = i32::MAX;
        let mut last_year = i32::MIN;
        let mut recorded: HashSet<&str> = HashSet::new();

        for record in &inputs.records {
            report.observations += record.values.len();
            report.missing_values += record.missing_count();
            if record.is_complete() {
                report.complete_station_years += 1;
            }

            first_year = first_year.min(record.year);
            last_year = last_year.max(record.year);
            recorded.insert(&*record.station_id);
        }

        if !inputs.records.is_empty() {
            report.year_span = Some((first_year, last_year));
        }

        let known: HashSet<&str> = inputs
            .stations
            .iter()
            .map(|station| station.station_id.as_str())
            .collect();
        report.stations_without_records = known.difference(&recorded).count();
        report.countries = inputs
            .stations
            .iter()
            .map(|station| station.country_code())
            .collect::<HashSet<_>>()
            .len();
        report.stations_without_metadata = recorded.difference(&known).count();

        report.zero_land_cells = inputs
            .land_mask
            .iter()
            .filter(|cell| cell.land_fraction <= 0.0)
            .count();

        report
    }

    /// Generate a summary of the input tables
    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let mut summary = String::new();

        summary.push_str("=== Input Integrity Report ===\n");
        summary.push_str(&format!("Station-years: {}\n", report.station_years));
        summary.push_str(&format!(
            "  Complete (12 months): {}\n",
            report.complete_station_years
        ));
        summary.push_str(&format!("Monthly values: {}\n", report.observations));
        summary.push_str(&format!(
            "  Missing: {} ({:.1}%)\n",
            report.missing_values,
            report.missing_percent()
        ));
        if let Some((first, last)) = report.year_span {
            summary.push_str(&format!("Year span: {}-{}\n", first, last));
        }
        summary.push_str(&format!(
            "Stations in inventory: {} ({} countries)\n",
            report.stations, report.countries
        ));
        summary.push_str(&format!(
            "  Without observations: {}\n",
            report.stations_without_records
        ));
        summary.push_str(&format!(
            "Observed stations missing from inventory: {}\n",
            report.stations_without_metadata
        ));
        summary.push_str(&format!(
            "Land-mask cells: {} ({} with no land)\n",
            report.land_mask_cells, report.zero_land_cells
        ));
        push_rejected(&mut summary, &report.rejected_lines);

        summary
    }

    /// Generate a summary of a finished pipeline run
    pub fn pipeline_summary(&self, report: &PipelineReport) -> String {
        let mut summary = String::new();

        summary.push_str("=== Pipeline Report ===\n");
        summary.push_str(&format!("Stations read: {}\n", report.stations));
        summary.push_str(&format!(
            "  Assigned to a grid cell: {}\n",
            report.assigned_stations
        ));
        summary.push_str(&format!(
            "  Excluded (no land-mask cell): {}\n",
            report.unmatched_stations
        ));
        summary.push_str(&format!(
            "Monthly values: {} ({} missing)\n",
            report.observations, report.missing_values
        ));
        summary.push_str(&format!("Baseline rows: {}\n", report.baseline_rows));
        summary.push_str(&format!(
            "Station-months without baseline: {}\n",
            report.station_months_without_baseline
        ));
        summary.push_str(&format!("Anomaly rows: {}\n", report.anomaly_records));
        summary.push_str(&format!(
            "Grid-month rows: {}\n",
            report.grid_monthly_records
        ));

        match report.year_span {
            Some((first, last)) => summary.push_str(&format!(
                "Output years: {} ({}-{})\n",
                report.output_years, first, last
            )),
            None => summary.push_str("Output years: 0\n"),
        }

        if !report.degenerate_years.is_empty() {
            let years: Vec<String> = report
                .degenerate_years
                .iter()
                .map(|year| year.to_string())
                .collect();
            summary.push_str(&format!(
                "Years with zero total weight: {}\n",
                years.join(", ")
            ));
        }
        push_rejected(&mut summary, &report.rejected_lines);

        summary
    }
}

fn push_rejected(summary: &mut String, rejected: &RejectedLines) {
    if rejected.total() == 0 {
        return;
    }

    summary.push_str(&format!(
        "Rejected input lines: {} (observations {}, inventory {}, land mask {})\n",
        rejected.total(),
        rejected.observations,
        rejected.stations,
        rejected.land_mask
    ));
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}
