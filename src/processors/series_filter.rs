use crate::models::GlobalAnnualAnomaly;
use crate::utils::constants::SERIES_START_YEAR;
use chrono::{Datelike, Local};

/// Restricts a series to its publishable year range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesFilter {
    first_year: i32,
    last_year: i32,
}

impl SeriesFilter {
    pub fn new(first_year: i32, last_year: i32) -> Self {
        Self {
            first_year,
            last_year,
        }
    }

    /// `[1900, current_year - 1]`; the running year is never complete
    pub fn for_current_date() -> Self {
        Self::new(SERIES_START_YEAR, latest_complete_year())
    }

    pub fn with_first_year(mut self, first_year: i32) -> Self {
        self.first_year = first_year;
        self
    }

    pub fn with_last_year(mut self, last_year: i32) -> Self {
        self.last_year = last_year;
        self
    }

    pub fn first_year(&self) -> i32 {
        self.first_year
    }

    pub fn last_year(&self) -> i32 {
        self.last_year
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.first_year..=self.last_year).contains(&year)
    }

    /// Keep in-range years, ascending, one point per year
    pub fn apply(&self, series: Vec<GlobalAnnualAnomaly>) -> Vec<GlobalAnnualAnomaly> {
        let mut filtered: Vec<GlobalAnnualAnomaly> = series
            .into_iter()
            .filter(|point| self.contains(point.year))
            .collect();

        filtered.sort_by_key(|point| point.year);
        filtered.dedup_by_key(|point| point.year);
        filtered
    }
}

impl Default for SeriesFilter {
    fn default() -> Self {
        Self::for_current_date()
    }
}

pub fn latest_complete_year() -> i32 {
    Local::now().year() - 1
}
