//! Runtime settings for the anomaly pipeline.
//!
//! Values are layered: built-in defaults, then an optional config file
//! (any format the `config` crate recognises by extension), then `GHCN_*`
//! environment variables. Command-line flags are applied last by the CLI.

use crate::error::{ProcessingError, Result};
use crate::processors::{latest_complete_year, SeriesFilter};
use crate::utils::constants::{BASELINE_END_YEAR, BASELINE_START_YEAR, SERIES_START_YEAR};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use validator::Validate;

pub const ENV_PREFIX: &str = "GHCN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PipelineConfig {
    /// First year of the climatological reference period
    pub baseline_start_year: i32,

    /// Last year of the climatological reference period (inclusive)
    pub baseline_end_year: i32,

    /// First year written to the output series
    pub first_year: i32,

    /// Last year written; defaults to the latest complete calendar year
    pub last_year: Option<i32>,

    /// Rayon worker threads for the parallel stages
    #[validate(range(min = 1))]
    pub max_workers: usize,

    /// Fail on malformed input lines and zero-weight years instead of skipping them
    pub strict: bool,

    /// Memory-map the observation file instead of buffered reads
    pub use_mmap: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            baseline_start_year: BASELINE_START_YEAR,
            baseline_end_year: BASELINE_END_YEAR,
            first_year: SERIES_START_YEAR,
            last_year: None,
            max_workers: num_cpus::get(),
            strict: false,
            use_mmap: true,
        }
    }
}

impl PipelineConfig {
    /// Load defaults, the optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder =
            builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: PipelineConfig = builder.build()?.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Field ranges plus the cross-field rules validator cannot express
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        if self.baseline_start_year > self.baseline_end_year {
            return Err(ProcessingError::Config(format!(
                "Reference period start {} is after its end {}",
                self.baseline_start_year, self.baseline_end_year
            )));
        }

        if self.first_year < SERIES_START_YEAR {
            return Err(ProcessingError::Config(format!(
                "First output year {} is before {}",
                self.first_year, SERIES_START_YEAR
            )));
        }

        if let Some(last_year) = self.last_year {
            if last_year < self.first_year {
                return Err(ProcessingError::Config(format!(
                    "Last output year {} is before first output year {}",
                    last_year, self.first_year
                )));
            }

            let latest = latest_complete_year();
            if last_year > latest {
                return Err(ProcessingError::Config(format!(
                    "Last output year {} is not complete yet; the latest complete year is {}",
                    last_year, latest
                )));
            }
        }

        Ok(())
    }

    /// Output range, never wider than `[1900, latest complete year]`
    pub fn series_filter(&self) -> SeriesFilter {
        let published = SeriesFilter::for_current_date();
        let first_year = self.first_year.max(published.first_year());
        let last_year = self
            .last_year
            .map_or(published.last_year(), |year| year.min(published.last_year()));

        published
            .with_first_year(first_year)
            .with_last_year(last_year)
    }

    pub fn log_config(&self) {
        info!(
            reference_period = %format!("{}-{}", self.baseline_start_year, self.baseline_end_year),
            first_year = self.first_year,
            last_year = ?self.last_year,
            max_workers = self.max_workers,
            strict = self.strict,
            use_mmap = self.use_mmap,
            "pipeline configuration"
        );
    }
}
