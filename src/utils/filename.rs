use crate::writers::OutputFormat;
use chrono::{Datelike, Local};
use std::path::PathBuf;

/// Default output path: output/ghcn-anomalies-{YYMMDD}.{ext}
pub fn generate_default_output_filename(format: OutputFormat) -> PathBuf {
    dated_filename("ghcn-anomalies", format)
}

/// Default output path for the absolute average: output/ghcn-simple-average-{YYMMDD}.{ext}
pub fn generate_default_simple_average_filename(format: OutputFormat) -> PathBuf {
    dated_filename("ghcn-simple-average", format)
}

/// Default output path for an imported reference series
pub fn generate_default_reference_filename(dataset: &str, format: OutputFormat) -> PathBuf {
    dated_filename(&format!("{}-reference", dataset.to_lowercase()), format)
}

fn dated_filename(stem: &str, format: OutputFormat) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year

    let filename = format!(
        "{}-{:02}{:02}{:02}.{}",
        stem,
        year,
        now.month(),
        now.day(),
        format.extension()
    );
    PathBuf::from("output").join(filename)
}
