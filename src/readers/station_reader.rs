use crate::error::{ProcessingError, Result};
use crate::models::StationMetadata;
use crate::readers::ReadOutcome;
use crate::utils::coordinates::{fixed_field, parse_latitude, parse_longitude};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};
use validator::Validate;

/// Elevation reported for stations with unknown height
const MISSING_ELEVATION: f64 = -999.0;

/// Reader for GHCN-M station inventory (`.inv`) files.
pub struct StationReader {
    strict: bool,
}

impl StationReader {
    pub fn new() -> Self {
        Self { strict: false }
    }

    pub fn with_strict_validation(strict: bool) -> Self {
        Self { strict }
    }

    /// Read station metadata from an inventory file
    pub fn read_stations(&self, path: &Path) -> Result<ReadOutcome<StationMetadata>> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut outcome = ReadOutcome::default();

        for (index, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line_number = index + 1;

            if line.trim().is_empty() {
                continue;
            }

            match self.parse_station_line(&line) {
                Ok(station) => outcome.records.push(station),
                Err(e) if self.strict => {
                    return Err(ProcessingError::InvalidFormat(format!(
                        "{} line {}: {}",
                        path.display(),
                        line_number,
                        e
                    )))
                }
                Err(e) => {
                    warn!(line = line_number, error = %e, "skipping malformed station line");
                    outcome.rejected_lines += 1;
                }
            }
        }

        debug!(
            path = %path.display(),
            stations = outcome.records.len(),
            rejected = outcome.rejected_lines,
            "read station inventory"
        );
        Ok(outcome)
    }

    /// Parse a single inventory line.
    ///
    /// Layout: ID 0-11, LATITUDE 12-21, LONGITUDE 21-31, STNELEV 31-38, NAME 38-69.
    fn parse_station_line(&self, line: &str) -> Result<StationMetadata> {
        let station_id = fixed_field(line, 0, 11).to_string();
        let latitude = parse_latitude(fixed_field(line, 12, 21))?;
        let longitude = parse_longitude(fixed_field(line, 21, 31))?;

        let elevation_str = fixed_field(line, 31, 38);
        let elevation = if elevation_str.is_empty() {
            None
        } else {
            let elevation = elevation_str.parse::<f64>().map_err(|_| {
                ProcessingError::InvalidFormat(format!("Invalid elevation: '{}'", elevation_str))
            })?;
            (elevation != MISSING_ELEVATION).then_some(elevation)
        };

        let name = fixed_field(line, 38, 69).to_string();

        let station = StationMetadata::new(station_id, latitude, longitude, elevation, name);
        station.validate()?;
        Ok(station)
    }
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new()
    }
}
