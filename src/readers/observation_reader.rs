use crate::error::{ProcessingError, Result};
use crate::models::{MonthlyRecord, StationObservation};
use crate::readers::ReadOutcome;
use crate::utils::constants::{DEFAULT_BUFFER_SIZE, ELEMENT_TAVG};
use crate::utils::coordinates::fixed_field;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Column where the first monthly value starts
const FIRST_VALUE_COLUMN: usize = 19;
/// VALUE (5) + DMFLAG + QCFLAG + DSFLAG
const MONTH_WIDTH: usize = 8;
const VALUE_WIDTH: usize = 5;

/// Reader for GHCN-M monthly `.dat` files.
pub struct ObservationReader {
    strict: bool,
    use_mmap: bool,
}

impl ObservationReader {
    pub fn new() -> Self {
        Self {
            strict: false,
            use_mmap: false,
        }
    }

    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    /// Read every station-year row from a `.dat` file
    pub fn read_records(&self, path: &Path) -> Result<ReadOutcome<MonthlyRecord>> {
        let outcome = if self.use_mmap {
            self.read_records_mmap(path)?
        } else {
            self.read_records_buffered(path)?
        };

        debug!(
            path = %path.display(),
            records = outcome.records.len(),
            rejected = outcome.rejected_lines,
            "read observation file"
        );
        Ok(outcome)
    }

    fn read_records_buffered(&self, path: &Path) -> Result<ReadOutcome<MonthlyRecord>> {
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        let mut outcome = ReadOutcome::default();

        for (index, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            self.accept_line(&line, index + 1, &mut outcome)?;
        }

        Ok(outcome)
    }

    fn read_records_mmap(&self, path: &Path) -> Result<ReadOutcome<MonthlyRecord>> {
        let file = File::open(path)?;
        // SAFETY: the file is opened read-only and not modified while mapped
        let mmap = unsafe { Mmap::map(&file)? };
        let content = std::str::from_utf8(&mmap)
            .map_err(|e| ProcessingError::InvalidFormat(format!("Invalid UTF-8: {}", e)))?;

        let mut outcome = ReadOutcome::default();
        for (index, line) in content.lines().enumerate() {
            self.accept_line(line, index + 1, &mut outcome)?;
        }

        Ok(outcome)
    }

    fn accept_line(
        &self,
        line: &str,
        line_number: usize,
        outcome: &mut ReadOutcome<MonthlyRecord>,
    ) -> Result<()> {
        match self.parse_line(line) {
            Ok(Some(record)) => outcome.records.push(record),
            Ok(None) => {}
            Err(e) if self.strict => {
                return Err(ProcessingError::InvalidFormat(format!(
                    "line {}: {}",
                    line_number, e
                )))
            }
            Err(e) => {
                warn!(line = line_number, error = %e, "skipping malformed observation line");
                outcome.rejected_lines += 1;
            }
        }
        Ok(())
    }

    /// Parse a single `.dat` line.
    ///
    /// Blank lines and elements other than TAVG yield `Ok(None)`.
    fn parse_line(&self, line: &str) -> Result<Option<MonthlyRecord>> {
        if line.trim().is_empty() {
            return Ok(None);
        }

        let min_length = FIRST_VALUE_COLUMN + 11 * MONTH_WIDTH + VALUE_WIDTH;
        if line.len() < min_length {
            return Err(ProcessingError::InvalidFormat(format!(
                "Record has {} columns, expected at least {}",
                line.len(),
                min_length
            )));
        }

        let station_id = fixed_field(line, 0, 11);
        if station_id.len() != 11 {
            return Err(ProcessingError::InvalidFormat(format!(
                "Invalid station ID: '{}'",
                station_id
            )));
        }

        let year_str = fixed_field(line, 11, 15);
        let year = year_str.parse::<i32>().map_err(|_| {
            ProcessingError::InvalidFormat(format!("Invalid year: '{}'", year_str))
        })?;

        let element = fixed_field(line, 15, 19);
        if element != ELEMENT_TAVG {
            return Ok(None);
        }

        let station_id: Arc<str> = Arc::from(station_id);
        let mut values = [None; 12];
        for (month, slot) in values.iter_mut().enumerate() {
            let start = FIRST_VALUE_COLUMN + month * MONTH_WIDTH;
            let raw_str = fixed_field(line, start, start + VALUE_WIDTH);
            let raw = raw_str.parse::<i32>().map_err(|_| {
                ProcessingError::InvalidFormat(format!(
                    "Invalid value for month {}: '{}'",
                    month + 1,
                    raw_str
                ))
            })?;

            let observation =
                StationObservation::from_raw(Arc::clone(&station_id), year, (month + 1) as u8, raw);
            observation.validate()?;
            *slot = observation.value;
        }

        Ok(Some(MonthlyRecord::new(station_id, year, values)))
    }
}

impl Default for ObservationReader {
    fn default() -> Self {
        Self::new()
    }
}
