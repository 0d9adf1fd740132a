use crate::error::{ProcessingError, Result};
use crate::models::{GridBox, GridCell, LandMaskEntry};
use crate::readers::ReadOutcome;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};
use validator::Validate;

/// Reader for the land-mask table (`gridbox,land_percent,ocean_percent`).
///
/// `land_percent` holds the land fraction of the cell in [0, 1].
pub struct LandMaskReader {
    strict: bool,
}

impl LandMaskReader {
    pub fn new() -> Self {
        Self { strict: false }
    }

    pub fn with_strict_validation(strict: bool) -> Self {
        Self { strict }
    }

    pub fn read_cells(&self, path: &Path) -> Result<ReadOutcome<GridCell>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;
        self.read_from(&mut reader)
    }

    fn read_from<R: std::io::Read>(
        &self,
        reader: &mut csv::Reader<R>,
    ) -> Result<ReadOutcome<GridCell>> {
        let mut outcome = ReadOutcome::default();
        let mut seen = HashSet::new();

        for (index, entry_result) in reader.deserialize::<LandMaskEntry>().enumerate() {
            // header is line 1
            let line_number = index + 2;
            let parsed = entry_result
                .map_err(ProcessingError::from)
                .and_then(|entry| Self::parse_entry(&entry));

            match parsed {
                Ok(cell) if seen.insert(cell.gridbox) => outcome.records.push(cell),
                Ok(cell) => {
                    let e = ProcessingError::InvalidFormat(format!(
                        "Duplicate land-mask entry for {}",
                        cell.gridbox
                    ));
                    self.reject(line_number, e, &mut outcome)?;
                }
                Err(e) => self.reject(line_number, e, &mut outcome)?,
            }
        }

        debug!(
            cells = outcome.records.len(),
            rejected = outcome.rejected_lines,
            "read land mask"
        );
        Ok(outcome)
    }

    fn parse_entry(entry: &LandMaskEntry) -> Result<GridCell> {
        entry.validate()?;
        let gridbox = entry.gridbox.parse::<GridBox>()?;
        Ok(GridCell::new(gridbox, entry.land_percent))
    }

    fn reject(
        &self,
        line_number: usize,
        error: ProcessingError,
        outcome: &mut ReadOutcome<GridCell>,
    ) -> Result<()> {
        if self.strict {
            return Err(ProcessingError::InvalidFormat(format!(
                "land mask line {}: {}",
                line_number, error
            )));
        }
        warn!(line = line_number, error = %error, "skipping land-mask entry");
        outcome.rejected_lines += 1;
        Ok(())
    }
}

impl Default for LandMaskReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_land_mask() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "gridbox,land_percent,ocean_percent")?;
        writeln!(temp_file, "52.5 lat -2.5 lon,0.75,0.25")?;
        writeln!(temp_file, "-2.5 lat -32.5 lon,0,1")?;
        writeln!(temp_file, "52.5 lat -2.5 lon,0.5,0.5")?; // duplicate
        writeln!(temp_file, "52.5 lat 2.5 lon,1.5,0")?; // fraction out of range
        writeln!(temp_file, "somewhere,0.5,0.5")?;

        let outcome = LandMaskReader::new().read_cells(temp_file.path())?;
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.rejected_lines, 3);

        let first = &outcome.records[0];
        assert_eq!(first.gridbox.to_string(), "52.5 lat -2.5 lon");
        assert_eq!(first.land_fraction, 0.75);
        assert_eq!(outcome.records[1].weight(), 0.0);

        let strict = LandMaskReader::with_strict_validation(true).read_cells(temp_file.path());
        assert!(strict.is_err());

        Ok(())
    }
}
