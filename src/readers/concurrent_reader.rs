use crate::error::Result;
use crate::models::{GridCell, MonthlyRecord, StationMetadata, StationObservation};
use crate::readers::{DatasetPaths, LandMaskReader, ObservationReader, StationReader};
use std::path::PathBuf;
use tracing::info;

/// Locations of the three input tables
#[derive(Debug, Clone)]
pub struct InputPaths {
    pub data: PathBuf,
    pub inventory: PathBuf,
    pub land_mask: PathBuf,
}

impl InputPaths {
    pub fn new(dataset: DatasetPaths, land_mask: PathBuf) -> Self {
        Self {
            data: dataset.data,
            inventory: dataset.inventory,
            land_mask,
        }
    }
}

/// Lines dropped by lenient readers, per input table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectedLines {
    pub observations: usize,
    pub stations: usize,
    pub land_mask: usize,
}

impl RejectedLines {
    pub fn total(&self) -> usize {
        self.observations + self.stations + self.land_mask
    }
}

/// Everything the pipeline consumes, already parsed and validated
#[derive(Debug, Clone, Default)]
pub struct InputTables {
    pub records: Vec<MonthlyRecord>,
    pub stations: Vec<StationMetadata>,
    pub land_mask: Vec<GridCell>,
    pub rejected: RejectedLines,
}

impl InputTables {
    pub fn new(
        records: Vec<MonthlyRecord>,
        stations: Vec<StationMetadata>,
        land_mask: Vec<GridCell>,
    ) -> Self {
        Self {
            records,
            stations,
            land_mask,
            rejected: RejectedLines::default(),
        }
    }

    /// Long-format observations, one per station-month
    pub fn observations(&self) -> Vec<StationObservation> {
        self.records
            .iter()
            .flat_map(MonthlyRecord::observations)
            .collect()
    }
}

/// Loads the observation, inventory and land-mask files concurrently.
pub struct ConcurrentReader {
    strict: bool,
    use_mmap: bool,
}

impl ConcurrentReader {
    pub fn new() -> Self {
        Self {
            strict: false,
            use_mmap: true,
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

    pub async fn read_inputs(&self, paths: &InputPaths) -> Result<InputTables> {
        let strict = self.strict;
        let use_mmap = self.use_mmap;

        let data_path = paths.data.clone();
        let observations = tokio::task::spawn_blocking(move || {
            ObservationReader::new()
                .with_strict_validation(strict)
                .with_mmap(use_mmap)
                .read_records(&data_path)
        });

        let inventory_path = paths.inventory.clone();
        let stations = tokio::task::spawn_blocking(move || {
            StationReader::with_strict_validation(strict).read_stations(&inventory_path)
        });

        let land_mask_path = paths.land_mask.clone();
        let land_mask = tokio::task::spawn_blocking(move || {
            LandMaskReader::with_strict_validation(strict).read_cells(&land_mask_path)
        });

        let (observations, stations, land_mask) =
            tokio::try_join!(observations, stations, land_mask)?;
        let (observations, stations, land_mask) = (observations?, stations?, land_mask?);

        info!(
            records = observations.records.len(),
            stations = stations.records.len(),
            land_mask_cells = land_mask.records.len(),
            "loaded input tables"
        );

        Ok(InputTables {
            records: observations.records,
            stations: stations.records,
            land_mask: land_mask.records,
            rejected: RejectedLines {
                observations: observations.rejected_lines,
                stations: stations.rejected_lines,
                land_mask: land_mask.rejected_lines,
            },
        })
    }
}

impl Default for ConcurrentReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::observation_reader::tests::dat_line;
    use crate::readers::station_reader::tests::inv_line;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_inputs() -> Result<()> {
        let dir = TempDir::new()?;
        let data = dir.path().join("ghcnm.tavg.qcu.dat");
        let inventory = dir.path().join("ghcnm.tavg.qcu.inv");
        let land_mask = dir.path().join("landmask.csv");

        fs::write(
            &data,
            format!(
                "{}\n{}\nbroken\n",
                dat_line("UKE00105915", 1961, [500; 12]),
                dat_line("UKE00105915", 1962, [600; 12])
            ),
        )?;
        fs::write(
            &inventory,
            format!("{}\n", inv_line("UKE00105915", 51.478, -0.461, 25.0, "HEATHROW")),
        )?;
        fs::write(
            &land_mask,
            "gridbox,land_percent,ocean_percent\n52.5 lat -2.5 lon,0.8,0.2\n",
        )?;

        let paths = InputPaths {
            data,
            inventory,
            land_mask,
        };
        let tables = ConcurrentReader::new().read_inputs(&paths).await?;

        assert_eq!(tables.records.len(), 2);
        assert_eq!(tables.stations.len(), 1);
        assert_eq!(tables.land_mask.len(), 1);
        assert_eq!(tables.rejected.observations, 1);
        assert_eq!(tables.rejected.total(), 1);
        assert_eq!(tables.observations().len(), 24);

        let strict = ConcurrentReader::new()
            .with_strict_validation(true)
            .read_inputs(&paths)
            .await;
        assert!(strict.is_err());

        Ok(())
    }
}
