pub mod concurrent_reader;
pub mod dataset_locator;
pub mod landmask_reader;
pub mod observation_reader;
pub mod reference_reader;
pub mod station_reader;

pub use concurrent_reader::{ConcurrentReader, InputPaths, InputTables, RejectedLines};
pub use dataset_locator::{DatasetLocator, DatasetPaths};
pub use landmask_reader::LandMaskReader;
pub use observation_reader::ObservationReader;
pub use reference_reader::{ReferenceDataset, ReferenceReader};
pub use station_reader::StationReader;

/// Parsed rows plus the number of malformed lines a lenient reader skipped
#[derive(Debug, Clone)]
pub struct ReadOutcome<T> {
    pub records: Vec<T>,
    pub rejected_lines: usize,
}

impl<T> Default for ReadOutcome<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected_lines: 0,
        }
    }
}
