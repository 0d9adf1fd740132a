use crate::error::{ProcessingError, Result};
use crate::models::GlobalAnnualAnomaly;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Published reconstructions the GHCN series is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceDataset {
    /// CRUTEM global land text file (`CRUTEM5.0_gl.txt`)
    Crutem,
    /// GISTEMP monthly mean surface temperature graph CSV
    Giss,
}

impl ReferenceDataset {
    pub fn name(&self) -> &'static str {
        match self {
            ReferenceDataset::Crutem => "crutem",
            ReferenceDataset::Giss => "giss",
        }
    }
}

impl fmt::Display for ReferenceDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ReferenceDataset {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "crutem" => Ok(ReferenceDataset::Crutem),
            "giss" | "gistemp" => Ok(ReferenceDataset::Giss),
            _ => Err(ProcessingError::Config(format!(
                "Unknown reference dataset: {} (expected crutem or giss)",
                s
            ))),
        }
    }
}

pub struct ReferenceReader {
    dataset: ReferenceDataset,
}

impl ReferenceReader {
    pub fn new(dataset: ReferenceDataset) -> Self {
        Self { dataset }
    }

    /// Read the annual land anomaly series, ordered by year
    pub fn read_series(&self, path: &Path) -> Result<Vec<GlobalAnnualAnomaly>> {
        match self.dataset {
            ReferenceDataset::Crutem => {
                let content = fs::read_to_string(path)?;
                parse_crutem(&content)
            }
            ReferenceDataset::Giss => {
                let mut reader = csv::ReaderBuilder::new()
                    .has_headers(false)
                    .flexible(true)
                    .trim(csv::Trim::All)
                    .from_path(path)?;
                parse_giss(&mut reader)
            }
        }
    }
}

/// Each CRUTEM year has an anomaly row (year, 12 months, annual)
/// followed by a coverage row with the same year.
fn parse_crutem(content: &str) -> Result<Vec<GlobalAnnualAnomaly>> {
    let mut series = Vec::new();
    let mut last_year = None;

    for (index, line) in content.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != 14 {
            return Err(ProcessingError::InvalidFormat(format!(
                "CRUTEM line {} has {} fields, expected 14",
                index + 1,
                fields.len()
            )));
        }

        let year = fields[0].parse::<i32>().map_err(|_| {
            ProcessingError::InvalidFormat(format!("Invalid CRUTEM year: '{}'", fields[0]))
        })?;
        if last_year == Some(year) {
            continue;
        }
        last_year = Some(year);

        let anomaly = fields[13].parse::<f64>().map_err(|_| {
            ProcessingError::InvalidFormat(format!("Invalid CRUTEM anomaly: '{}'", fields[13]))
        })?;
        series.push(GlobalAnnualAnomaly::new(year, anomaly));
    }

    series.sort_by_key(|point| point.year);
    Ok(series)
}

/// GISTEMP rows are `Year+Month, Station, Land+Ocean, Land_Only, Open_Ocean`
/// after a title line and a header line.
fn parse_giss<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<Vec<GlobalAnnualAnomaly>> {
    let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();

    for record in reader.records().skip(2) {
        let record = record?;
        if record.len() < 4 {
            continue;
        }

        let stamp = &record[0];
        let year = stamp
            .get(..4)
            .and_then(|y| y.parse::<i32>().ok())
            .ok_or_else(|| {
                ProcessingError::InvalidFormat(format!("Invalid GISTEMP date: '{}'", stamp))
            })?;
        let land_only = record[3].parse::<f64>().map_err(|_| {
            ProcessingError::InvalidFormat(format!("Invalid GISTEMP value: '{}'", &record[3]))
        })?;

        let entry = by_year.entry(year).or_insert((0.0, 0));
        entry.0 += land_only;
        entry.1 += 1;
    }

    Ok(by_year
        .into_iter()
        .map(|(year, (sum, count))| GlobalAnnualAnomaly::new(year, sum / count as f64))
        .collect())
}
