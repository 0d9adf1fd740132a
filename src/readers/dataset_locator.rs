use crate::error::{ProcessingError, Result};
use crate::utils::constants::{DATA_FILE_EXTENSION, INVENTORY_FILE_EXTENSION};
use std::fs;
use std::path::{Path, PathBuf};

/// The `.dat`/`.inv` pair of one GHCN-M release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub data: PathBuf,
    pub inventory: PathBuf,
}

/// Finds the data and inventory files inside an extracted GHCN-M archive.
///
/// The archive unpacks to a versioned directory such as
/// `ghcnm.v4.0.1.20240101/`, so both the given directory and its
/// `ghcnm*` subdirectories are searched.
pub struct DatasetLocator;

impl DatasetLocator {
    pub fn locate(dir: &Path) -> Result<DatasetPaths> {
        if !dir.is_dir() {
            return Err(ProcessingError::InvalidFormat(format!(
                "Path is not a directory: {}",
                dir.display()
            )));
        }

        if let Some(paths) = Self::locate_in(dir)? {
            return Ok(paths);
        }

        let mut candidates: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_dir()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with("ghcnm"))
            })
            .collect();
        // newest release last
        candidates.sort();

        for candidate in candidates.iter().rev() {
            if let Some(paths) = Self::locate_in(candidate)? {
                return Ok(paths);
            }
        }

        Err(ProcessingError::MissingData(format!(
            "No GHCN-M .{} and .{} files found under {}",
            DATA_FILE_EXTENSION,
            INVENTORY_FILE_EXTENSION,
            dir.display()
        )))
    }

    fn locate_in(dir: &Path) -> Result<Option<DatasetPaths>> {
        let data = Self::first_with_extension(dir, DATA_FILE_EXTENSION)?;
        let inventory = Self::first_with_extension(dir, INVENTORY_FILE_EXTENSION)?;

        Ok(match (data, inventory) {
            (Some(data), Some(inventory)) => Some(DatasetPaths { data, inventory }),
            _ => None,
        })
    }

    fn first_with_extension(dir: &Path, extension: &str) -> Result<Option<PathBuf>> {
        let mut matches = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
                matches.push(path);
            }
        }
        matches.sort();
        Ok(matches.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_locate_in_flat_directory() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("ghcnm.tavg.qcu.dat"), "")?;
        fs::write(dir.path().join("ghcnm.tavg.qcu.inv"), "")?;

        let paths = DatasetLocator::locate(dir.path())?;
        assert!(paths.data.ends_with("ghcnm.tavg.qcu.dat"));
        assert!(paths.inventory.ends_with("ghcnm.tavg.qcu.inv"));
        Ok(())
    }

    #[test]
    fn test_locate_in_release_subdirectory() -> Result<()> {
        let dir = TempDir::new()?;
        for release in ["ghcnm.v4.0.1.20240101", "ghcnm.v4.0.1.20250101"] {
            let sub = dir.path().join(release);
            fs::create_dir(&sub)?;
            fs::write(sub.join("ghcnm.tavg.v4.qcu.dat"), "")?;
            fs::write(sub.join("ghcnm.tavg.v4.qcu.inv"), "")?;
        }
        fs::write(dir.path().join("landmask.csv"), "")?;

        let paths = DatasetLocator::locate(dir.path())?;
        assert!(paths
            .data
            .parent()
            .unwrap()
            .ends_with("ghcnm.v4.0.1.20250101"));
        Ok(())
    }

    #[test]
    fn test_missing_dataset() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("only.dat"), "")?;

        assert!(matches!(
            DatasetLocator::locate(dir.path()),
            Err(ProcessingError::MissingData(_))
        ));
        assert!(DatasetLocator::locate(&dir.path().join("absent")).is_err());
        Ok(())
    }
}
