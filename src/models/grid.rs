use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{GRID_SIZE_DEGREES, LAT_BAND_COUNT, LON_BAND_COUNT};

/// A 5°×5° latitude/longitude cell.
///
/// Stored as band indices so keys hash and order exactly; the centre
/// coordinates are derived. Ordering is latitude band first, then longitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridBox {
    lat_index: u16,
    lon_index: u16,
}

impl GridBox {
    /// Bin a station location into its gridbox.
    ///
    /// Bins are lower-closed and upper-open; the closed outer edges
    /// (latitude 90, longitude 180) belong to the last bin.
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ProcessingError::InvalidCoordinate(format!(
                "Latitude {} is outside [-90, 90]",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ProcessingError::InvalidCoordinate(format!(
                "Longitude {} is outside [-180, 180]",
                longitude
            )));
        }

        Ok(Self {
            lat_index: band_index(latitude, -90.0, LAT_BAND_COUNT),
            lon_index: band_index(longitude, -180.0, LON_BAND_COUNT),
        })
    }

    /// Look up a gridbox by its centre coordinates (e.g. `52.5`, `-2.5`).
    pub fn from_bands(lat_band: f64, lon_band: f64) -> Result<Self> {
        let half = GRID_SIZE_DEGREES / 2.0;
        let gridbox = Self::from_coordinates(lat_band, lon_band)?;

        if (gridbox.lat_band() - lat_band).abs() > 1e-9
            || (gridbox.lon_band() - lon_band).abs() > 1e-9
        {
            return Err(ProcessingError::InvalidCoordinate(format!(
                "({}, {}) is not a gridbox centre; centres are offset by {} from the {}° grid",
                lat_band, lon_band, half, GRID_SIZE_DEGREES
            )));
        }

        Ok(gridbox)
    }

    pub fn lat_band(&self) -> f64 {
        self.lat_index as f64 * GRID_SIZE_DEGREES - 90.0 + GRID_SIZE_DEGREES / 2.0
    }

    pub fn lon_band(&self) -> f64 {
        self.lon_index as f64 * GRID_SIZE_DEGREES - 180.0 + GRID_SIZE_DEGREES / 2.0
    }

    /// Southern and northern latitude edges in degrees
    pub fn lat_bounds(&self) -> (f64, f64) {
        let half = GRID_SIZE_DEGREES / 2.0;
        (self.lat_band() - half, self.lat_band() + half)
    }

    /// Relative spherical surface area of the cell's latitude band.
    pub fn area_factor(&self) -> f64 {
        let (lower, upper) = self.lat_bounds();
        upper.to_radians().sin() - lower.to_radians().sin()
    }
}

fn band_index(value: f64, origin: f64, count: i64) -> u16 {
    let index = ((value - origin) / GRID_SIZE_DEGREES).floor() as i64;
    index.clamp(0, count - 1) as u16
}

impl fmt::Display for GridBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} lat {:.1} lon", self.lat_band(), self.lon_band())
    }
}

impl FromStr for GridBox {
    type Err = ProcessingError;

    /// Parse the land-mask key format `"<lat> lat <lon> lon"`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.len() != 4 || parts[1] != "lat" || parts[3] != "lon" {
            return Err(ProcessingError::InvalidFormat(format!(
                "Invalid gridbox label: '{}'. Expected format: '<lat> lat <lon> lon'",
                s
            )));
        }

        let lat = parts[0].parse::<f64>().map_err(|_| {
            ProcessingError::InvalidFormat(format!("Invalid gridbox latitude: '{}'", parts[0]))
        })?;
        let lon = parts[2].parse::<f64>().map_err(|_| {
            ProcessingError::InvalidFormat(format!("Invalid gridbox longitude: '{}'", parts[2]))
        })?;

        Self::from_bands(lat, lon)
    }
}

/// One row of the land-mask table as it appears on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LandMaskEntry {
    pub gridbox: String,

    #[validate(range(min = 0.0, max = 1.0))]
    pub land_percent: f64,

    #[validate(range(min = 0.0, max = 1.0))]
    pub ocean_percent: f64,
}

/// A gridbox joined with its land fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub gridbox: GridBox,
    pub land_fraction: f64,
}

impl GridCell {
    pub fn new(gridbox: GridBox, land_fraction: f64) -> Self {
        Self {
            gridbox,
            land_fraction,
        }
    }

    /// Area-and-land weight used by the global reduction
    pub fn weight(&self) -> f64 {
        self.gridbox.area_factor() * self.land_fraction
    }
}

/// A station placed in its grid cell, reused for every month and year of that station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationCell {
    pub station_id: String,
    pub cell: GridCell,
    pub weight: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binning_centres() {
        let gridbox = GridBox::from_coordinates(51.478, -0.461).unwrap();
        assert_eq!(gridbox.lat_band(), 52.5);
        assert_eq!(gridbox.lon_band(), -2.5);

        let gridbox = GridBox::from_coordinates(-33.9, 151.2).unwrap();
        assert_eq!(gridbox.lat_band(), -32.5);
        assert_eq!(gridbox.lon_band(), 152.5);
    }

    #[test]
    fn test_boundaries_are_lower_closed() {
        let gridbox = GridBox::from_coordinates(5.0, 10.0).unwrap();
        assert_eq!(gridbox.lat_band(), 7.5);
        assert_eq!(gridbox.lon_band(), 12.5);

        let gridbox = GridBox::from_coordinates(0.0, 0.0).unwrap();
        assert_eq!(gridbox.lat_band(), 2.5);
        assert_eq!(gridbox.lon_band(), 2.5);

        let gridbox = GridBox::from_coordinates(-90.0, -180.0).unwrap();
        assert_eq!(gridbox.lat_band(), -87.5);
        assert_eq!(gridbox.lon_band(), -177.5);
    }

    #[test]
    fn test_outer_edges_fall_in_last_bin() {
        let gridbox = GridBox::from_coordinates(90.0, 180.0).unwrap();
        assert_eq!(gridbox.lat_band(), 87.5);
        assert_eq!(gridbox.lon_band(), 177.5);
    }

    #[test]
    fn test_every_valid_coordinate_maps_to_one_gridbox() {
        let mut lat = -90.0;
        while lat <= 90.0 {
            let mut lon = -180.0;
            while lon <= 180.0 {
                let first = GridBox::from_coordinates(lat, lon).unwrap();
                let second = GridBox::from_coordinates(lat, lon).unwrap();
                assert_eq!(first, second);

                let (lower, upper) = first.lat_bounds();
                assert!(lat >= lower && (lat < upper || lat == 90.0));
                assert!((-87.5..=87.5).contains(&first.lat_band()));
                assert!((-177.5..=177.5).contains(&first.lon_band()));
                lon += 2.5;
            }
            lat += 1.25;
        }
    }

    #[test]
    fn test_out_of_range_coordinates_rejected() {
        assert!(GridBox::from_coordinates(90.1, 0.0).is_err());
        assert!(GridBox::from_coordinates(0.0, -180.1).is_err());
        assert!(GridBox::from_coordinates(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_label_round_trip() {
        let gridbox = GridBox::from_coordinates(-1.0, -1.0).unwrap();
        assert_eq!(gridbox.to_string(), "-2.5 lat -2.5 lon");
        assert_eq!("-2.5 lat -2.5 lon".parse::<GridBox>().unwrap(), gridbox);
        assert_eq!(
            "87.5 lat 177.5 lon".parse::<GridBox>().unwrap(),
            GridBox::from_coordinates(89.0, 179.0).unwrap()
        );
    }

    #[test]
    fn test_invalid_labels() {
        assert!("52.5 -2.5".parse::<GridBox>().is_err());
        assert!("north lat -2.5 lon".parse::<GridBox>().is_err());
        assert!("52.0 lat -2.5 lon".parse::<GridBox>().is_err()); // not a centre
        assert!("92.5 lat -2.5 lon".parse::<GridBox>().is_err());
    }

    #[test]
    fn test_weight_non_negative_and_zero_iff_no_land() {
        for lat_index in 0..LAT_BAND_COUNT {
            let lat = -90.0 + lat_index as f64 * GRID_SIZE_DEGREES + 1.0;
            let gridbox = GridBox::from_coordinates(lat, 0.0).unwrap();

            assert!(gridbox.area_factor() > 0.0);
            assert_eq!(GridCell::new(gridbox, 0.0).weight(), 0.0);
            assert!(GridCell::new(gridbox, 0.3).weight() > 0.0);
        }
    }

    #[test]
    fn test_equatorial_cells_outweigh_polar_cells() {
        let equator = GridBox::from_coordinates(1.0, 0.0).unwrap();
        let pole = GridBox::from_coordinates(89.0, 0.0).unwrap();
        assert!(equator.area_factor() > pole.area_factor() * 10.0);

        let expected = 5.0_f64.to_radians().sin();
        assert!((equator.area_factor() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_area_factors_sum_to_sphere() {
        // Σ over all latitude bands of (sin(upper) - sin(lower)) = sin(90°) - sin(-90°)
        let total: f64 = (0..LAT_BAND_COUNT)
            .map(|i| {
                GridBox::from_coordinates(-90.0 + i as f64 * GRID_SIZE_DEGREES, 0.0)
                    .unwrap()
                    .area_factor()
            })
            .sum();
        assert!((total - 2.0).abs() < 1e-12);
    }
}
