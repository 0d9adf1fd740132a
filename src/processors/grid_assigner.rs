use crate::error::Result;
use crate::models::{GridBox, GridCell, StationCell, StationMetadata};
use std::collections::HashMap;
use tracing::debug;

/// Stations placed in land-mask cells, keyed by station ID
#[derive(Debug, Clone, Default)]
pub struct GridAssignment {
    pub cells: HashMap<String, StationCell>,
    pub unmatched_stations: Vec<String>,
}

impl GridAssignment {
    pub fn get(&self, station_id: &str) -> Option<&StationCell> {
        self.cells.get(station_id)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Bins stations into gridboxes and inner-joins them with the land mask.
pub struct GridAssigner {
    land_mask: HashMap<GridBox, GridCell>,
}

impl GridAssigner {
    pub fn new(land_mask: &[GridCell]) -> Self {
        let mut map = HashMap::with_capacity(land_mask.len());
        for cell in land_mask {
            map.entry(cell.gridbox).or_insert(*cell);
        }
        Self { land_mask: map }
    }

    /// Place one station; `Ok(None)` when its gridbox has no land-mask entry
    pub fn assign(&self, station: &StationMetadata) -> Result<Option<StationCell>> {
        let gridbox = GridBox::from_coordinates(station.latitude, station.longitude)?;

        Ok(self.land_mask.get(&gridbox).map(|cell| StationCell {
            station_id: station.station_id.clone(),
            cell: *cell,
            weight: cell.weight(),
        }))
    }

    /// Place every station; unmatched stations are recorded, not an error
    pub fn assign_all(&self, stations: &[StationMetadata]) -> Result<GridAssignment> {
        let mut assignment = GridAssignment {
            cells: HashMap::with_capacity(stations.len()),
            unmatched_stations: Vec::new(),
        };

        for station in stations {
            if assignment.cells.contains_key(&station.station_id) {
                continue;
            }

            match self.assign(station)? {
                Some(cell) => {
                    assignment.cells.insert(station.station_id.clone(), cell);
                }
                None => {
                    debug!(
                        station = %station.station_id,
                        latitude = station.latitude,
                        longitude = station.longitude,
                        "no land-mask entry for station gridbox"
                    );
                    assignment.unmatched_stations.push(station.station_id.clone());
                }
            }
        }

        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: &str, latitude: f64, longitude: f64) -> StationMetadata {
        StationMetadata::new(id.to_string(), latitude, longitude, None, id.to_string())
    }

    fn cell(label: &str, land_fraction: f64) -> GridCell {
        GridCell::new(label.parse().unwrap(), land_fraction)
    }

    #[test]
    fn test_assign_joins_land_mask() {
        let assigner = GridAssigner::new(&[cell("52.5 lat -2.5 lon", 0.8)]);

        let placed = assigner
            .assign(&station("UKE00105915", 51.478, -0.461))
            .unwrap()
            .unwrap();
        assert_eq!(placed.cell.gridbox.to_string(), "52.5 lat -2.5 lon");
        assert_eq!(placed.cell.land_fraction, 0.8);

        let expected = (55.0_f64.to_radians().sin() - 50.0_f64.to_radians().sin()) * 0.8;
        assert!((placed.weight - expected).abs() < 1e-12);
    }

    #[test]
    fn test_unmatched_stations_are_excluded() {
        let assigner = GridAssigner::new(&[cell("52.5 lat -2.5 lon", 0.8)]);
        let stations = vec![
            station("UKE00105915", 51.478, -0.461),
            station("ASN00066062", -33.861, 151.205),
        ];

        let assignment = assigner.assign_all(&stations).unwrap();
        assert_eq!(assignment.len(), 1);
        assert!(assignment.get("UKE00105915").is_some());
        assert!(assignment.get("ASN00066062").is_none());
        assert_eq!(assignment.unmatched_stations, vec!["ASN00066062".to_string()]);
    }

    #[test]
    fn test_all_ocean_cell_keeps_station_with_zero_weight() {
        let assigner = GridAssigner::new(&[cell("-2.5 lat -32.5 lon", 0.0)]);
        let assignment = assigner
            .assign_all(&[station("XXX00000001", -1.0, -31.0)])
            .unwrap();

        assert_eq!(assignment.len(), 1);
        assert_eq!(assignment.get("XXX00000001").unwrap().weight, 0.0);
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let mask = [cell("52.5 lat -2.5 lon", 0.8), cell("7.5 lat 2.5 lon", 0.4)];
        let stations = vec![
            station("UKE00105915", 51.478, -0.461),
            station("GHM00065472", 5.0, 0.0),
        ];

        let first = GridAssigner::new(&mask).assign_all(&stations).unwrap();
        let second = GridAssigner::new(&mask).assign_all(&stations).unwrap();
        assert_eq!(first.cells, second.cells);
        assert_eq!(
            first.get("GHM00065472").unwrap().cell.gridbox.to_string(),
            "7.5 lat 2.5 lon"
        );
    }
}
