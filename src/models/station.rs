use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StationMetadata {
    #[validate(length(equal = 11))]
    pub station_id: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    pub elevation: Option<f64>,

    pub name: String,
}

impl StationMetadata {
    pub fn new(
        station_id: String,
        latitude: f64,
        longitude: f64,
        elevation: Option<f64>,
        name: String,
    ) -> Self {
        Self {
            station_id,
            latitude,
            longitude,
            elevation,
            name,
        }
    }

    /// FIPS-style country prefix of the GHCN station identifier
    pub fn country_code(&self) -> &str {
        self.station_id.get(..2).unwrap_or("")
    }
}
