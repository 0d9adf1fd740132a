/// GHCN-M element handled by the pipeline
pub const ELEMENT_TAVG: &str = "TAVG";

/// Raw value encoding
pub const MISSING_VALUE_SENTINEL: i32 = -9999;
pub const RAW_VALUE_SCALE: f64 = 100.0;

/// Plausible range for a monthly mean temperature in °C
pub const MIN_VALID_TEMP: f64 = -90.0;
pub const MAX_VALID_TEMP: f64 = 60.0;

/// Grid geometry
pub const GRID_SIZE_DEGREES: f64 = 5.0;
pub const LAT_BAND_COUNT: i64 = 36;
pub const LON_BAND_COUNT: i64 = 72;

/// Climatological reference period (inclusive)
pub const BASELINE_START_YEAR: i32 = 1961;
pub const BASELINE_END_YEAR: i32 = 1990;

/// First year of the published series
pub const SERIES_START_YEAR: i32 = 1900;

/// File extensions inside an extracted GHCN-M archive
pub const DATA_FILE_EXTENSION: &str = "dat";
pub const INVENTORY_FILE_EXTENSION: &str = "inv";

/// Output column headers and JSON keys
pub const ANOMALY_COLUMN: &str = "anomaly (deg C)";
pub const TEMPERATURE_COLUMN: &str = "temperature (deg C)";
pub const YEAR_COLUMN: &str = "year";
pub const ANOMALY_KEY: &str = "anomalies";
pub const TEMPERATURE_KEY: &str = "temperatures";
pub const YEARS_KEY: &str = "years";

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
