use crate::error::{ProcessingError, Result};

/// Slice a fixed-width field out of a line by byte columns, trimmed.
///
/// Columns past the end of the line read as empty, so records with
/// trailing blanks stripped still parse.
pub fn fixed_field(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).map(str::trim).unwrap_or("")
}

/// Parse a decimal latitude and check it lies in [-90, 90]
pub fn parse_latitude(value: &str) -> Result<f64> {
    let latitude = parse_decimal(value, "latitude")?;
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Latitude {} is outside [-90, 90]",
            latitude
        )));
    }
    Ok(latitude)
}

/// Parse a decimal longitude and check it lies in [-180, 180]
pub fn parse_longitude(value: &str) -> Result<f64> {
    let longitude = parse_decimal(value, "longitude")?;
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Longitude {} is outside [-180, 180]",
            longitude
        )));
    }
    Ok(longitude)
}

fn parse_decimal(value: &str, what: &str) -> Result<f64> {
    let trimmed = value.trim();
    let parsed = trimmed.parse::<f64>().map_err(|_| {
        ProcessingError::InvalidCoordinate(format!("Invalid {} value: '{}'", what, value))
    })?;

    if !parsed.is_finite() {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Non-finite {} value: '{}'",
            what, value
        )));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_field() {
        let line = "ACW00011604  17.1167  -61.7833";
        assert_eq!(fixed_field(line, 0, 11), "ACW00011604");
        assert_eq!(fixed_field(line, 11, 21), "17.1167");
        assert_eq!(fixed_field(line, 21, 40), "-61.7833");
        assert_eq!(fixed_field(line, 40, 50), "");
    }

    #[test]
    fn test_parse_coordinates() {
        assert!((parse_latitude(" 17.1167").unwrap() - 17.1167).abs() < 1e-9);
        assert!((parse_longitude("-61.7833 ").unwrap() - -61.7833).abs() < 1e-9);
        assert_eq!(parse_latitude("-90.0").unwrap(), -90.0);
        assert_eq!(parse_longitude("180").unwrap(), 180.0);
    }

    #[test]
    fn test_invalid_coordinates() {
        assert!(parse_latitude("91.0").is_err());
        assert!(parse_latitude("abc").is_err());
        assert!(parse_latitude("").is_err());
        assert!(parse_latitude("NaN").is_err());
        assert!(parse_longitude("-180.5").is_err());
    }
}
