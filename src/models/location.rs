//! Geographic coordinate model

use serde::{Deserialize, Serialize};

use crate::GeoguideError;

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees, within [-90, 90]
    pub latitude: f64,
    /// Longitude in decimal degrees, within [-180, 180]
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting values outside the valid ranges
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoguideError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoguideError::validation(
                "latitude",
                format!("latitude {latitude} is outside [-90, 90]"),
                "value_error.range",
            ));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoguideError::validation(
                "longitude",
                format!("longitude {longitude} is outside [-180, 180]"),
                "value_error.range",
            ));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse the `"lat,lon"` form used by IP geolocation providers
    #[must_use]
    pub fn parse_pair(value: &str) -> Option<Self> {
        let (lat, lon) = value.split_once(',')?;
        let latitude = lat.trim().parse().ok()?;
        let longitude = lon.trim().parse().ok()?;
        Self::new(latitude, longitude).ok()
    }

    /// Describe the coordinate the way the narrative prompt expects it
    #[must_use]
    pub fn describe(&self) -> String {
        format!("latitude {}, longitude {}", self.latitude, self.longitude)
    }

    /// Format location as a short coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_describe_keeps_full_precision() {
        let coordinate = Coordinate::new(40.7128, -74.006).unwrap();
        assert_eq!(coordinate.describe(), "latitude 40.7128, longitude -74.006");
        assert_eq!(coordinate.format_coordinates(), "40.7128, -74.0060");
    }

    #[rstest]
    #[case(90.0, 180.0)]
    #[case(-90.0, -180.0)]
    #[case(0.0, 0.0)]
    fn test_bounds_are_inclusive(#[case] lat: f64, #[case] lon: f64) {
        assert!(Coordinate::new(lat, lon).is_ok());
    }

    #[rstest]
    #[case(90.1, 0.0, "latitude")]
    #[case(-91.0, 0.0, "latitude")]
    #[case(f64::NAN, 0.0, "latitude")]
    #[case(0.0, 180.5, "longitude")]
    #[case(0.0, f64::INFINITY, "longitude")]
    fn test_out_of_range_rejected(#[case] lat: f64, #[case] lon: f64, #[case] expected: &str) {
        match Coordinate::new(lat, lon) {
            Err(GeoguideError::Validation { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_pair() {
        let coordinate = Coordinate::parse_pair("48.8534,2.3488").unwrap();
        assert_eq!(coordinate.latitude, 48.8534);
        assert_eq!(coordinate.longitude, 2.3488);

        assert!(Coordinate::parse_pair("").is_none());
        assert!(Coordinate::parse_pair("48.8534").is_none());
        assert!(Coordinate::parse_pair("north,east").is_none());
        assert!(Coordinate::parse_pair("200,0").is_none());
    }
}
