//! Geographic coordinate with range validation

use serde::{Deserialize, Serialize};

use crate::{CampfinderError, Result};

/// A validated WGS84 coordinate.
///
/// Construction rejects non-finite values and anything outside
/// `[-90, 90]` latitude / `[-180, 180]` longitude; nothing is clamped.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    /// Latitude in decimal degrees
    latitude: f64,
    /// Longitude in decimal degrees
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CampfinderError;

    fn try_from(raw: RawCoordinate) -> Result<Self> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Create a coordinate, rejecting out-of-range input
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CampfinderError::validation(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CampfinderError::validation(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Memo key for this exact coordinate. No rounding is applied.
    #[must_use]
    pub fn cache_key(&self, prefix: &str) -> String {
        format!("{prefix}:{}:{}", self.latitude, self.longitude)
    }
}

/// Result of an address search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeocodedLocation {
    pub lat: f64,
    pub lon: f64,
    /// Full address as reported by the geocoder
    pub address: String,
}

impl GeocodedLocation {
    #[must_use]
    pub fn new(location: Coordinate, address: impl Into<String>) -> Self {
        Self {
            lat: location.latitude(),
            lon: location.longitude(),
            address: address.into(),
        }
    }
}
