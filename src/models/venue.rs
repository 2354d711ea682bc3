//! Venue and trail candidates returned by the place lookup

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// A campsite or campground eligible for recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Venue {
    /// Provider identifier, when the provider has one
    pub id: Option<String>,
    pub name: String,
    pub location: Coordinate,
    /// Amenity tags such as `fishing`, `hiking_trails` or `quiet`
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Open/closed flag; doubles as the availability signal
    pub is_open: Option<bool>,
    /// Provider rating (usually 1.0-5.0)
    pub rating: Option<f32>,
    /// Display data passed through untouched
    #[serde(default)]
    pub details: VenueDetails,
}

/// Pass-through display fields. Never scored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VenueDetails {
    pub address: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

impl Venue {
    /// Create a venue with only the required fields set
    #[must_use]
    pub fn new(name: impl Into<String>, location: Coordinate) -> Self {
        Self {
            id: None,
            name: name.into(),
            location,
            amenities: Vec::new(),
            is_open: None,
            rating: None,
            details: VenueDetails::default(),
        }
    }

    #[must_use]
    pub fn with_amenities<I, S>(mut self, amenities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.amenities = amenities.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_open(mut self, is_open: bool) -> Self {
        self.is_open = Some(is_open);
        self
    }

    /// Case-insensitive amenity check
    #[must_use]
    pub fn has_amenity(&self, amenity: &str) -> bool {
        self.amenities
            .iter()
            .any(|a| a.trim().eq_ignore_ascii_case(amenity))
    }

    /// True only when the provider explicitly reported the venue closed
    #[must_use]
    pub fn is_known_unavailable(&self) -> bool {
        self.is_open == Some(false)
    }
}

/// A hiking trail near the user. Used for the hiking preference and
/// returned alongside recommendations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trail {
    pub id: Option<String>,
    pub name: String,
    pub location: Coordinate,
    pub rating: Option<f32>,
    pub address: Option<String>,
    pub is_open: Option<bool>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

impl Trail {
    #[must_use]
    pub fn new(name: impl Into<String>, location: Coordinate) -> Self {
        Self {
            id: None,
            name: name.into(),
            location,
            rating: None,
            address: None,
            is_open: None,
            phone: None,
            website: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinate() -> Coordinate {
        Coordinate::new(45.0, -75.0).unwrap()
    }

    #[test]
    fn test_amenity_lookup_ignores_case() {
        let venue = Venue::new("Lakeside", coordinate()).with_amenities(["Fishing", " water "]);
        assert!(venue.has_amenity("fishing"));
        assert!(venue.has_amenity("WATER"));
        assert!(!venue.has_amenity("showers"));
    }

    #[test]
    fn test_unknown_availability_is_not_unavailable() {
        let venue = Venue::new("Unknown", coordinate());
        assert!(!venue.is_known_unavailable());
        assert!(venue.clone().with_open(false).is_known_unavailable());
        assert!(!venue.with_open(true).is_known_unavailable());
    }

    #[test]
    fn test_minimal_venue_deserializes() {
        let venue: Venue = serde_json::from_str(
            r#"{"id": null, "name": "Pine Flats", "location": {"latitude": 45.1, "longitude": -75.1},
                "is_open": null, "rating": null}"#,
        )
        .unwrap();
        assert!(venue.amenities.is_empty());
        assert_eq!(venue.details, VenueDetails::default());
    }
}
