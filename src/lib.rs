//! `campfinder` - Campsite recommendations from places, weather and dark-sky data
//!
//! This library looks up campsites around a user, enriches each one with
//! current weather and light pollution, ranks them with a tunable scoring
//! policy and asks a text-generation provider for a short summary.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod geo;
pub mod logging;
pub mod models;
pub mod recommendation;
pub mod scoring;
pub mod services;
pub mod web;

// Re-export core types for public API
pub use cache::MemoCache;
pub use config::CampfinderConfig;
pub use error::CampfinderError;
pub use models::{
    Coordinate, GeneratedText, GeocodedLocation, LightPollutionPolarity, LightPollutionReading,
    RecommendationBundle, ScoredVenue, Trail, UserPreferences, Venue, WeatherSnapshot,
};
pub use recommendation::{Collaborators, RecommendationService, RecommendationSettings};
pub use scoring::{EnrichedVenue, ScoringPolicy};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CampfinderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
