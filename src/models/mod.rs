//! Data models for the campsite recommender
//!
//! This module contains the request-scoped domain models organized by concern:
//! - Location: validated coordinates
//! - Venue: campsite and trail candidates
//! - Weather and light pollution: per-venue enrichment
//! - Preferences: user flags that steer scoring
//! - Recommendation: scored output

pub mod light_pollution;
pub mod location;
pub mod preferences;
pub mod recommendation;
pub mod venue;
pub mod weather;

// Re-export all public types for convenient access
pub use light_pollution::{LightPollutionPolarity, LightPollutionReading};
pub use location::{Coordinate, GeocodedLocation};
pub use preferences::UserPreferences;
pub use recommendation::{GeneratedText, RecommendationBundle, ScoredVenue};
pub use venue::{Trail, Venue, VenueDetails};
pub use weather::WeatherSnapshot;
