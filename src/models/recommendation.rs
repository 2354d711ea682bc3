//! Scored results and the final recommendation bundle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LightPollutionReading, Trail, Venue, WeatherSnapshot};

/// A venue with everything that went into its score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredVenue {
    #[serde(flatten)]
    pub venue: Venue,
    /// Great-circle distance from the user in km
    pub distance_km: f64,
    pub weather: WeatherSnapshot,
    pub light_pollution: LightPollutionReading,
    /// Composite score; unbounded and may be negative
    pub score: f64,
}

/// Text returned by the text-generation provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedText {
    pub text: String,
    pub generated_at: DateTime<Utc>,
    /// True when `text` is a canned fallback rather than generated output
    pub is_fallback: bool,
}

impl GeneratedText {
    #[must_use]
    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            generated_at: Utc::now(),
            is_fallback: false,
        }
    }

    #[must_use]
    pub fn fallback(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            generated_at: Utc::now(),
            is_fallback: true,
        }
    }
}

/// Output of one recommendation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationBundle {
    /// Every scored venue, best first
    pub results: Vec<ScoredVenue>,
    pub summary: GeneratedText,
    /// Trails found near the user, if they were looked up
    #[serde(default)]
    pub trails: Vec<Trail>,
}

impl RecommendationBundle {
    /// The first `k` results
    #[must_use]
    pub fn top(&self, k: usize) -> &[ScoredVenue] {
        &self.results[..k.min(self.results.len())]
    }
}
