//! Recommendation pipeline
//!
//! One request runs: campsite lookup, optional trail lookup, weather and
//! light-pollution enrichment per campsite, scoring and ranking, then a
//! text summary of the top results. Collaborator failures degrade to their
//! fallback values, so a valid coordinate always yields a complete bundle.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, instrument};

use crate::cache::MemoCache;
use crate::config::{CampfinderConfig, DefaultsConfig};
use crate::models::{Coordinate, GeocodedLocation, RecommendationBundle, ScoredVenue, Trail, UserPreferences, Venue};
use crate::scoring::{self, EnrichedVenue, ScoringPolicy};
use crate::services::{
    GeminiClient, Geocoder, GooglePlacesClient, LightPollutionClient, LightPollutionLookup,
    NominatimClient, OpenWeatherClient, PlaceLookup, TextGenerator, TrailLookup, WeatherLookup,
};
use crate::{CampfinderError, Result};

const PROMPT_QUESTION: &str =
    "Which campsite is best for the user and why? Provide a succinct recommendation.";
const NO_CANDIDATES: &str = "No candidate campsites found.";

/// The external data sources a recommendation is built from
#[derive(Clone)]
pub struct Collaborators {
    pub places: Arc<dyn PlaceLookup>,
    pub trails: Arc<dyn TrailLookup>,
    pub weather: Arc<dyn WeatherLookup>,
    pub light_pollution: Arc<dyn LightPollutionLookup>,
    pub text: Arc<dyn TextGenerator>,
    pub geocoder: Arc<dyn Geocoder>,
}

impl Collaborators {
    /// HTTP-backed collaborators with their memo caches
    pub fn from_config(config: &CampfinderConfig) -> Result<Self> {
        let places = Arc::new(GooglePlacesClient::new(&config.places)?);
        let weather_cache = Arc::new(MemoCache::from_config(&config.cache));
        let text_cache = Arc::new(MemoCache::from_config(&config.cache));

        Ok(Self {
            places: places.clone(),
            trails: places,
            weather: Arc::new(OpenWeatherClient::new(&config.weather, weather_cache)?),
            light_pollution: Arc::new(LightPollutionClient::new(&config.light_pollution)?),
            text: Arc::new(GeminiClient::new(&config.text_generation, text_cache)?),
            geocoder: Arc::new(NominatimClient::new(&config.geocoding)?),
        })
    }
}

/// Per-request search settings
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSettings {
    pub search_radius_km: f64,
    pub place_type: String,
    /// Number of results rendered into the summary prompt
    pub top_k: usize,
    pub include_trails: bool,
    pub trail_radius_km: f64,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self::from(&DefaultsConfig::default())
    }
}

impl From<&DefaultsConfig> for RecommendationSettings {
    fn from(defaults: &DefaultsConfig) -> Self {
        Self {
            search_radius_km: defaults.search_radius_km,
            place_type: defaults.place_type.clone(),
            top_k: defaults.top_k,
            include_trails: defaults.include_trails,
            trail_radius_km: defaults.trail_radius_km,
        }
    }
}

pub struct RecommendationService {
    collaborators: Collaborators,
    settings: RecommendationSettings,
    policy: ScoringPolicy,
}

impl RecommendationService {
    #[must_use]
    pub fn new(collaborators: Collaborators, settings: RecommendationSettings, policy: ScoringPolicy) -> Self {
        Self {
            collaborators,
            settings,
            policy,
        }
    }

    /// Build the service and its HTTP collaborators from configuration
    pub fn from_config(config: &CampfinderConfig) -> Result<Self> {
        Ok(Self::new(
            Collaborators::from_config(config)?,
            RecommendationSettings::from(&config.defaults),
            config.scoring.clone(),
        ))
    }

    #[must_use]
    pub fn settings(&self) -> &RecommendationSettings {
        &self.settings
    }

    #[must_use]
    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Validate raw coordinates, then recommend
    pub async fn recommend_at(
        &self,
        latitude: f64,
        longitude: f64,
        prefs: &UserPreferences,
    ) -> Result<RecommendationBundle> {
        let user = Coordinate::new(latitude, longitude)?;
        Ok(self.recommend(&user, prefs).await)
    }

    /// Run the full pipeline for one user location
    #[instrument(skip(self), fields(lat = user.latitude(), lon = user.longitude()))]
    pub async fn recommend(&self, user: &Coordinate, prefs: &UserPreferences) -> RecommendationBundle {
        let venues = self
            .collaborators
            .places
            .nearby_venues(user, self.settings.search_radius_km, &self.settings.place_type)
            .await;

        let trails = if self.settings.include_trails {
            self.collaborators
                .trails
                .nearby_trails(user, self.settings.trail_radius_km)
                .await
        } else {
            Vec::new()
        };

        let candidates = self.enrich(user, venues).await;
        let results = self.policy.rank(candidates, prefs, &trails);

        let top = scoring::top_k(&results, self.settings.top_k);
        let prompt = render_prompt(prefs, top);
        let summary = self.collaborators.text.generate(&prompt).await;

        info!(
            "Ranked {} campsites with {} nearby trails",
            results.len(),
            trails.len()
        );

        RecommendationBundle {
            results,
            summary,
            trails,
        }
    }

    /// Campsites near `center`, using the configured defaults for missing arguments
    pub async fn find_places(&self, center: &Coordinate, radius_km: Option<f64>, place_type: Option<&str>) -> Vec<Venue> {
        self.collaborators
            .places
            .nearby_venues(
                center,
                radius_km.unwrap_or(self.settings.search_radius_km),
                place_type.unwrap_or(&self.settings.place_type),
            )
            .await
    }

    /// Hiking trails near `center`
    pub async fn find_trails(&self, center: &Coordinate, radius_km: Option<f64>) -> Vec<Trail> {
        self.collaborators
            .trails
            .nearby_trails(center, radius_km.unwrap_or(self.settings.trail_radius_km))
            .await
    }

    /// Resolve a free-form address; `Ok(None)` when nothing matches
    pub async fn locate(&self, address: &str) -> Result<Option<GeocodedLocation>> {
        let address = address.trim();
        if address.is_empty() {
            return Err(CampfinderError::validation("Address is required"));
        }
        Ok(self.collaborators.geocoder.geocode(address).await)
    }

    /// Fetch weather and light pollution for every venue. Lookups for
    /// different venues run concurrently; output keeps input order.
    async fn enrich(&self, user: &Coordinate, venues: Vec<Venue>) -> Vec<EnrichedVenue> {
        let weather = &self.collaborators.weather;
        let light_pollution = &self.collaborators.light_pollution;

        join_all(venues.into_iter().map(|venue| async move {
            let (snapshot, reading) = futures::join!(
                weather.current_weather(&venue.location),
                light_pollution.light_pollution(&venue.location)
            );
            EnrichedVenue::new(user, venue, snapshot, reading)
        }))
        .await
    }
}

/// Deterministic prompt text for the top results
#[must_use]
pub fn render_prompt(prefs: &UserPreferences, top: &[ScoredVenue]) -> String {
    let mut prompt = format!("User preferences: {prefs}.\nCandidate campsites:\n");

    if top.is_empty() {
        prompt.push_str(NO_CANDIDATES);
        prompt.push('\n');
    }
    for (rank, result) in top.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. {} (score: {:.2}) - weather: {}; light pollution: {}/9\n",
            rank + 1,
            result.venue.name,
            result.score,
            result.weather.summary(),
            result.light_pollution.level()
        ));
    }

    prompt.push('\n');
    prompt.push_str(PROMPT_QUESTION);
    prompt
}
