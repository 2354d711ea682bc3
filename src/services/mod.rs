//! External data providers
//!
//! Each provider sits behind a small trait so the recommendation pipeline
//! can be driven by fakes in tests. Implementations never surface transport
//! failures to the caller; they log and return a documented fallback.

use std::time::Duration;

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::config::ServiceConfig;
use crate::models::{
    Coordinate, GeneratedText, GeocodedLocation, LightPollutionReading, Trail, Venue, WeatherSnapshot,
};
use crate::{CampfinderError, Result};

pub mod geocoding;
pub mod light_pollution;
pub mod places;
pub mod text_generation;
pub mod weather;

pub use geocoding::NominatimClient;
pub use light_pollution::LightPollutionClient;
pub use places::GooglePlacesClient;
pub use text_generation::GeminiClient;
pub use weather::OpenWeatherClient;

/// Campsite search around a coordinate. Fails open with an empty list.
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    async fn nearby_venues(&self, center: &Coordinate, radius_km: f64, place_type: &str) -> Vec<Venue>;
}

/// Hiking trail search around a coordinate. Fails open with an empty list.
#[async_trait]
pub trait TrailLookup: Send + Sync {
    async fn nearby_trails(&self, center: &Coordinate, radius_km: f64) -> Vec<Trail>;
}

/// Current weather at a coordinate; unavailable snapshot on failure
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn current_weather(&self, location: &Coordinate) -> WeatherSnapshot;
}

/// Light-pollution level at a coordinate; fallback reading on failure
#[async_trait]
pub trait LightPollutionLookup: Send + Sync {
    async fn light_pollution(&self, location: &Coordinate) -> LightPollutionReading;
}

/// Address to coordinate resolution; `None` when nothing matches or the lookup fails
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Option<GeocodedLocation>;
}

/// Free-text generation; fallback text on failure
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> GeneratedText;
}

const USER_AGENT: &str = concat!("campfinder/", env!("CARGO_PKG_VERSION"));

/// HTTP client with timeout and transient-failure retries
pub fn build_http_client(config: &ServiceConfig) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| CampfinderError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Turn a non-success status into an API error carrying the body text
pub(crate) async fn ensure_success(provider: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(match status.as_u16() {
        401 | 403 => CampfinderError::api(format!("{provider} rejected the API key ({status})")),
        429 => CampfinderError::api(format!("{provider} rate limit exceeded")),
        _ => CampfinderError::api(format!("{provider} error {status}: {body}")),
    })
}
