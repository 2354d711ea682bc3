//! OpenWeatherMap current-weather client

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{WeatherLookup, build_http_client, ensure_success};
use crate::cache::MemoCache;
use crate::config::ServiceConfig;
use crate::models::{Coordinate, WeatherSnapshot};
use crate::Result;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const MISSING_KEY_DESCRIPTION: &str = "API key missing";
pub const UNAVAILABLE_DESCRIPTION: &str = "unavailable";

/// Condition groups that count as rain
const WET_CONDITIONS: &[&str] = &["Rain", "Drizzle", "Thunderstorm"];

pub struct OpenWeatherClient {
    client: ClientWithMiddleware,
    api_key: Option<String>,
    base_url: String,
    cache: Arc<MemoCache<WeatherSnapshot>>,
}

/// Current weather response from OpenWeatherMap (metric units)
#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    main: Option<MainData>,
    clouds: Option<CloudData>,
    wind: Option<WindData>,
    rain: Option<serde_json::Value>,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct MainData {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CloudData {
    all: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WindData {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    main: String,
    description: String,
}

impl CurrentWeatherResponse {
    fn into_snapshot(self) -> WeatherSnapshot {
        // No rain volume and no condition groups means rain is unknown
        let is_raining = if self.rain.is_some() {
            Some(true)
        } else if self.weather.is_empty() {
            None
        } else {
            Some(
                self.weather
                    .iter()
                    .any(|c| WET_CONDITIONS.contains(&c.main.as_str())),
            )
        };
        let description = self
            .weather
            .first()
            .map_or_else(|| "unknown".to_string(), |c| c.description.clone());

        WeatherSnapshot {
            temperature_c: self.main.as_ref().and_then(|m| m.temp),
            cloud_cover_pct: self.clouds.and_then(|c| c.all),
            is_raining,
            humidity_pct: self.main.and_then(|m| m.humidity),
            wind_speed_ms: self.wind.and_then(|w| w.speed),
            description,
            fetched_at: Utc::now(),
        }
    }
}

impl OpenWeatherClient {
    /// Create a new client sharing the given memo cache
    pub fn new(config: &ServiceConfig, cache: Arc<MemoCache<WeatherSnapshot>>) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            api_key: config.api_key().map(str::to_string),
            base_url: config.base_url_or(DEFAULT_BASE_URL),
            cache,
        })
    }

    async fn fetch(&self, api_key: &str, location: &Coordinate) -> Result<WeatherSnapshot> {
        let url = format!(
            "{}/weather?lat={}&lon={}&appid={}&units=metric",
            self.base_url,
            location.latitude(),
            location.longitude(),
            urlencoding::encode(api_key)
        );
        let response = self.client.get(&url).send().await?;
        let response = ensure_success("Weather", response).await?;
        let body: CurrentWeatherResponse = response.json().await?;
        Ok(body.into_snapshot())
    }
}

#[async_trait]
impl WeatherLookup for OpenWeatherClient {
    #[instrument(name = "current_weather", skip(self))]
    async fn current_weather(&self, location: &Coordinate) -> WeatherSnapshot {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("Weather API key is not configured");
            return WeatherSnapshot::unavailable(MISSING_KEY_DESCRIPTION);
        };

        let key = location.cache_key("weather");
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        match self.fetch(api_key, location).await {
            Ok(snapshot) => {
                self.cache.put(&key, snapshot.clone());
                snapshot
            }
            Err(e) => {
                warn!("Weather lookup failed for {}: {}", location.format_coordinates(), e);
                WeatherSnapshot::unavailable(UNAVAILABLE_DESCRIPTION)
            }
        }
    }
}
