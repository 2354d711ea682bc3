//! Light-pollution lookup over a JSON HTTP endpoint

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{LightPollutionLookup, build_http_client, ensure_success};
use crate::config::LightPollutionConfig;
use crate::models::{Coordinate, LightPollutionReading};
use crate::{CampfinderError, Result};

const DEFAULT_BASE_URL: &str = "https://api.lightpollutiondata.com/v1";

pub struct LightPollutionClient {
    client: ClientWithMiddleware,
    api_key: Option<String>,
    base_url: String,
    fallback: LightPollutionReading,
}

#[derive(Debug, Deserialize)]
struct LightPollutionResponse {
    /// Level on the 1..=9 scale, 1 being the darkest sky
    level: f64,
}

impl LightPollutionResponse {
    fn into_reading(self) -> Result<LightPollutionReading> {
        let rounded = self.level.round();
        if !rounded.is_finite() || !(0.0..=f64::from(u8::MAX)).contains(&rounded) {
            return Err(CampfinderError::api(format!(
                "light pollution level {} is not a valid reading",
                self.level
            )));
        }
        LightPollutionReading::new(rounded as u8)
    }
}

impl LightPollutionClient {
    /// Create a new client
    pub fn new(config: &LightPollutionConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(&config.service)?,
            api_key: config.service.api_key().map(str::to_string),
            base_url: config.service.base_url_or(DEFAULT_BASE_URL),
            fallback: LightPollutionReading::fallback(config.default_level),
        })
    }

    async fn fetch(&self, api_key: &str, location: &Coordinate) -> Result<LightPollutionReading> {
        let url = format!(
            "{}/data?lat={}&lon={}&apikey={}",
            self.base_url,
            location.latitude(),
            location.longitude(),
            urlencoding::encode(api_key)
        );
        let response = self.client.get(&url).send().await?;
        let response = ensure_success("Light pollution", response).await?;
        let body: LightPollutionResponse = response.json().await?;
        body.into_reading()
    }
}

#[async_trait]
impl LightPollutionLookup for LightPollutionClient {
    #[instrument(name = "light_pollution", skip(self))]
    async fn light_pollution(&self, location: &Coordinate) -> LightPollutionReading {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("Light pollution API key is not configured, using level {}", self.fallback.level());
            return self.fallback;
        };

        match self.fetch(api_key, location).await {
            Ok(reading) => reading,
            Err(e) => {
                warn!(
                    "Light pollution lookup failed for {}: {}",
                    location.format_coordinates(),
                    e
                );
                self.fallback
            }
        }
    }
}
