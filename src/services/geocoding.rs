//! Address geocoding against a Nominatim search endpoint

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{Geocoder, build_http_client, ensure_success};
use crate::config::ServiceConfig;
use crate::models::{Coordinate, GeocodedLocation};
use crate::{CampfinderError, Result};

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

pub struct NominatimClient {
    client: ClientWithMiddleware,
    base_url: String,
}

/// One search hit; Nominatim returns coordinates as strings
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: String,
}

impl SearchHit {
    fn into_location(self) -> Result<GeocodedLocation> {
        let parse = |value: &str| {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| CampfinderError::api(format!("Geocoder returned invalid coordinate '{value}'")))
        };
        let location = Coordinate::new(parse(&self.lat)?, parse(&self.lon)?)?;
        Ok(GeocodedLocation::new(location, self.display_name))
    }
}

impl NominatimClient {
    /// Create a new client
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            base_url: config.base_url_or(DEFAULT_BASE_URL),
        })
    }

    async fn search(&self, address: &str) -> Result<Option<GeocodedLocation>> {
        let url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(address)
        );
        let response = self.client.get(&url).send().await?;
        let response = ensure_success("Geocoding", response).await?;
        let hits: Vec<SearchHit> = response.json().await?;
        hits.into_iter().next().map(SearchHit::into_location).transpose()
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    #[instrument(name = "geocode", skip(self))]
    async fn geocode(&self, address: &str) -> Option<GeocodedLocation> {
        match self.search(address).await {
            Ok(Some(location)) => Some(location),
            Ok(None) => {
                debug!("No geocoding match for '{}'", address);
                None
            }
            Err(e) => {
                warn!("Geocoding failed for '{}': {}", address, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_hit() {
        let hits: Vec<SearchHit> = serde_json::from_str(
            r#"[{
                "place_id": 297415,
                "lat": "45.4208777",
                "lon": "-75.6901106",
                "display_name": "Ottawa, Eastern Ontario, Ontario, Canada",
                "importance": 0.81
            }]"#,
        )
        .unwrap();
        let location = hits.into_iter().next().unwrap().into_location().unwrap();
        assert_eq!(location.lat, 45.4208777);
        assert_eq!(location.lon, -75.6901106);
        assert_eq!(location.address, "Ottawa, Eastern Ontario, Ontario, Canada");
    }

    #[test]
    fn test_invalid_hit_coordinates_rejected() {
        let garbled = SearchHit {
            lat: "north".to_string(),
            lon: "-75.0".to_string(),
            display_name: "Nowhere".to_string(),
        };
        assert!(garbled.into_location().is_err());

        let off_globe = SearchHit {
            lat: "123.0".to_string(),
            lon: "-75.0".to_string(),
            display_name: "Nowhere".to_string(),
        };
        assert!(off_globe.into_location().is_err());
    }

    #[test]
    fn test_empty_search_is_no_match() {
        let hits: Vec<SearchHit> = serde_json::from_str("[]").unwrap();
        let first = hits.into_iter().next().map(SearchHit::into_location).transpose().unwrap();
        assert!(first.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_geocoder_returns_none() {
        let config = ServiceConfig {
            base_url: Some("http://127.0.0.1:9".to_string()),
            max_retries: 0,
            ..ServiceConfig::default()
        };
        let client = NominatimClient::new(&config).unwrap();
        assert!(client.geocode("Ottawa").await.is_none());
    }
}
