//! Google Places client for campsites and hiking trails
//!
//! Nearby search finds candidates; a details request per place fills in the
//! formatted address, website and phone number.

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, stream};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{PlaceLookup, TrailLookup, build_http_client, ensure_success};
use crate::config::ServiceConfig;
use crate::models::{Coordinate, Trail, Venue, VenueDetails};
use crate::{CampfinderError, Result};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";
/// The provider rejects radii above 50 km
const MAX_RADIUS_M: u32 = 50_000;
/// A page token only becomes valid a short while after it is issued
const PAGE_TOKEN_DELAY: Duration = Duration::from_secs(2);
const MAX_PAGES: usize = 3;

/// Concurrent details requests per search
const DETAILS_CONCURRENCY: usize = 8;
const DETAIL_FIELDS: &str = "formatted_address,website,formatted_phone_number";

/// Place types never describe fishing or seclusion, so those tags come from the name
const NAME_TAGS: &[(&[&str], &str)] = &[
    (&["fishing", "angler", "marina"], "fishing"),
    (&["backcountry", "wilderness", "primitive", "walk-in", "hike-in"], "backcountry"),
];

const TRAIL_PLACE_TYPE: &str = "park";
const TRAIL_KEYWORD: &str = "hiking trail";

pub struct GooglePlacesClient {
    client: ClientWithMiddleware,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    #[serde(default)]
    results: Vec<PlaceResult>,
    next_page_token: Option<String>,
    status: String,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetailsResponse {
    result: Option<PlaceDetails>,
    status: String,
    error_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PlaceDetails {
    formatted_address: Option<String>,
    website: Option<String>,
    formatted_phone_number: Option<String>,
}

impl PlaceDetails {
    /// Overwrite contact fields with whatever the details request returned
    fn merge_into(self, address: &mut Option<String>, website: &mut Option<String>, phone: &mut Option<String>) {
        if self.formatted_address.is_some() {
            *address = self.formatted_address;
        }
        if self.website.is_some() {
            *website = self.website;
        }
        if self.formatted_phone_number.is_some() {
            *phone = self.formatted_phone_number;
        }
    }

    fn fill_venue(venue: &mut Venue, details: Self) {
        let contact = &mut venue.details;
        details.merge_into(&mut contact.address, &mut contact.website, &mut contact.phone);
    }

    fn fill_trail(trail: &mut Trail, details: Self) {
        details.merge_into(&mut trail.address, &mut trail.website, &mut trail.phone);
    }
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    place_id: Option<String>,
    name: Option<String>,
    geometry: Option<Geometry>,
    rating: Option<f32>,
    vicinity: Option<String>,
    opening_hours: Option<OpeningHours>,
    #[serde(default)]
    photos: Vec<Photo>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct OpeningHours {
    open_now: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    photo_reference: String,
}

impl PlaceResult {
    /// Name and valid coordinate, or `None` when either is missing
    fn identity(&self) -> Option<(String, Coordinate)> {
        let name = self.name.clone()?;
        let location = self.geometry.as_ref()?.location.to_coordinate();
        match location {
            Ok(location) => Some((name, location)),
            Err(e) => {
                warn!("Dropping place '{}' with invalid location: {}", name, e);
                None
            }
        }
    }

    fn into_venue(self) -> Option<Venue> {
        let (name, location) = self.identity()?;
        let amenities = tag_amenities(&name, self.types);
        Some(Venue {
            id: self.place_id,
            name,
            location,
            amenities,
            is_open: self.opening_hours.and_then(|h| h.open_now),
            rating: self.rating,
            details: VenueDetails {
                address: self.vicinity,
                photos: self.photos.into_iter().map(|p| p.photo_reference).collect(),
                phone: None,
                website: None,
            },
        })
    }

    fn into_trail(self) -> Option<Trail> {
        let (name, location) = self.identity()?;
        Some(Trail {
            id: self.place_id,
            name,
            location,
            rating: self.rating,
            address: self.vicinity,
            is_open: self.opening_hours.and_then(|h| h.open_now),
            phone: None,
            website: None,
        })
    }
}

/// Place types plus any tags implied by keywords in the place name
fn tag_amenities(name: &str, mut types: Vec<String>) -> Vec<String> {
    let name = name.to_lowercase();
    for (keywords, tag) in NAME_TAGS {
        if keywords.iter().any(|k| name.contains(k)) && !types.iter().any(|t| t == tag) {
            types.push((*tag).to_string());
        }
    }
    types
}

impl LatLng {
    fn to_coordinate(&self) -> Result<Coordinate> {
        Coordinate::new(self.lat, self.lng)
    }
}

impl GooglePlacesClient {
    /// Create a new client
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            api_key: config.api_key().map(str::to_string),
            base_url: config.base_url_or(DEFAULT_BASE_URL),
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Run a nearby search and follow pagination
    async fn search(
        &self,
        api_key: &str,
        center: &Coordinate,
        radius_km: f64,
        place_type: &str,
        keyword: Option<&str>,
    ) -> Result<Vec<PlaceResult>> {
        let radius_m = radius_meters(radius_km);
        let mut url = format!(
            "{}/nearbysearch/json?location={},{}&radius={}&type={}&key={}",
            self.base_url,
            center.latitude(),
            center.longitude(),
            radius_m,
            urlencoding::encode(place_type),
            urlencoding::encode(api_key)
        );
        if let Some(keyword) = keyword {
            url.push_str(&format!("&keyword={}", urlencoding::encode(keyword)));
        }

        let mut results = Vec::new();
        let mut page_url = url;
        for page in 0..MAX_PAGES {
            let response = self.client.get(&page_url).send().await?;
            let response = ensure_success("Places", response).await?;
            let body: NearbySearchResponse = response.json().await?;
            check_status(&body.status, body.error_message.as_deref())?;

            debug!("Places page {} returned {} results", page + 1, body.results.len());
            results.extend(body.results);

            match body.next_page_token {
                Some(token) if page + 1 < MAX_PAGES => {
                    tokio::time::sleep(PAGE_TOKEN_DELAY).await;
                    page_url = format!(
                        "{}/nearbysearch/json?pagetoken={}&key={}",
                        self.base_url,
                        urlencoding::encode(&token),
                        urlencoding::encode(api_key)
                    );
                }
                _ => break,
            }
        }
        Ok(results)
    }

    async fn fetch_details(&self, api_key: &str, place_id: &str) -> Result<PlaceDetails> {
        let url = format!(
            "{}/details/json?place_id={}&fields={}&key={}",
            self.base_url,
            urlencoding::encode(place_id),
            DETAIL_FIELDS,
            urlencoding::encode(api_key)
        );
        let response = self.client.get(&url).send().await?;
        let response = ensure_success("Places", response).await?;
        let body: PlaceDetailsResponse = response.json().await?;
        check_status(&body.status, body.error_message.as_deref())?;
        Ok(body.result.unwrap_or_default())
    }

    /// Details for one place; empty when the place has no id or the request fails
    async fn place_details(&self, api_key: &str, place_id: Option<&str>) -> PlaceDetails {
        let Some(place_id) = place_id else {
            return PlaceDetails::default();
        };
        match self.fetch_details(api_key, place_id).await {
            Ok(details) => details,
            Err(e) => {
                warn!("Place details failed for {}: {}", place_id, e);
                PlaceDetails::default()
            }
        }
    }

    /// Fetch details for every item, a few at a time, keeping input order
    async fn attach_details<T: Send + Sync>(
        &self,
        api_key: &str,
        items: Vec<T>,
        place_id: fn(&T) -> Option<&str>,
        fill: fn(&mut T, PlaceDetails),
    ) -> Vec<T> {
        stream::iter(items)
            .map(move |mut item| async move {
                let details = self.place_details(api_key, place_id(&item)).await;
                fill(&mut item, details);
                item
            })
            .buffered(DETAILS_CONCURRENCY)
            .collect()
            .await
    }
}

fn radius_meters(radius_km: f64) -> u32 {
    let meters = (radius_km.max(0.0) * 1000.0).round();
    if meters > f64::from(MAX_RADIUS_M) {
        debug!("Capping search radius {}m at {}m", meters, MAX_RADIUS_M);
        MAX_RADIUS_M
    } else {
        meters as u32
    }
}

fn check_status(status: &str, error_message: Option<&str>) -> Result<()> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(CampfinderError::api(format!(
            "Places request failed with status {other}: {}",
            error_message.unwrap_or("no details")
        ))),
    }
}

#[async_trait]
impl PlaceLookup for GooglePlacesClient {
    #[instrument(name = "nearby_venues", skip(self), fields(lat = center.latitude(), lon = center.longitude()))]
    async fn nearby_venues(&self, center: &Coordinate, radius_km: f64, place_type: &str) -> Vec<Venue> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("Places API key is not configured, returning no campsites");
            return Vec::new();
        };

        match self.search(api_key, center, radius_km, place_type, None).await {
            Ok(results) => {
                let venues: Vec<Venue> = results.into_iter().filter_map(PlaceResult::into_venue).collect();
                info!("Found {} {} places within {}km", venues.len(), place_type, radius_km);
                self.attach_details(api_key, venues, |v| v.id.as_deref(), PlaceDetails::fill_venue)
                    .await
            }
            Err(e) => {
                warn!("Places lookup failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl TrailLookup for GooglePlacesClient {
    #[instrument(name = "nearby_trails", skip(self), fields(lat = center.latitude(), lon = center.longitude()))]
    async fn nearby_trails(&self, center: &Coordinate, radius_km: f64) -> Vec<Trail> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("Places API key is not configured, returning no trails");
            return Vec::new();
        };

        match self
            .search(api_key, center, radius_km, TRAIL_PLACE_TYPE, Some(TRAIL_KEYWORD))
            .await
        {
            Ok(results) => {
                let trails: Vec<Trail> = results.into_iter().filter_map(PlaceResult::into_trail).collect();
                info!("Found {} hiking trails within {}km", trails.len(), radius_km);
                self.attach_details(api_key, trails, |t| t.id.as_deref(), PlaceDetails::fill_trail)
                    .await
            }
            Err(e) => {
                warn!("Trail lookup failed: {}", e);
                Vec::new()
            }
        }
    }
}
