use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use crate::CampfinderError;
use crate::models::{Coordinate, GeocodedLocation, RecommendationBundle, Trail, UserPreferences, Venue};
use crate::recommendation::RecommendationService;

pub const WELCOME_MESSAGE: &str = "Welcome to the campsite recommendation API";

pub type AppState = Arc<RecommendationService>;

/// Body of `POST /api/recommendations`
#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub preferences: UserPreferences,
}

#[derive(Debug, Deserialize)]
pub struct PlacesQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_km: Option<f64>,
    #[serde(rename = "type")]
    pub place_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrailsQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    pub address: Option<String>,
}

/// Error body returned by every route
pub struct ApiError(CampfinderError);

impl From<CampfinderError> for ApiError {
    fn from(err: CampfinderError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(CampfinderError::validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(CampfinderError::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_validation() {
            warn!("Rejected request: {}", self.0);
            StatusCode::BAD_REQUEST
        } else if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            error!("Request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.0.user_message() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/api/recommendations", post(recommend))
        .route("/api/places", get(places))
        .route("/api/trails", get(trails))
        .route("/api/location", get(location))
        .with_state(state)
}

fn require_coordinate(lat: Option<f64>, lon: Option<f64>) -> Result<Coordinate, ApiError> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => Ok(Coordinate::new(lat, lon)?),
        _ => Err(CampfinderError::validation("lat and lon are required").into()),
    }
}

fn optional_radius(radius_km: Option<f64>) -> Result<Option<f64>, ApiError> {
    match radius_km {
        Some(r) if !(r.is_finite() && r > 0.0) => {
            Err(CampfinderError::validation(format!("radius_km {r} must be a positive number")).into())
        }
        other => Ok(other),
    }
}

async fn welcome() -> Json<serde_json::Value> {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

async fn recommend(
    State(service): State<AppState>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> Result<Json<RecommendationBundle>, ApiError> {
    let Json(request) = payload?;
    let user = require_coordinate(request.lat, request.lon)?;
    Ok(Json(service.recommend(&user, &request.preferences).await))
}

async fn places(
    State(service): State<AppState>,
    query: Result<Query<PlacesQuery>, QueryRejection>,
) -> Result<Json<Vec<Venue>>, ApiError> {
    let Query(query) = query?;
    let center = require_coordinate(query.lat, query.lon)?;
    let radius_km = optional_radius(query.radius_km)?;
    let venues = service
        .find_places(&center, radius_km, query.place_type.as_deref())
        .await;
    Ok(Json(venues))
}

async fn trails(
    State(service): State<AppState>,
    query: Result<Query<TrailsQuery>, QueryRejection>,
) -> Result<Json<Vec<Trail>>, ApiError> {
    let Query(query) = query?;
    let center = require_coordinate(query.lat, query.lon)?;
    let radius_km = optional_radius(query.radius_km)?;
    Ok(Json(service.find_trails(&center, radius_km).await))
}

async fn location(
    State(service): State<AppState>,
    query: Result<Query<LocationQuery>, QueryRejection>,
) -> Result<Json<GeocodedLocation>, ApiError> {
    let Query(query) = query?;
    let address = query.address.unwrap_or_default();
    match service.locate(&address).await? {
        Some(found) => Ok(Json(found)),
        None => Err(CampfinderError::not_found("Location not found").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_coordinate() {
        assert!(require_coordinate(Some(45.0), Some(-75.0)).is_ok());
        assert!(require_coordinate(None, Some(-75.0)).is_err());
        assert!(require_coordinate(Some(95.0), Some(-75.0)).is_err());
    }

    #[test]
    fn test_optional_radius() {
        assert_eq!(optional_radius(None).ok(), Some(None));
        assert_eq!(optional_radius(Some(10.0)).ok(), Some(Some(10.0)));
        assert!(optional_radius(Some(0.0)).is_err());
        assert!(optional_radius(Some(-3.0)).is_err());
    }

    #[test]
    fn test_validation_error_maps_to_bad_request() {
        let response = ApiError(CampfinderError::validation("bad")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError(CampfinderError::not_found("Location not found")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError(CampfinderError::general("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
