//! Great-circle distance

use haversine::{Location as HaversineLocation, Units, distance};

use crate::models::Coordinate;

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates in kilometers
#[must_use]
pub fn distance_km(from: &Coordinate, to: &Coordinate) -> f64 {
    let from_haversine = HaversineLocation {
        latitude: from.latitude(),
        longitude: from.longitude(),
    };
    let to_haversine = HaversineLocation {
        latitude: to.latitude(),
        longitude: to.longitude(),
    };
    distance(from_haversine, to_haversine, Units::Kilometers)
}

/// Whether any of `points` lies within `radius_km` of `center`
pub fn any_within<'a, I>(center: &Coordinate, points: I, radius_km: f64) -> bool
where
    I: IntoIterator<Item = &'a Coordinate>,
{
    points
        .into_iter()
        .any(|point| distance_km(center, point) <= radius_km)
}
