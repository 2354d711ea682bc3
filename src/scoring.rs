//! Campsite scoring and ranking
//!
//! Every venue starts from a base score and collects independent bonuses for
//! comfortable weather, dark skies and matching user preferences. A distance
//! penalty is subtracted with no floor, so scores may go negative. Missing
//! data never penalizes a venue; the bonus that depends on it is simply not
//! granted.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geo;
use crate::models::{
    Coordinate, LightPollutionPolarity, LightPollutionReading, ScoredVenue, Trail,
    UserPreferences, Venue, WeatherSnapshot,
};

/// Amenity tags that signal a quiet site for the solitude preference
pub const QUIET_AMENITIES: &[&str] = &["quiet", "secluded", "primitive", "backcountry"];
/// Amenity tags that satisfy the hiking preference directly
pub const HIKING_AMENITIES: &[&str] = &["hiking", "hiking_trails"];
pub const FISHING_AMENITY: &str = "fishing";

/// Tunable scoring constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub base_score: f64,
    /// Inclusive comfortable temperature range in Celsius
    pub comfortable_temp_min_c: f64,
    pub comfortable_temp_max_c: f64,
    pub comfortable_temp_bonus: f64,
    /// Cloud cover must be strictly below this percentage
    pub clear_sky_max_cloud_pct: f64,
    pub clear_sky_bonus: f64,
    pub dry_bonus: f64,
    pub light_pollution_polarity: LightPollutionPolarity,
    /// Minimum darkness (1..=9, 9 darkest) for the excellent tier
    pub excellent_darkness_min: u8,
    pub excellent_dark_sky_bonus: f64,
    pub good_darkness_min: u8,
    pub good_dark_sky_bonus: f64,
    pub distance_penalty_per_km: f64,
    pub fishing_bonus: f64,
    pub hiking_bonus: f64,
    pub solitude_bonus: f64,
    /// A trail this close to a venue satisfies the hiking preference
    pub trail_proximity_km: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            base_score: 10.0,
            comfortable_temp_min_c: 15.0,
            comfortable_temp_max_c: 25.0,
            comfortable_temp_bonus: 2.0,
            clear_sky_max_cloud_pct: 30.0,
            clear_sky_bonus: 2.0,
            dry_bonus: 1.0,
            light_pollution_polarity: LightPollutionPolarity::LowerIsDarker,
            excellent_darkness_min: 8,
            excellent_dark_sky_bonus: 3.0,
            good_darkness_min: 6,
            good_dark_sky_bonus: 1.0,
            distance_penalty_per_km: 0.1,
            fishing_bonus: 2.0,
            hiking_bonus: 2.0,
            solitude_bonus: 2.0,
            trail_proximity_km: 5.0,
        }
    }
}

/// A venue with its enrichment data, ready to be scored
#[derive(Debug, Clone)]
pub struct EnrichedVenue {
    pub venue: Venue,
    pub distance_km: f64,
    pub weather: WeatherSnapshot,
    pub light_pollution: LightPollutionReading,
}

impl EnrichedVenue {
    /// Attach enrichment data and compute the distance from `user`
    #[must_use]
    pub fn new(
        user: &Coordinate,
        venue: Venue,
        weather: WeatherSnapshot,
        light_pollution: LightPollutionReading,
    ) -> Self {
        let distance_km = geo::distance_km(user, &venue.location);
        Self {
            venue,
            distance_km,
            weather,
            light_pollution,
        }
    }
}

impl ScoringPolicy {
    /// Bonus for current weather conditions
    #[must_use]
    pub fn weather_bonus(&self, weather: &WeatherSnapshot) -> f64 {
        let mut bonus = 0.0;
        if let Some(t) = weather.temperature_c {
            if (self.comfortable_temp_min_c..=self.comfortable_temp_max_c).contains(&t) {
                bonus += self.comfortable_temp_bonus;
            }
        }
        if let Some(clouds) = weather.cloud_cover_pct {
            if clouds < self.clear_sky_max_cloud_pct {
                bonus += self.clear_sky_bonus;
            }
        }
        if weather.is_raining == Some(false) {
            bonus += self.dry_bonus;
        }
        bonus
    }

    /// Tiered dark-sky bonus. A fallback reading is not a measurement and earns nothing.
    #[must_use]
    pub fn dark_sky_bonus(&self, reading: &LightPollutionReading) -> f64 {
        if reading.is_fallback() {
            return 0.0;
        }
        let darkness = reading.darkness(self.light_pollution_polarity);
        if darkness >= self.excellent_darkness_min {
            self.excellent_dark_sky_bonus
        } else if darkness >= self.good_darkness_min {
            self.good_dark_sky_bonus
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn distance_penalty(&self, distance_km: f64) -> f64 {
        distance_km * self.distance_penalty_per_km
    }

    /// Bonus for requested preferences the venue satisfies
    #[must_use]
    pub fn preference_bonus(&self, venue: &Venue, prefs: &UserPreferences, trails: &[Trail]) -> f64 {
        let mut bonus = 0.0;
        if prefs.prefers_fishing && venue.has_amenity(FISHING_AMENITY) {
            bonus += self.fishing_bonus;
        }
        if prefs.prefers_hiking && self.has_hiking_access(venue, trails) {
            bonus += self.hiking_bonus;
        }
        if prefs.prefers_solitude && is_quiet(venue) {
            bonus += self.solitude_bonus;
        }
        bonus
    }

    fn has_hiking_access(&self, venue: &Venue, trails: &[Trail]) -> bool {
        HIKING_AMENITIES.iter().any(|a| venue.has_amenity(a))
            || geo::any_within(
                &venue.location,
                trails.iter().map(|t| &t.location),
                self.trail_proximity_km,
            )
    }

    /// Composite score for one enriched venue
    #[must_use]
    pub fn score(&self, candidate: &EnrichedVenue, prefs: &UserPreferences, trails: &[Trail]) -> f64 {
        self.base_score + self.weather_bonus(&candidate.weather)
            + self.dark_sky_bonus(&candidate.light_pollution)
            + self.preference_bonus(&candidate.venue, prefs, trails)
            - self.distance_penalty(candidate.distance_km)
    }

    /// Filter, score and sort candidates, best first.
    ///
    /// Venues reported closed are dropped before scoring when the user
    /// requires availability. Equal scores keep their input order.
    #[must_use]
    pub fn rank(
        &self,
        candidates: Vec<EnrichedVenue>,
        prefs: &UserPreferences,
        trails: &[Trail],
    ) -> Vec<ScoredVenue> {
        let mut scored: Vec<ScoredVenue> = candidates
            .into_iter()
            .filter(|candidate| {
                let excluded = is_excluded(&candidate.venue, prefs);
                if excluded {
                    debug!("Excluding unavailable venue: {}", candidate.venue.name);
                }
                !excluded
            })
            .map(|candidate| {
                let score = self.score(&candidate, prefs, trails);
                ScoredVenue {
                    venue: candidate.venue,
                    distance_km: candidate.distance_km,
                    weather: candidate.weather,
                    light_pollution: candidate.light_pollution,
                    score,
                }
            })
            .collect();

        // `sort_by` is stable, which keeps input order for ties
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }
}

/// Whether the availability requirement removes this venue
#[must_use]
pub fn is_excluded(venue: &Venue, prefs: &UserPreferences) -> bool {
    prefs.require_availability && venue.is_known_unavailable()
}

/// Quiet amenity marker or a venue reported closed
fn is_quiet(venue: &Venue) -> bool {
    QUIET_AMENITIES.iter().any(|a| venue.has_amenity(a)) || venue.is_known_unavailable()
}

/// The first `k` entries of an already ranked list
#[must_use]
pub fn top_k(ranked: &[ScoredVenue], k: usize) -> &[ScoredVenue] {
    &ranked[..k.min(ranked.len())]
}
