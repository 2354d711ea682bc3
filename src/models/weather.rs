//! Weather snapshot model and display methods

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions at a venue.
///
/// Every measurement is optional: `None` means unknown, which is distinct
/// from a measured zero.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// Temperature in Celsius
    pub temperature_c: Option<f64>,
    /// Cloud cover percentage (0-100)
    pub cloud_cover_pct: Option<f64>,
    /// Whether it is currently raining
    pub is_raining: Option<bool>,
    /// Relative humidity percentage
    pub humidity_pct: Option<f64>,
    /// Wind speed in m/s
    pub wind_speed_ms: Option<f64>,
    /// Human-readable description of weather conditions
    pub description: String,
    /// When the snapshot was fetched
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// Snapshot with every measurement unknown
    #[must_use]
    pub fn unavailable(description: impl Into<String>) -> Self {
        Self {
            temperature_c: None,
            cloud_cover_pct: None,
            is_raining: None,
            humidity_pct: None,
            wind_speed_ms: None,
            description: description.into(),
            fetched_at: Utc::now(),
        }
    }

    /// True when no measurement is known
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        self.temperature_c.is_none()
            && self.cloud_cover_pct.is_none()
            && self.is_raining.is_none()
            && self.humidity_pct.is_none()
            && self.wind_speed_ms.is_none()
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        self.temperature_c
            .map_or_else(|| "unknown".to_string(), |t| format!("{t:.1}°C"))
    }

    #[must_use]
    pub fn format_clouds(&self) -> String {
        self.cloud_cover_pct
            .map_or_else(|| "clouds unknown".to_string(), |c| format!("clouds {c:.0}%"))
    }

    #[must_use]
    pub fn format_rain(&self) -> &'static str {
        match self.is_raining {
            Some(true) => "rain",
            Some(false) => "no rain",
            None => "rain unknown",
        }
    }

    /// One-line summary used in prompts
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}, {}, {}",
            self.format_temperature(),
            self.format_clouds(),
            self.format_rain()
        )
    }
}
