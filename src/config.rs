//! Configuration management for the campsite recommender
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings. The loaded
//! struct is handed to every collaborator at construction time; nothing
//! reads the environment after startup.

use crate::CampfinderError;
use crate::scoring::ScoringPolicy;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Conventional provider key variables, mapped onto config keys
const PROVIDER_KEY_VARS: &[(&str, &str)] = &[
    ("GOOGLE_MAPS_API_KEY", "places.api_key"),
    ("WEATHER_API_KEY", "weather.api_key"),
    ("LIGHT_POLLUTION_API_KEY", "light_pollution.api_key"),
    ("GEMINI_API_KEY", "text_generation.api_key"),
];

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampfinderConfig {
    /// Place and trail lookup provider
    #[serde(default)]
    pub places: ServiceConfig,
    /// Current weather provider
    #[serde(default)]
    pub weather: ServiceConfig,
    /// Address geocoding provider; needs no key
    #[serde(default)]
    pub geocoding: ServiceConfig,
    /// Light-pollution provider
    #[serde(default)]
    pub light_pollution: LightPollutionConfig,
    /// Text-generation provider
    #[serde(default)]
    pub text_generation: TextGenerationConfig,
    /// Memo cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Default request settings
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Scoring constants
    #[serde(default)]
    pub scoring: ScoringPolicy,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Settings shared by every outbound provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Provider API key; the provider falls back when absent
    pub api_key: Option<String>,
    /// Override for the provider's default base URL
    pub base_url: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightPollutionConfig {
    #[serde(flatten)]
    pub service: ServiceConfig,
    /// Level reported when no measurement is available
    #[serde(default = "default_light_pollution_level")]
    pub default_level: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextGenerationConfig {
    #[serde(flatten)]
    pub service: ServiceConfig,
    /// Model name passed to the provider
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

/// Memo cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of memoized responses per provider; 0 disables
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    /// How long a memoized response is reused, in minutes
    #[serde(default = "default_cache_ttl")]
    pub ttl_minutes: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Campsite search radius in kilometers
    #[serde(default = "default_search_radius")]
    pub search_radius_km: f64,
    /// Place type passed to the place lookup
    #[serde(default = "default_place_type")]
    pub place_type: String,
    /// Number of results rendered into the summary prompt
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Whether to look up hiking trails alongside campsites
    #[serde(default = "default_include_trails")]
    pub include_trails: bool,
    /// Trail search radius in kilometers
    #[serde(default = "default_search_radius")]
    pub trail_radius_km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout for inbound HTTP requests
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
}

// Default value functions
fn default_timeout() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_light_pollution_level() -> u8 {
    crate::models::light_pollution::FALLBACK_LEVEL
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_max_output_tokens() -> u32 {
    256
}

fn default_cache_capacity() -> usize {
    512
}

fn default_cache_ttl() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_search_radius() -> f64 {
    50.0
}

fn default_place_type() -> String {
    "campground".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_include_trails() -> bool {
    true
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u32 {
    120
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for LightPollutionConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            default_level: default_light_pollution_level(),
        }
    }
}

impl Default for TextGenerationConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            model: default_model(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_minutes: default_cache_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            search_radius_km: default_search_radius(),
            place_type: default_place_type(),
            top_k: default_top_k(),
            include_trails: default_include_trails(),
            trail_radius_km: default_search_radius(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl ServiceConfig {
    /// The configured key, ignoring blank values
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// The configured base URL or the provider default, without a trailing slash
    #[must_use]
    pub fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    fn apply_defaults(&mut self) {
        if self.timeout_seconds == 0 {
            self.timeout_seconds = default_timeout();
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if let Some(api_key) = &self.api_key {
            if api_key.trim().is_empty() {
                return Err(CampfinderError::config(format!(
                    "{name} API key cannot be empty if provided. Either remove it or provide a valid key."
                ))
                .into());
            }
            if api_key.len() < 8 {
                return Err(CampfinderError::config(format!(
                    "{name} API key appears to be invalid (too short). Please check your API key."
                ))
                .into());
            }
        }

        if self.timeout_seconds > 300 {
            return Err(CampfinderError::config(format!(
                "{name} timeout cannot exceed 300 seconds"
            ))
            .into());
        }

        if self.max_retries > 10 {
            return Err(
                CampfinderError::config(format!("{name} max retries cannot exceed 10")).into(),
            );
        }

        if let Some(url) = &self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CampfinderError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

impl CampfinderConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|p| p.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Nested overrides such as CAMPFINDER__WEATHER__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("CAMPFINDER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        for (var, key) in PROVIDER_KEY_VARS {
            builder = builder
                .set_override_option(*key, std::env::var(var).ok())
                .with_context(|| format!("Failed to apply {var}"))?;
        }

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: CampfinderConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("campfinder").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        self.places.apply_defaults();
        self.weather.apply_defaults();
        self.geocoding.apply_defaults();
        self.light_pollution.service.apply_defaults();
        self.text_generation.service.apply_defaults();
        if self.text_generation.model.is_empty() {
            self.text_generation.model = default_model();
        }
        if self.text_generation.max_output_tokens == 0 {
            self.text_generation.max_output_tokens = default_max_output_tokens();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.search_radius_km == 0.0 {
            self.defaults.search_radius_km = default_search_radius();
        }
        if self.defaults.trail_radius_km == 0.0 {
            self.defaults.trail_radius_km = default_search_radius();
        }
        if self.defaults.place_type.is_empty() {
            self.defaults.place_type = default_place_type();
        }
        if self.defaults.top_k == 0 {
            self.defaults.top_k = default_top_k();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_services()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate provider credentials and connection settings
    pub fn validate_services(&self) -> Result<()> {
        self.places.validate("Places")?;
        self.weather.validate("Weather")?;
        self.geocoding.validate("Geocoding")?;
        self.light_pollution.service.validate("Light pollution")?;
        self.text_generation.service.validate("Text generation")?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        for (name, radius) in [
            ("Search radius", self.defaults.search_radius_km),
            ("Trail radius", self.defaults.trail_radius_km),
        ] {
            if !(radius > 0.0 && radius <= 500.0) {
                return Err(CampfinderError::config(format!(
                    "{name} must be greater than 0 and cannot exceed 500 km"
                ))
                .into());
            }
        }

        if self.defaults.top_k > 50 {
            return Err(CampfinderError::config("Top-K cannot exceed 50").into());
        }

        if self.cache.capacity > 100_000 {
            return Err(CampfinderError::config("Cache capacity cannot exceed 100000 entries").into());
        }

        if self.cache.ttl_minutes > 7 * 24 * 60 {
            return Err(CampfinderError::config("Cache TTL cannot exceed 1 week").into());
        }

        let level = self.light_pollution.default_level;
        if !(crate::models::light_pollution::MIN_LEVEL..=crate::models::light_pollution::MAX_LEVEL)
            .contains(&level)
        {
            return Err(CampfinderError::config(format!(
                "Default light pollution level {level} must be between 1 and 9"
            ))
            .into());
        }

        self.validate_scoring()?;

        Ok(())
    }

    /// Validate scoring constants so bonuses stay non-negative and distance always costs
    fn validate_scoring(&self) -> Result<()> {
        let scoring = &self.scoring;

        if scoring.comfortable_temp_min_c > scoring.comfortable_temp_max_c {
            return Err(CampfinderError::config(
                "Comfortable temperature minimum cannot exceed the maximum",
            )
            .into());
        }

        if !(scoring.distance_penalty_per_km.is_finite() && scoring.distance_penalty_per_km > 0.0) {
            return Err(
                CampfinderError::config("Distance penalty per km must be greater than 0").into(),
            );
        }

        for (name, bonus) in [
            ("Base score", scoring.base_score),
            ("Comfortable temperature bonus", scoring.comfortable_temp_bonus),
            ("Clear sky bonus", scoring.clear_sky_bonus),
            ("Dry bonus", scoring.dry_bonus),
            ("Excellent dark sky bonus", scoring.excellent_dark_sky_bonus),
            ("Good dark sky bonus", scoring.good_dark_sky_bonus),
            ("Fishing bonus", scoring.fishing_bonus),
            ("Hiking bonus", scoring.hiking_bonus),
            ("Solitude bonus", scoring.solitude_bonus),
        ] {
            if !(bonus.is_finite() && bonus >= 0.0) {
                return Err(CampfinderError::config(format!("{name} cannot be negative")).into());
            }
        }

        let darkness_range =
            crate::models::light_pollution::MIN_LEVEL..=crate::models::light_pollution::MAX_LEVEL;
        for (name, threshold) in [
            ("Excellent darkness minimum", scoring.excellent_darkness_min),
            ("Good darkness minimum", scoring.good_darkness_min),
        ] {
            if !darkness_range.contains(&threshold) {
                return Err(CampfinderError::config(format!(
                    "{name} {threshold} must be between 1 and 9"
                ))
                .into());
            }
        }

        if scoring.good_darkness_min > scoring.excellent_darkness_min {
            return Err(CampfinderError::config(
                "Good darkness minimum cannot exceed the excellent darkness minimum",
            )
            .into());
        }

        if !(scoring.trail_proximity_km.is_finite() && scoring.trail_proximity_km >= 0.0) {
            return Err(CampfinderError::config("Trail proximity cannot be negative").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CampfinderError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CampfinderError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}
