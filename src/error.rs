//! Error types and handling for the campsite recommender

use thiserror::Error;

/// Main error type for the campsite recommender
#[derive(Error, Debug)]
pub enum CampfinderError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Errors talking to an external data provider
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors (bad coordinates, malformed requests)
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// A lookup that matched nothing
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl CampfinderError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller's input
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CampfinderError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            CampfinderError::Api { .. } => {
                "Unable to reach an external data provider. Please try again later.".to_string()
            }
            CampfinderError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            CampfinderError::NotFound { message } => message.clone(),
            CampfinderError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            CampfinderError::General { message } => message.clone(),
        }
    }
}

impl From<reqwest::Error> for CampfinderError {
    fn from(err: reqwest::Error) -> Self {
        Self::api(err.to_string())
    }
}

impl From<reqwest_middleware::Error> for CampfinderError {
    fn from(err: reqwest_middleware::Error) -> Self {
        Self::api(err.to_string())
    }
}

impl From<serde_json::Error> for CampfinderError {
    fn from(err: serde_json::Error) -> Self {
        Self::api(format!("malformed provider response: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = CampfinderError::config("missing API key");
        assert!(matches!(config_err, CampfinderError::Config { .. }));

        let api_err = CampfinderError::api("connection failed");
        assert!(matches!(api_err, CampfinderError::Api { .. }));

        let validation_err = CampfinderError::validation("latitude out of range");
        assert!(validation_err.is_validation());

        let not_found = CampfinderError::not_found("Location not found");
        assert!(not_found.is_not_found());
        assert!(!not_found.is_validation());
        assert_eq!(not_found.user_message(), "Location not found");
    }

    #[test]
    fn test_user_messages() {
        let config_err = CampfinderError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let api_err = CampfinderError::api("test");
        assert!(api_err.user_message().contains("Unable to reach"));

        let validation_err = CampfinderError::validation("latitude 91 out of range");
        assert!(validation_err.user_message().contains("latitude 91"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CampfinderError = io_err.into();
        assert!(matches!(err, CampfinderError::Io { .. }));
    }

    #[test]
    fn test_json_error_is_api_error() {
        let json_err = serde_json::from_str::<u8>("not json").unwrap_err();
        let err: CampfinderError = json_err.into();
        assert!(matches!(err, CampfinderError::Api { .. }));
    }
}
