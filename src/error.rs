//! Error types and handling for `GeoGuide`

use thiserror::Error;

/// Message returned whenever the caller's coordinates cannot be determined
pub const COORDINATES_NOT_FOUND: &str = "Unable to retrieve GPS coordinates.";

/// Main error type for the `GeoGuide` service
#[derive(Error, Debug)]
pub enum GeoguideError {
    /// Configuration-related errors, fatal at startup
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Request parameter validation errors
    #[error("Invalid input for '{field}': {message}")]
    Validation {
        field: String,
        message: String,
        kind: &'static str,
    },

    /// A collaborator had no answer
    #[error("{message}")]
    NotFound { message: String },

    /// A dependency failed or answered with an unexpected shape
    #[error("{service} error: {message}")]
    Upstream { service: String, message: String },

    /// A dependency did not answer within the configured timeout
    #[error("{service} did not respond within {seconds}s")]
    Timeout { service: String, seconds: u64 },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl GeoguideError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error for a single request field
    pub fn validation<F: Into<String>, S: Into<String>>(
        field: F,
        message: S,
        kind: &'static str,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create the not-found error reported when no coordinates are available
    #[must_use]
    pub fn coordinates_not_found() -> Self {
        Self::NotFound {
            message: COORDINATES_NOT_FOUND.to_string(),
        }
    }

    /// Create a new upstream error for the named service
    pub fn upstream<N: Into<String>, S: Into<String>>(service: N, message: S) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error for the named service
    pub fn timeout<N: Into<String>>(service: N, seconds: u64) -> Self {
        Self::Timeout {
            service: service.into(),
            seconds,
        }
    }

    /// Map a transport error from `reqwest`, keeping timeouts distinguishable
    pub fn from_reqwest<N: Into<String>>(service: N, seconds: u64, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(service, seconds)
        } else {
            Self::upstream(service, format!("request failed: {err}"))
        }
    }

    /// Whether the error came from an unreachable or misbehaving dependency
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Timeout { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            GeoguideError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            GeoguideError::Validation { field, message, .. } => {
                format!("Invalid input for '{field}': {message}")
            }
            GeoguideError::NotFound { message } => message.clone(),
            GeoguideError::Upstream { .. } | GeoguideError::Timeout { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
            GeoguideError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
