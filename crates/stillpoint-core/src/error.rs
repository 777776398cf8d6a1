//! Core error types for stillpoint-core.
//!
//! Configuration problems are rejected when a session is built, backend
//! failures carry the server's own message, and validation errors cover
//! user input. Nothing in the timer path is fatal: side-effect failures are
//! reported as events, never returned from `tick()`.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for stillpoint-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend (REST) errors
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Session and application configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A session needs at least one phase
    #[error("Session has no phases")]
    EmptySchedule,

    /// Phase durations must be positive
    #[error("Phase '{label}' has a zero duration")]
    ZeroDuration { label: String },

    /// A phase kind appears twice in one schedule
    #[error("Phase kind '{kind}' is configured more than once")]
    DuplicatePhase { kind: String },

    /// The cyclic policy needs work, short break and long break phases
    #[error("Cyclic schedule is missing the '{kind}' phase")]
    MissingPhase { kind: String },

    /// Long-break cadence must be at least one
    #[error("Long break cadence must be at least 1")]
    ZeroCadence,

    /// Tick interval must be positive
    #[error("Tick interval must be greater than zero")]
    ZeroTickInterval,

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dotted configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Home directory could not be resolved
    #[error("Could not determine the data directory")]
    NoDataDir,
}

/// Errors talking to the CRUD backend.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure (connection refused, TLS, timeout)
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Base URL or path could not be joined
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Response body did not match the expected shape
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// True when the backend rejected the session cookie.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status: 401, .. })
    }
}

/// Validation errors for user-supplied values.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Custom meditation length outside of 1..=60 minutes
    #[error("Meditation length must be between {min} and {max} minutes, got {value}")]
    MeditationMinutes { value: u64, min: u64, max: u64 },

    /// Empty required text field
    #[error("'{field}' must not be empty")]
    EmptyField { field: String },

    /// Unparseable calendar date
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::InvalidValue {
            key: "<file>".into(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_mentions_backend_message() {
        let err = ApiError::Status {
            status: 404,
            message: "Task not found".into(),
        };
        assert_eq!(err.to_string(), "HTTP 404: Task not found");
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn config_error_wraps_into_core_error() {
        let err: CoreError = ConfigError::EmptySchedule.into();
        assert!(matches!(err, CoreError::Config(ConfigError::EmptySchedule)));
        assert_eq!(err.to_string(), "Configuration error: Session has no phases");
    }
}
