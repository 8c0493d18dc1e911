//! Typed errors for configuration, scoring and upstream data sources.

use thiserror::Error;

/// Raised while reading [`crate::config::AppConfig`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be set")]
    Missing { name: &'static str },
    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Internal fault inside the risk scorer.
///
/// Never surfaces to callers of [`crate::scoring::risk::score`]; it is turned
/// into a zero-score assessment at that boundary.
#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("speed {0} is not a finite non-negative number")]
    InvalidSpeed(f64),
    #[error("weather observation has non-finite {field}")]
    InvalidWeather { field: &'static str },
}

/// A record or response from an upstream collaborator could not be used.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("malformed {kind} record: {reason}")]
    Malformed { kind: &'static str, reason: String },
    #[error("upstream returned status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("no {kind} data for vehicle '{vehicle_id}'")]
    NotFound {
        kind: &'static str,
        vehicle_id: String,
    },
}
