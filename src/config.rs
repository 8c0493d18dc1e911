//! Environment configuration.

use std::env;
use std::time::Duration;

use crate::error::ConfigError;
use crate::scoring::aggregate::{DEFAULT_CONCURRENCY, DEFAULT_ECO_LOOKBACK_HOURS};
use crate::scoring::fuel::FUEL_WINDOW_MINUTES;

pub const DEFAULT_WEATHER_API_URL: &str = "https://api.open-meteo.com";

/// Connection details for the upstream telemetry API.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub base_url: String,
    pub api_key: String,
    /// Send the key in this header instead of the `key` query parameter.
    pub api_key_header: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` when `TELEMETRY_API_URL` is unset; only fixture mode works then.
    pub telemetry: Option<TelemetryConfig>,
    pub group_id: Option<String>,
    pub weather_api_url: String,
    pub eco_lookback_hours: i64,
    pub fuel_window_minutes: i64,
    pub http_timeout: Duration,
    pub fetch_concurrency: usize,
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let telemetry = match var("TELEMETRY_API_URL") {
            Some(base_url) => Some(TelemetryConfig {
                base_url,
                api_key: var("TELEMETRY_API_KEY").ok_or(ConfigError::Missing {
                    name: "TELEMETRY_API_KEY",
                })?,
                api_key_header: var("TELEMETRY_API_KEY_HEADER"),
            }),
            None => None,
        };

        Ok(Self {
            telemetry,
            group_id: var("TELEMETRY_GROUP_ID"),
            weather_api_url: var("WEATHER_API_URL")
                .unwrap_or_else(|| DEFAULT_WEATHER_API_URL.to_string()),
            eco_lookback_hours: parse_positive(
                "ECO_LOOKBACK_HOURS",
                var("ECO_LOOKBACK_HOURS"),
                DEFAULT_ECO_LOOKBACK_HOURS,
            )?,
            fuel_window_minutes: parse_positive(
                "FUEL_WINDOW_MINUTES",
                var("FUEL_WINDOW_MINUTES"),
                FUEL_WINDOW_MINUTES,
            )?,
            http_timeout: Duration::from_secs(parse_positive(
                "HTTP_TIMEOUT_SECS",
                var("HTTP_TIMEOUT_SECS"),
                30,
            )?),
            fetch_concurrency: parse_positive(
                "FETCH_CONCURRENCY",
                var("FETCH_CONCURRENCY"),
                DEFAULT_CONCURRENCY,
            )?,
        })
    }

    /// The telemetry section, or an error naming the missing variable.
    pub fn require_telemetry(&self) -> Result<&TelemetryConfig, ConfigError> {
        self.telemetry.as_ref().ok_or(ConfigError::Missing {
            name: "TELEMETRY_API_URL",
        })
    }
}

fn parse_positive<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        _ => Err(ConfigError::Invalid {
            name,
            expected: "positive integer",
            value: raw,
        }),
    }
}
