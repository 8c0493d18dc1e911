use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::fetch::{HttpClient, fetch_bytes};
use crate::parser::parse_weather;
use crate::scoring::types::WeatherObservation;
use crate::services::telemetry_api::WeatherApi;

const CURRENT_FIELDS: &str = "temperature_2m,precipitation,weather_code,wind_speed_10m";

/// Current-weather lookups against an Open-Meteo compatible endpoint.
pub struct OpenMeteoClient {
    base_url: String,
    http: Box<dyn HttpClient>,
}

impl OpenMeteoClient {
    pub fn new(base_url: &str, http: Box<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url(&self, lat: f64, lng: f64) -> anyhow::Result<String> {
        let url = Url::parse_with_params(
            &format!("{}/v1/forecast", self.base_url),
            &[
                ("latitude", lat.to_string()),
                ("longitude", lng.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("wind_speed_unit", "kmh".to_string()),
            ],
        )?;
        Ok(url.to_string())
    }

    async fn fetch(&self, lat: f64, lng: f64) -> anyhow::Result<Option<WeatherObservation>> {
        let url = self.url(lat, lng)?;
        let bytes = fetch_bytes(self.http.as_ref(), &url).await?;
        parse_weather(&bytes)
    }
}

#[async_trait]
impl WeatherApi for OpenMeteoClient {
    async fn current(&self, lat: f64, lng: f64) -> Option<WeatherObservation> {
        match self.fetch(lat, lng).await {
            Ok(obs) => obs,
            Err(e) => {
                debug!(lat, lng, error = %e, "Weather unavailable");
                None
            }
        }
    }
}
