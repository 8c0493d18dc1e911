use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use tracing::debug;

use crate::fetch::{HttpClient, fetch_bytes};
use crate::parser::{parse_eco_events, parse_sensor_series, parse_vehicles};
use crate::scoring::types::{EcoEvent, SensorSeries, Vehicle};
use crate::services::telemetry_api::TelemetryApi;

/// REST client for the upstream vehicle telemetry API.
///
/// Authentication is handled by the wrapped [`HttpClient`] (see
/// [`crate::fetch::auth`]).
pub struct TelemetryApiClient {
    base_url: Url,
    http: Box<dyn HttpClient>,
}

impl TelemetryApiClient {
    pub fn new(base_url: &str, http: Box<dyn HttpClient>) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("telemetry base URL '{base_url}' cannot take a path"));
        }
        Ok(Self { base_url, http })
    }

    /// Appends `segments` to the base path. Each segment is percent-encoded,
    /// so ids containing `/`, `?` or `..` stay inside their own segment.
    fn endpoint(&self, segments: &[&str], params: &[(&str, String)]) -> Result<String> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("telemetry base URL '{}' cannot take a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url.to_string())
    }

    fn window(from: DateTime<Utc>, till: DateTime<Utc>) -> [(&'static str, String); 2] {
        [
            ("from", from.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("till", till.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ]
    }
}

#[async_trait]
impl TelemetryApi for TelemetryApiClient {
    async fn list_vehicles(&self, group_id: &str) -> Result<Vec<Vehicle>> {
        let url = self.endpoint(&["v1", "vehicles"], &[("group_id", group_id.to_string())])?;
        let bytes = fetch_bytes(self.http.as_ref(), &url).await?;
        let vehicles = parse_vehicles(&bytes)?;
        debug!(group_id, count = vehicles.len(), "Vehicle roster fetched");
        Ok(vehicles)
    }

    async fn eco_events(
        &self,
        vehicle_id: &str,
        from: DateTime<Utc>,
        till: DateTime<Utc>,
    ) -> Result<Vec<EcoEvent>> {
        let url = self.endpoint(
            &["v1", "vehicles", vehicle_id, "eco_events"],
            &Self::window(from, till),
        )?;
        let bytes = fetch_bytes(self.http.as_ref(), &url).await?;
        parse_eco_events(&bytes)
    }

    async fn sensor_series(
        &self,
        vehicle_id: &str,
        from: DateTime<Utc>,
        till: DateTime<Utc>,
    ) -> Result<SensorSeries> {
        let mut params = Self::window(from, till).to_vec();
        params.push(("sensors", "fuel_level,fuel_consumed,speed".to_string()));
        let url = self.endpoint(&["v1", "vehicles", vehicle_id, "sensors"], &params)?;
        let bytes = fetch_bytes(self.http.as_ref(), &url).await?;
        parse_sensor_series(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;
    use chrono::TimeZone;

    fn client(base: &str) -> TelemetryApiClient {
        TelemetryApiClient::new(base, Box::new(BasicClient::new())).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let c = client("https://fleet.example.com/api");
        let url = c
            .endpoint(&["v1", "vehicles"], &[("group_id", "north".to_string())])
            .unwrap();
        assert_eq!(url, "https://fleet.example.com/api/v1/vehicles?group_id=north");
    }

    #[test]
    fn test_endpoint_encodes_window() {
        let c = client("https://fleet.example.com/");
        let from = Utc.with_ymd_and_hms(2025, 3, 13, 12, 0, 0).unwrap();
        let till = Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap();
        let url = c
            .endpoint(
                &["v1", "vehicles", "42", "eco_events"],
                &TelemetryApiClient::window(from, till),
            )
            .unwrap();
        assert_eq!(
            url,
            "https://fleet.example.com/v1/vehicles/42/eco_events?from=2025-03-13T12%3A00%3A00Z&till=2025-03-14T12%3A00%3A00Z"
        );
    }

    #[test]
    fn test_endpoint_encodes_vehicle_id_as_one_segment() {
        let c = client("https://fleet.example.com/api/");
        let url = c
            .endpoint(
                &["v1", "vehicles", "a/b?c", "eco_events"],
                &[("from", "x".to_string())],
            )
            .unwrap();
        assert_eq!(
            url,
            "https://fleet.example.com/api/v1/vehicles/a%2Fb%3Fc/eco_events?from=x"
        );

        let url = c
            .endpoint(&["v1", "vehicles", "../../admin", "sensors"], &[])
            .unwrap();
        assert!(url.starts_with("https://fleet.example.com/api/v1/vehicles/"));
        assert!(url.ends_with("/sensors"));
        assert!(!url.contains("/api/admin"));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(TelemetryApiClient::new("not a url", Box::new(BasicClient::new())).is_err());
        assert!(TelemetryApiClient::new("mailto:ops@example.com", Box::new(BasicClient::new())).is_err());
    }
}
