//! Decoding of upstream JSON payloads into domain types.
//!
//! The telemetry API wraps every response in `{"data": ...}`. Vehicle records
//! are decoded leniently: a record that cannot be used is skipped with a
//! warning instead of failing the whole roster.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::error::SourceError;
use crate::scoring::types::{EcoEvent, SensorSeries, Vehicle, WeatherObservation};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawVehicle {
    id: Option<String>,
    name: Option<String>,
    plate: Option<String>,
    speed: Option<f64>,
    last_update: Option<DateTime<Utc>>,
    lat: Option<f64>,
    lng: Option<f64>,
    mileage_km: Option<f64>,
}

impl RawVehicle {
    pub(crate) fn into_vehicle(self) -> Result<Vehicle, SourceError> {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| malformed("vehicle", "missing id"))?;
        let last_position_at = self
            .last_update
            .ok_or_else(|| malformed("vehicle", format!("'{id}' has no last_update")))?;

        Ok(Vehicle {
            name: self.name.unwrap_or_else(|| id.clone()),
            plate: self.plate.unwrap_or_default(),
            speed: self.speed.unwrap_or(0.0),
            last_position_at,
            lat: self.lat,
            lng: self.lng,
            odometer_km: self.mileage_km.unwrap_or(0.0),
            id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEcoEvent {
    severity: f64,
    occurred_at: DateTime<Utc>,
}

impl RawEcoEvent {
    pub(crate) fn into_event(self) -> Result<EcoEvent, SourceError> {
        if !self.severity.is_finite() || self.severity < 0.0 {
            return Err(malformed(
                "eco event",
                format!("severity {} is not a non-negative number", self.severity),
            ));
        }
        Ok(EcoEvent {
            // Saturates at u32::MAX.
            severity: self.severity.round() as u32,
            timestamp: self.occurred_at,
        })
    }
}

/// Decodes a vehicle roster, skipping unusable records.
pub fn parse_vehicles(bytes: &[u8]) -> Result<Vec<Vehicle>> {
    let envelope: Envelope<Vec<RawVehicle>> = serde_json::from_slice(bytes)?;
    Ok(vehicles_from_raw(envelope.data))
}

pub(crate) fn vehicles_from_raw(raw: Vec<RawVehicle>) -> Vec<Vehicle> {
    raw.into_iter()
        .filter_map(|r| match r.into_vehicle() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, "Skipping vehicle record");
                None
            }
        })
        .collect()
}

/// Decodes eco events. Any invalid event fails the whole payload.
pub fn parse_eco_events(bytes: &[u8]) -> Result<Vec<EcoEvent>> {
    let envelope: Envelope<Vec<RawEcoEvent>> = serde_json::from_slice(bytes)?;
    Ok(events_from_raw(envelope.data)?)
}

pub(crate) fn events_from_raw(raw: Vec<RawEcoEvent>) -> Result<Vec<EcoEvent>, SourceError> {
    raw.into_iter().map(RawEcoEvent::into_event).collect()
}

pub fn parse_sensor_series(bytes: &[u8]) -> Result<SensorSeries> {
    let envelope: Envelope<SensorSeries> = serde_json::from_slice(bytes)?;
    Ok(envelope.data)
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    current: Option<OpenMeteoCurrent>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoCurrent {
    temperature_2m: Option<f64>,
    wind_speed_10m: Option<f64>,
    precipitation: Option<f64>,
    weather_code: Option<u16>,
}

/// Decodes an Open-Meteo `current` block. Missing values yield `None`.
pub fn parse_weather(bytes: &[u8]) -> Result<Option<WeatherObservation>> {
    let resp: OpenMeteoResponse = serde_json::from_slice(bytes)?;
    Ok(resp.current.and_then(|c| {
        Some(WeatherObservation {
            temperature_c: c.temperature_2m?,
            wind_speed_kmh: c.wind_speed_10m?,
            precipitation_mm: c.precipitation.unwrap_or(0.0),
            weather_code: c.weather_code.unwrap_or(0),
        })
    }))
}

fn malformed(kind: &'static str, reason: impl Into<String>) -> SourceError {
    SourceError::Malformed {
        kind,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vehicles_full_record() {
        let json = br#"{"data": [{
            "id": "101", "name": "Van 1", "plate": "KX-101", "speed": 72.5,
            "last_update": "2025-03-14T11:50:00Z", "lat": 56.9, "lng": 24.1,
            "mileage_km": 84210.0
        }]}"#;

        let vehicles = parse_vehicles(json).unwrap();
        assert_eq!(vehicles.len(), 1);
        let v = &vehicles[0];
        assert_eq!(v.id, "101");
        assert_eq!(v.plate, "KX-101");
        assert_eq!(v.speed, 72.5);
        assert_eq!(v.coordinates(), Some((56.9, 24.1)));
        assert_eq!(v.odometer_km, 84210.0);
    }

    #[test]
    fn test_parse_vehicles_tolerates_missing_fields() {
        let json = br#"{"data": [{"id": "7", "last_update": "2025-03-14T11:50:00Z"}]}"#;
        let vehicles = parse_vehicles(json).unwrap();
        assert_eq!(vehicles[0].name, "7");
        assert_eq!(vehicles[0].speed, 0.0);
        assert_eq!(vehicles[0].coordinates(), None);
    }

    #[test]
    fn test_parse_vehicles_skips_malformed_records() {
        let json = br#"{"data": [
            {"name": "no id", "last_update": "2025-03-14T11:50:00Z"},
            {"id": "no-ts"},
            {"id": "ok", "last_update": "2025-03-14T11:50:00Z"}
        ]}"#;
        let vehicles = parse_vehicles(json).unwrap();
        let ids: Vec<&str> = vehicles.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["ok"]);
    }

    #[test]
    fn test_parse_vehicles_rejects_non_envelope() {
        assert!(parse_vehicles(b"[]").is_err());
        assert!(parse_vehicles(b"not json").is_err());
    }

    #[test]
    fn test_parse_eco_events() {
        let json = br#"{"data": [
            {"severity": 2, "occurred_at": "2025-03-14T08:00:00Z"},
            {"severity": 1.4, "occurred_at": "2025-03-14T09:00:00Z"}
        ]}"#;
        let events = parse_eco_events(json).unwrap();
        let severities: Vec<u32> = events.iter().map(|e| e.severity).collect();
        assert_eq!(severities, vec![2, 1]);
    }

    #[test]
    fn test_parse_eco_events_saturates_huge_severity() {
        let json = br#"{"data": [{"severity": 5e9, "occurred_at": "2025-03-14T08:00:00Z"}]}"#;
        let events = parse_eco_events(json).unwrap();
        assert_eq!(events[0].severity, u32::MAX);

        let now = events[0].timestamp;
        let vehicle = Vehicle {
            id: "101".to_string(),
            name: "Van 1".to_string(),
            plate: "KX-101".to_string(),
            speed: 140.0,
            last_position_at: now,
            lat: None,
            lng: None,
            odometer_km: 0.0,
        };
        let a = crate::scoring::risk::score(&vehicle, &events, None, false, now);
        assert_eq!(a.risk_score, u32::MAX);
        assert_eq!(a.risk_level, crate::scoring::types::RiskLevel::Critical);
    }

    #[test]
    fn test_parse_eco_events_rejects_negative_severity() {
        let json = br#"{"data": [{"severity": -1, "occurred_at": "2025-03-14T08:00:00Z"}]}"#;
        assert!(parse_eco_events(json).is_err());
    }

    #[test]
    fn test_parse_sensor_series_defaults_missing_sensors() {
        let json = br#"{"data": {"speed": [{"timestamp": "2025-03-14T08:00:00Z", "value": 3.0}]}}"#;
        let series = parse_sensor_series(json).unwrap();
        assert_eq!(series.speed.len(), 1);
        assert!(series.fuel_level.is_empty());
        assert!(series.fuel_consumed.is_empty());
    }

    #[test]
    fn test_parse_weather() {
        let json = br#"{"current": {"time": "2025-03-14T12:00", "temperature_2m": -2.5,
            "wind_speed_10m": 41.0, "precipitation": 0.8, "weather_code": 71}}"#;
        let obs = parse_weather(json).unwrap().unwrap();
        assert_eq!(obs.temperature_c, -2.5);
        assert_eq!(obs.wind_speed_kmh, 41.0);
        assert_eq!(obs.weather_code, 71);
    }

    #[test]
    fn test_parse_weather_missing_current_is_none() {
        assert_eq!(parse_weather(br#"{"latitude": 1.0}"#).unwrap(), None);
        assert_eq!(
            parse_weather(br#"{"current": {"precipitation": 1.0}}"#).unwrap(),
            None
        );
    }
}
