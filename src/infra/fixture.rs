//! JSON-file backed telemetry and weather, for offline runs and tests.
//!
//! ```json
//! {
//!   "captured_at": "2025-03-14T12:00:00Z",
//!   "vehicles": [{ "id": "101", "last_update": "2025-03-14T11:50:00Z", "speed": 92.0 }],
//!   "eco_events": { "101": [{ "severity": 2, "occurred_at": "2025-03-14T09:00:00Z" }] },
//!   "sensors": { "101": { "fuel_level": [], "fuel_consumed": [], "speed": [] } },
//!   "weather": [{ "lat": 56.95, "lng": 24.1, "temperature_c": 2.0,
//!                 "wind_speed_kmh": 12.0, "precipitation_mm": 0.0, "weather_code": 3 }],
//!   "eco_outages": ["205"]
//! }
//! ```
//!
//! Vehicles listed in `eco_outages` fail their eco-event fetch, which lets
//! callers exercise per-vehicle failure handling.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::SourceError;
use crate::parser::{RawEcoEvent, RawVehicle, events_from_raw, vehicles_from_raw};
use crate::scoring::types::{EcoEvent, SensorSeries, Vehicle, WeatherObservation};
use crate::services::telemetry_api::{TelemetryApi, WeatherApi};

const COORDINATE_EPSILON: f64 = 1e-6;

#[derive(Debug, Deserialize)]
struct FixtureFile {
    captured_at: DateTime<Utc>,
    vehicles: Vec<RawVehicle>,
    #[serde(default)]
    eco_events: HashMap<String, Vec<RawEcoEvent>>,
    #[serde(default)]
    sensors: HashMap<String, SensorSeries>,
    #[serde(default)]
    weather: Vec<FixtureWeather>,
    #[serde(default)]
    eco_outages: HashSet<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct FixtureWeather {
    lat: f64,
    lng: f64,
    #[serde(flatten)]
    observation: WeatherObservation,
}

/// A captured fleet state served as both [`TelemetryApi`] and [`WeatherApi`].
#[derive(Debug)]
pub struct FixtureTelemetry {
    captured_at: DateTime<Utc>,
    vehicles: Vec<Vehicle>,
    eco_events: HashMap<String, Vec<EcoEvent>>,
    sensors: HashMap<String, SensorSeries>,
    weather: Vec<FixtureWeather>,
    eco_outages: HashSet<String>,
}

impl FixtureTelemetry {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read fixture '{}'", path.display()))?;
        Self::from_slice(&bytes)
            .with_context(|| format!("invalid fixture '{}'", path.display()))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let file: FixtureFile = serde_json::from_slice(bytes)?;

        let eco_events = file
            .eco_events
            .into_iter()
            .map(|(id, raw)| Ok((id, events_from_raw(raw)?)))
            .collect::<Result<HashMap<_, _>, SourceError>>()?;

        Ok(Self {
            captured_at: file.captured_at,
            vehicles: vehicles_from_raw(file.vehicles),
            eco_events,
            sensors: file.sensors,
            weather: file.weather,
            eco_outages: file.eco_outages,
        })
    }

    /// The instant the fixture was recorded; use it as "now" when scoring.
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

#[async_trait]
impl TelemetryApi for FixtureTelemetry {
    async fn list_vehicles(&self, _group_id: &str) -> Result<Vec<Vehicle>> {
        Ok(self.vehicles.clone())
    }

    async fn eco_events(
        &self,
        vehicle_id: &str,
        from: DateTime<Utc>,
        till: DateTime<Utc>,
    ) -> Result<Vec<EcoEvent>> {
        if self.eco_outages.contains(vehicle_id) {
            return Err(anyhow!("eco events unavailable for vehicle '{vehicle_id}'"));
        }
        Ok(self
            .eco_events
            .get(vehicle_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.timestamp >= from && e.timestamp <= till)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn sensor_series(
        &self,
        vehicle_id: &str,
        from: DateTime<Utc>,
        till: DateTime<Utc>,
    ) -> Result<SensorSeries> {
        let series = self.sensors.get(vehicle_id).ok_or_else(|| SourceError::NotFound {
            kind: "sensor",
            vehicle_id: vehicle_id.to_string(),
        })?;
        let in_window = |p: &&crate::scoring::types::SensorPoint| {
            p.timestamp >= from && p.timestamp <= till
        };
        Ok(SensorSeries {
            fuel_level: series.fuel_level.iter().filter(in_window).cloned().collect(),
            fuel_consumed: series.fuel_consumed.iter().filter(in_window).cloned().collect(),
            speed: series.speed.iter().filter(in_window).cloned().collect(),
        })
    }
}

#[async_trait]
impl WeatherApi for FixtureTelemetry {
    async fn current(&self, lat: f64, lng: f64) -> Option<WeatherObservation> {
        self.weather
            .iter()
            .find(|w| (w.lat - lat).abs() < COORDINATE_EPSILON && (w.lng - lng).abs() < COORDINATE_EPSILON)
            .map(|w| w.observation.clone())
    }
}
