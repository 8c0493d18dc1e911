//! Traits for the upstream data collaborators used by the fleet aggregator.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::scoring::types::{EcoEvent, SensorSeries, Vehicle, WeatherObservation};

/// Abstraction over a vehicle telemetry provider.
#[async_trait::async_trait]
pub trait TelemetryApi: Send + Sync {
    /// Returns the vehicle roster for a group.
    async fn list_vehicles(&self, group_id: &str) -> Result<Vec<Vehicle>>;

    /// Returns eco-driving events for a vehicle in `[from, till]`.
    async fn eco_events(
        &self,
        vehicle_id: &str,
        from: DateTime<Utc>,
        till: DateTime<Utc>,
    ) -> Result<Vec<EcoEvent>>;

    /// Returns raw fuel and speed sensor series for a vehicle in `[from, till]`.
    async fn sensor_series(
        &self,
        vehicle_id: &str,
        from: DateTime<Utc>,
        till: DateTime<Utc>,
    ) -> Result<SensorSeries>;
}

/// Abstraction over a current-weather provider.
///
/// Absence is not an error: implementations log failures and return `None`.
#[async_trait::async_trait]
pub trait WeatherApi: Send + Sync {
    async fn current(&self, lat: f64, lng: f64) -> Option<WeatherObservation>;
}
