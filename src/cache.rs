//! Fuel risk cache and the monitor that fills it.
//!
//! Entries are idempotent recomputations, so concurrent writers for the
//! same vehicle simply overwrite each other (last writer wins).

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::scoring::fuel::{evaluate, merge_sensor_series};
use crate::scoring::types::FuelRiskResult;
use crate::services::telemetry_api::TelemetryApi;

/// Fuel risk results keyed by vehicle id.
///
/// Owned by whatever holds the vehicle detail view open; create a fresh one
/// per session.
#[derive(Debug, Default)]
pub struct FuelRiskCache {
    entries: DashMap<String, Arc<FuelRiskResult>>,
}

impl FuelRiskCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, vehicle_id: &str) -> Option<Arc<FuelRiskResult>> {
        // Clone the Arc so the shard lock is released right away.
        let hit = self.entries.get(vehicle_id).map(|r| Arc::clone(&*r));
        trace!(vehicle_id, hit = hit.is_some(), "fuel cache lookup");
        hit
    }

    pub fn insert(&self, vehicle_id: &str, result: FuelRiskResult) -> Arc<FuelRiskResult> {
        let result = Arc::new(result);
        self.entries
            .insert(vehicle_id.to_string(), Arc::clone(&result));
        result
    }

    pub fn invalidate(&self, vehicle_id: &str) {
        self.entries.remove(vehicle_id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetches, evaluates and caches fuel risk per vehicle.
pub struct FuelMonitor {
    telemetry: Arc<dyn TelemetryApi>,
    cache: FuelRiskCache,
    window: Duration,
}

impl FuelMonitor {
    pub fn new(telemetry: Arc<dyn TelemetryApi>, window: Duration) -> Self {
        Self {
            telemetry,
            cache: FuelRiskCache::new(),
            window,
        }
    }

    pub fn cache(&self) -> &FuelRiskCache {
        &self.cache
    }

    /// Returns the cached result, or fetches the last `window` of sensor data
    /// ending at `now`, evaluates it and caches the result.
    #[tracing::instrument(skip(self), fields(window_minutes = self.window.num_minutes()))]
    pub async fn fuel_risk(
        &self,
        vehicle_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Arc<FuelRiskResult>> {
        if let Some(hit) = self.cache.get(vehicle_id) {
            return Ok(hit);
        }

        let series = self
            .telemetry
            .sensor_series(vehicle_id, now - self.window, now)
            .await?;
        let snapshots = merge_sensor_series(&series);
        let result = evaluate(&snapshots);
        debug!(
            points = snapshots.len(),
            severity = ?result.severity,
            "Fuel risk evaluated"
        );

        Ok(self.cache.insert(vehicle_id, result))
    }

    /// Drops the cached result so the next lookup refetches.
    pub fn invalidate(&self, vehicle_id: &str) {
        self.cache.invalidate(vehicle_id);
    }

    /// Drops every cached result, ending the detail-view session.
    pub fn clear(&self) {
        self.cache.clear();
    }
}
