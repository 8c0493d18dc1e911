//! Fleet-wide fan-out/fan-in of per-vehicle assessments.
//!
//! Each vehicle is assessed in its own task. A task that fails (data source
//! error, malformed record, panic) is logged and its vehicle left out of the
//! cycle; sibling tasks keep running. Records leaving this module are
//! complete and never modified afterwards.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, info, warn};

use crate::error::SourceError;
use crate::scoring::priority::rank;
use crate::scoring::risk::score;
use crate::scoring::service::ServiceSchedule;
use crate::scoring::types::{AssessmentWithService, FleetSnapshot, Vehicle};
use crate::services::telemetry_api::{TelemetryApi, WeatherApi};

pub const DEFAULT_ECO_LOOKBACK_HOURS: i64 = 24;
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Produces one [`AssessmentWithService`] per vehicle per cycle.
pub struct FleetAggregator {
    telemetry: Arc<dyn TelemetryApi>,
    weather: Arc<dyn WeatherApi>,
    service: Arc<dyn ServiceSchedule>,
    eco_lookback: Duration,
    permits: Arc<Semaphore>,
}

impl FleetAggregator {
    pub fn new(
        telemetry: Arc<dyn TelemetryApi>,
        weather: Arc<dyn WeatherApi>,
        service: Arc<dyn ServiceSchedule>,
    ) -> Self {
        Self {
            telemetry,
            weather,
            service,
            eco_lookback: Duration::hours(DEFAULT_ECO_LOOKBACK_HOURS),
            permits: Arc::new(Semaphore::new(DEFAULT_CONCURRENCY)),
        }
    }

    pub fn with_eco_lookback(mut self, lookback: Duration) -> Self {
        self.eco_lookback = lookback;
        self
    }

    /// Caps how many vehicles fetch upstream data at the same time.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(concurrency.max(1)));
        self
    }

    /// Fetches the roster for `group_id`, assesses every vehicle and ranks
    /// the result. Only a roster failure fails the cycle.
    #[tracing::instrument(skip(self, now))]
    pub async fn run_cycle(
        &self,
        group_id: &str,
        weather_enabled: bool,
        now: DateTime<Utc>,
    ) -> Result<FleetSnapshot> {
        let vehicles = self.telemetry.list_vehicles(group_id).await?;
        info!(vehicles = vehicles.len(), "Roster fetched");

        let assessments = self.assess(vehicles, weather_enabled, now).await;
        let priority_queue = rank(assessments.iter().map(|a| &a.assessment));

        Ok(FleetSnapshot {
            generated_at: now,
            weather_enabled,
            assessments,
            priority_queue,
        })
    }

    /// Assesses every vehicle concurrently. Output follows roster order and
    /// omits vehicles whose task failed.
    pub async fn assess(
        &self,
        vehicles: Vec<Vehicle>,
        weather_enabled: bool,
        now: DateTime<Utc>,
    ) -> Vec<AssessmentWithService> {
        let total = vehicles.len();
        let mut tasks = Vec::with_capacity(total);

        for vehicle in vehicles {
            let span = tracing::info_span!(
                "assess_vehicle",
                vehicle_id = %vehicle.id,
                vehicle_name = %vehicle.name,
            );
            let vehicle_id = vehicle.id.clone();
            let ctx = VehicleTask {
                telemetry: Arc::clone(&self.telemetry),
                weather: Arc::clone(&self.weather),
                service: Arc::clone(&self.service),
                permits: Arc::clone(&self.permits),
                eco_lookback: self.eco_lookback,
                weather_enabled,
                now,
            };

            let task = tokio::spawn(async move { ctx.run(vehicle).await }.instrument(span));
            tasks.push((vehicle_id, task));
        }

        let mut assessments = Vec::with_capacity(total);
        for (vehicle_id, task) in tasks {
            match task.await {
                Ok(Ok(assessment)) => assessments.push(assessment),
                Ok(Err(e)) => {
                    warn!(vehicle_id = %vehicle_id, error = %e, "Vehicle dropped from cycle");
                }
                Err(e) => {
                    warn!(vehicle_id = %vehicle_id, error = %e, "Vehicle task aborted");
                }
            }
        }

        info!(
            assessed = assessments.len(),
            dropped = total - assessments.len(),
            "Fleet assessment complete"
        );
        assessments
    }
}

/// Everything one vehicle task needs, owned so the task can be spawned.
struct VehicleTask {
    telemetry: Arc<dyn TelemetryApi>,
    weather: Arc<dyn WeatherApi>,
    service: Arc<dyn ServiceSchedule>,
    permits: Arc<Semaphore>,
    eco_lookback: Duration,
    weather_enabled: bool,
    now: DateTime<Utc>,
}

impl VehicleTask {
    async fn run(self, vehicle: Vehicle) -> Result<AssessmentWithService> {
        validate(&vehicle)?;

        let _permit = self.permits.acquire().await?;

        let events_fut = self
            .telemetry
            .eco_events(&vehicle.id, self.now - self.eco_lookback, self.now);
        let weather_fut = async {
            match vehicle.coordinates() {
                Some((lat, lng)) if self.weather_enabled => self.weather.current(lat, lng).await,
                _ => None,
            }
        };
        let (events, weather) = tokio::join!(events_fut, weather_fut);
        let events = events?;

        if weather.is_none() && self.weather_enabled {
            debug!("No weather for vehicle");
        }

        let assessment = score(&vehicle, &events, weather.as_ref(), self.weather_enabled, self.now);
        let service = self.service.service_status(&vehicle.id, vehicle.odometer_km);

        debug!(
            risk_score = assessment.risk_score,
            risk_level = assessment.risk_level.as_str(),
            service_status = service.status.as_str(),
            "Vehicle assessed"
        );

        Ok(AssessmentWithService {
            assessment,
            service,
        })
    }
}

// Speed is left to the scorer, which falls back to a zero score rather than
// hiding the vehicle.
fn validate(vehicle: &Vehicle) -> Result<(), SourceError> {
    if vehicle.id.trim().is_empty() {
        return Err(SourceError::Malformed {
            kind: "vehicle",
            reason: "empty id".to_string(),
        });
    }
    if !vehicle.odometer_km.is_finite() || vehicle.odometer_km < 0.0 {
        return Err(SourceError::Malformed {
            kind: "vehicle",
            reason: format!("odometer {} is invalid", vehicle.odometer_km),
        });
    }
    Ok(())
}
