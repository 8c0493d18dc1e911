//! Data types shared by the scoring pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A vehicle as reported by the telemetry roster. Read-only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub name: String,
    pub plate: String,
    /// Current speed in km/h.
    pub speed: f64,
    pub last_position_at: DateTime<Utc>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub odometer_km: f64,
}

impl Vehicle {
    /// Returns the coordinates when both are present and finite.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some((lat, lng)),
            _ => None,
        }
    }
}

/// An eco-driving event (harsh braking, acceleration, cornering...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcoEvent {
    pub severity: u32,
    pub timestamp: DateTime<Utc>,
}

/// Current weather at a vehicle's position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub precipitation_mm: f64,
    /// WMO weather interpretation code.
    pub weather_code: u16,
}

/// Why a vehicle's score went up. Serialized with a `type` discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RiskReason {
    ExtremeSpeed { value: f64 },
    HighSpeed { value: f64 },
    AboveLimitSpeed { value: f64 },
    SlightlyElevatedSpeed { value: f64 },
    /// `value` is whole minutes since the last position.
    StaleCommunication { value: i64 },
    CriticalStaleCommunication { value: i64 },
    /// Aggregate over every eco event in the lookback window.
    EcoEvent { value: u32, count: usize },
    /// `counted` is false when weather scoring is disabled and the points
    /// were left out of the total.
    Weather {
        value: u32,
        counted: bool,
        description: String,
    },
}

impl RiskReason {
    /// Minutes without communication, for the stale-communication family.
    pub fn stale_minutes(&self) -> Option<i64> {
        match self {
            RiskReason::StaleCommunication { value }
            | RiskReason::CriticalStaleCommunication { value } => Some(*value),
            _ => None,
        }
    }

    pub fn is_critical_stale(&self) -> bool {
        matches!(self, RiskReason::CriticalStaleCommunication { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Ok,
    Warning,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Ok => "ok",
            RiskLevel::Warning => "warning",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Last known position. Zero when telemetry has no fix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

/// Risk verdict for one vehicle in one aggregation cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub vehicle_id: String,
    pub vehicle_name: String,
    pub plate: String,
    pub speed: f64,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub reasons: Vec<RiskReason>,
    pub computed_at: DateTime<Utc>,
    pub position: Position,
}

/// Maintenance classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Ok,
    Warning,
    Critical,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Ok => "ok",
            ServiceStatus::Warning => "warning",
            ServiceStatus::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceInfo {
    pub odometer_km: f64,
    pub remaining_km: f64,
    pub next_service_km: f64,
    pub progress_percent: u8,
    pub status: ServiceStatus,
}

/// An assessment merged with the vehicle's maintenance status. This is the
/// record the presentation layer reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentWithService {
    #[serde(flatten)]
    pub assessment: RiskAssessment,
    pub service: ServiceInfo,
}

/// One point in time of the merged fuel/speed sensor union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelSnapshot {
    pub timestamp: DateTime<Utc>,
    pub fuel_volume_l: Option<f64>,
    pub fuel_consumed_l: Option<f64>,
    pub speed_kmh: Option<f64>,
}

/// A single raw sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Raw per-sensor series for one vehicle, as returned upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSeries {
    #[serde(default)]
    pub fuel_level: Vec<SensorPoint>,
    #[serde(default)]
    pub fuel_consumed: Vec<SensorPoint>,
    #[serde(default)]
    pub speed: Vec<SensorPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelSeverity {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelRiskResult {
    pub suspicious_drop: bool,
    pub drop_amount_l: Option<f64>,
    pub consumption_lph: Option<f64>,
    pub description: Option<String>,
    pub severity: FuelSeverity,
}

impl FuelRiskResult {
    pub fn none() -> Self {
        Self {
            suspicious_drop: false,
            drop_amount_l: None,
            consumption_lph: None,
            description: None,
            severity: FuelSeverity::None,
        }
    }

    pub fn insufficient_data() -> Self {
        Self {
            description: Some("insufficient_data".to_string()),
            ..Self::none()
        }
    }
}

/// One entry of the dispatch queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityQueueItem {
    pub assessment: RiskAssessment,
    /// 1-based.
    pub rank: usize,
    pub priority_score: f64,
    pub minutes_without_communication: i64,
    pub predicted_to_worsen: bool,
}

/// Output of one complete aggregation cycle.
#[derive(Debug, Clone, Serialize)]
pub struct FleetSnapshot {
    pub generated_at: DateTime<Utc>,
    pub weather_enabled: bool,
    pub assessments: Vec<AssessmentWithService>,
    pub priority_queue: Vec<PriorityQueueItem>,
}
