//! Per-vehicle risk scoring.
//!
//! Combines speed, time since last position, eco-driving events and
//! (optionally) weather into an additive integer score with one
//! [`RiskReason`] per contribution.

use chrono::{DateTime, Utc};
use tracing::error;

use crate::error::ScoringError;
use crate::scoring::level::risk_level;
use crate::scoring::types::{
    EcoEvent, Position, RiskAssessment, RiskLevel, RiskReason, Vehicle, WeatherObservation,
};
use crate::scoring::weather::weather_risk;

#[derive(Debug, Clone, Copy)]
enum SpeedTier {
    Extreme,
    High,
    AboveLimit,
    SlightlyElevated,
}

/// Speed tiers, highest first. Threshold is exclusive (km/h).
static SPEED_TIERS: &[(f64, u32, SpeedTier)] = &[
    (130.0, 4, SpeedTier::Extreme),
    (110.0, 3, SpeedTier::High),
    (95.0, 2, SpeedTier::AboveLimit),
    (85.0, 1, SpeedTier::SlightlyElevated),
];

/// Staleness tiers, highest first. Threshold is exclusive (minutes).
static STALENESS_TIERS: &[(f64, u32, bool)] = &[
    (360.0, 6, true),
    (180.0, 4, false),
    (60.0, 2, false),
    (15.0, 1, false),
];

/// Scores one vehicle.
///
/// Never fails: an internal fault yields a zero-score `ok` assessment with
/// no reasons so the vehicle still shows up in the fleet view.
pub fn score(
    vehicle: &Vehicle,
    events: &[EcoEvent],
    weather: Option<&WeatherObservation>,
    weather_enabled: bool,
    now: DateTime<Utc>,
) -> RiskAssessment {
    match try_score(vehicle, events, weather, weather_enabled, now) {
        Ok(assessment) => assessment,
        Err(e) => {
            error!(vehicle_id = %vehicle.id, error = %e, "Scoring failed, using fail-safe assessment");
            fail_safe(vehicle, now)
        }
    }
}

/// Fallible scoring core behind [`score`].
pub fn try_score(
    vehicle: &Vehicle,
    events: &[EcoEvent],
    weather: Option<&WeatherObservation>,
    weather_enabled: bool,
    now: DateTime<Utc>,
) -> Result<RiskAssessment, ScoringError> {
    if !vehicle.speed.is_finite() || vehicle.speed < 0.0 {
        return Err(ScoringError::InvalidSpeed(vehicle.speed));
    }

    let mut score = 0u32;
    let mut reasons = Vec::new();

    if let Some((points, reason)) = speed_contribution(vehicle.speed) {
        score = score.saturating_add(points);
        reasons.push(reason);
    }

    let minutes = minutes_since(vehicle.last_position_at, now);
    if let Some((points, reason)) = staleness_contribution(minutes) {
        score = score.saturating_add(points);
        reasons.push(reason);
    }

    // Upstream severities are unbounded; saturate instead of overflowing.
    let eco_total = events
        .iter()
        .fold(0u32, |acc, e| acc.saturating_add(e.severity));
    if eco_total > 0 {
        score = score.saturating_add(eco_total);
        reasons.push(RiskReason::EcoEvent {
            value: eco_total,
            count: events.len(),
        });
    }

    // Computed even when disabled so the reason can be shown as "not counted".
    if let Some(obs) = weather {
        let risk = weather_risk(obs)?;
        if risk.points > 0 {
            if weather_enabled {
                score = score.saturating_add(risk.points);
            }
            reasons.push(RiskReason::Weather {
                value: risk.points,
                counted: weather_enabled,
                description: risk.description(),
            });
        }
    }

    Ok(RiskAssessment {
        vehicle_id: vehicle.id.clone(),
        vehicle_name: vehicle.name.clone(),
        plate: vehicle.plate.clone(),
        speed: vehicle.speed,
        risk_score: score,
        risk_level: risk_level(score),
        reasons,
        computed_at: now,
        position: position_of(vehicle),
    })
}

/// Fractional minutes between the last position and `now`.
pub fn minutes_since(last_position_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - last_position_at).num_milliseconds() as f64 / 60_000.0
}

fn speed_contribution(speed: f64) -> Option<(u32, RiskReason)> {
    SPEED_TIERS
        .iter()
        .find(|(threshold, _, _)| speed > *threshold)
        .map(|&(_, points, tier)| {
            let reason = match tier {
                SpeedTier::Extreme => RiskReason::ExtremeSpeed { value: speed },
                SpeedTier::High => RiskReason::HighSpeed { value: speed },
                SpeedTier::AboveLimit => RiskReason::AboveLimitSpeed { value: speed },
                SpeedTier::SlightlyElevated => RiskReason::SlightlyElevatedSpeed { value: speed },
            };
            (points, reason)
        })
}

// Compared unfloored; the reported value is floored.
fn staleness_contribution(minutes: f64) -> Option<(u32, RiskReason)> {
    STALENESS_TIERS
        .iter()
        .find(|(threshold, _, _)| minutes > *threshold)
        .map(|&(_, points, critical)| {
            let value = minutes.floor() as i64;
            let reason = if critical {
                RiskReason::CriticalStaleCommunication { value }
            } else {
                RiskReason::StaleCommunication { value }
            };
            (points, reason)
        })
}

fn position_of(vehicle: &Vehicle) -> Position {
    vehicle
        .coordinates()
        .map(|(lat, lng)| Position { lat, lng })
        .unwrap_or_default()
}

fn fail_safe(vehicle: &Vehicle, now: DateTime<Utc>) -> RiskAssessment {
    RiskAssessment {
        vehicle_id: vehicle.id.clone(),
        vehicle_name: vehicle.name.clone(),
        plate: vehicle.plate.clone(),
        speed: if vehicle.speed.is_finite() { vehicle.speed } else { 0.0 },
        risk_score: 0,
        risk_level: RiskLevel::Ok,
        reasons: Vec::new(),
        computed_at: now,
        position: position_of(vehicle),
    }
}
