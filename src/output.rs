//! Output formatting for one aggregation cycle.
//!
//! Supports pretty-printing, JSON serialization, and a CSV export that is
//! rewritten every cycle (no history is kept).

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::scoring::types::{AssessmentWithService, FleetSnapshot, PriorityQueueItem, RiskReason};
use csv::WriterBuilder;
use std::fs::File;

/// One flattened CSV row per assessed vehicle.
#[derive(Debug, Serialize)]
struct AssessmentRow<'a> {
    computed_at: String,
    vehicle_id: &'a str,
    vehicle_name: &'a str,
    plate: &'a str,
    speed: f64,
    risk_score: u32,
    risk_level: &'static str,
    reasons: String,
    lat: f64,
    lng: f64,
    odometer_km: f64,
    remaining_km: f64,
    service_status: &'static str,
}

impl<'a> From<&'a AssessmentWithService> for AssessmentRow<'a> {
    fn from(a: &'a AssessmentWithService) -> Self {
        let r = &a.assessment;
        AssessmentRow {
            computed_at: r.computed_at.to_rfc3339(),
            vehicle_id: &r.vehicle_id,
            vehicle_name: &r.vehicle_name,
            plate: &r.plate,
            speed: r.speed,
            risk_score: r.risk_score,
            risk_level: r.risk_level.as_str(),
            reasons: r.reasons.iter().map(describe_reason).collect::<Vec<_>>().join("; "),
            lat: r.position.lat,
            lng: r.position.lng,
            odometer_km: a.service.odometer_km,
            remaining_km: a.service.remaining_km,
            service_status: a.service.status.as_str(),
        }
    }
}

/// Short human-readable label for a reason.
pub fn describe_reason(reason: &RiskReason) -> String {
    match reason {
        RiskReason::ExtremeSpeed { value } => format!("extreme speed {value:.0} km/h"),
        RiskReason::HighSpeed { value } => format!("high speed {value:.0} km/h"),
        RiskReason::AboveLimitSpeed { value } => format!("above limit {value:.0} km/h"),
        RiskReason::SlightlyElevatedSpeed { value } => format!("slightly elevated {value:.0} km/h"),
        RiskReason::StaleCommunication { value } => format!("no data for {value} min"),
        RiskReason::CriticalStaleCommunication { value } => {
            format!("no data for {value} min (critical)")
        }
        RiskReason::EcoEvent { value, count } => format!("eco events: {count} (severity {value})"),
        RiskReason::Weather {
            value,
            counted,
            description,
        } => {
            let suffix = if *counted { "" } else { ", not counted" };
            format!("weather +{value} ({description}{suffix})")
        }
    }
}

/// Logs a snapshot using Rust's debug pretty-print format.
pub fn print_pretty(snapshot: &FleetSnapshot) {
    debug!("{:#?}", snapshot);
}

/// Logs a snapshot as pretty-printed JSON.
pub fn print_json(snapshot: &FleetSnapshot) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}

/// Logs the dispatch queue, one line per entry.
pub fn log_priority_queue(queue: &[PriorityQueueItem]) {
    for item in queue {
        info!(
            rank = item.rank,
            vehicle_id = %item.assessment.vehicle_id,
            vehicle_name = %item.assessment.vehicle_name,
            risk_score = item.assessment.risk_score,
            risk_level = item.assessment.risk_level.as_str(),
            priority = item.priority_score,
            minutes_without_communication = item.minutes_without_communication,
            predicted_to_worsen = item.predicted_to_worsen,
            "Dispatch queue"
        );
    }
}

/// Writes the cycle's assessments to `path`, replacing any previous export.
pub fn write_assessments_csv(path: &str, assessments: &[AssessmentWithService]) -> Result<()> {
    debug!(path, rows = assessments.len(), "Writing CSV export");

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for a in assessments {
        writer.serialize(AssessmentRow::from(a))?;
    }
    writer.flush()?;

    Ok(())
}
