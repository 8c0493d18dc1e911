use crate::scoring::types::{RiskLevel, ServiceStatus};

/// Converts a total risk score into a [`RiskLevel`].
///
/// | Score   | Level    |
/// |---------|----------|
/// | >= 6    | critical |
/// | 3 ..= 5 | warning  |
/// | < 3     | ok       |
pub fn risk_level(score: u32) -> RiskLevel {
    match score {
        s if s >= 6 => RiskLevel::Critical,
        s if s >= 3 => RiskLevel::Warning,
        _ => RiskLevel::Ok,
    }
}

/// Converts remaining kilometres to the next service into a [`ServiceStatus`].
///
/// | Remaining km | Status   |
/// |--------------|----------|
/// | <= 500       | critical |
/// | <= 2000      | warning  |
/// | > 2000       | ok       |
pub fn service_status(remaining_km: f64) -> ServiceStatus {
    match remaining_km {
        r if r <= 500.0 => ServiceStatus::Critical,
        r if r <= 2000.0 => ServiceStatus::Warning,
        _ => ServiceStatus::Ok,
    }
}
