//! Maintenance status per vehicle.
//!
//! There is no maintenance-history integration yet. [`HashedServiceSchedule`]
//! derives a stable position inside the service interval from the vehicle id
//! so the fleet view has consistent data. Swap it for a real implementation of
//! [`ServiceSchedule`] without touching scoring or aggregation.

use crate::scoring::level::service_status;
use crate::scoring::types::ServiceInfo;
use crate::scoring::utility::string_hash;

/// Kilometres between two services.
pub const SERVICE_INTERVAL_KM: u32 = 10_000;

const MOCK_ODOMETER_MIN_KM: u32 = 10_000;
const MOCK_ODOMETER_SPAN_KM: u32 = 170_000;

/// Source of maintenance status for a vehicle.
pub trait ServiceSchedule: Send + Sync {
    fn service_status(&self, vehicle_id: &str, odometer_km: f64) -> ServiceInfo;
}

/// Deterministic stand-in derived from a hash of the vehicle id.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedServiceSchedule;

impl ServiceSchedule for HashedServiceSchedule {
    fn service_status(&self, vehicle_id: &str, odometer_km: f64) -> ServiceInfo {
        let hash = string_hash(vehicle_id);

        let remaining_km = (hash % SERVICE_INTERVAL_KM) as f64;
        let mock_odometer =
            (MOCK_ODOMETER_MIN_KM + (hash / SERVICE_INTERVAL_KM) % MOCK_ODOMETER_SPAN_KM) as f64;

        // A vehicle without a usable reading gets the mocked odometer.
        let odometer_km = if odometer_km.is_finite() && odometer_km > 0.0 {
            odometer_km
        } else {
            mock_odometer
        };

        ServiceInfo {
            odometer_km,
            remaining_km,
            next_service_km: odometer_km + remaining_km,
            progress_percent: progress_percent(remaining_km),
            status: service_status(remaining_km),
        }
    }
}

/// Share of the current service interval already driven, in whole percent.
pub fn progress_percent(remaining_km: f64) -> u8 {
    let interval = SERVICE_INTERVAL_KM as f64;
    let pct = (100.0 * (interval - remaining_km) / interval).round();
    pct.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::types::ServiceStatus;

    #[test]
    fn test_service_status_is_idempotent() {
        let schedule = HashedServiceSchedule;
        let first = schedule.service_status("veh-4411", 0.0);
        for _ in 0..5 {
            let again = schedule.service_status("veh-4411", 0.0);
            assert_eq!(again.odometer_km.to_bits(), first.odometer_km.to_bits());
            assert_eq!(again.remaining_km.to_bits(), first.remaining_km.to_bits());
        }
    }

    #[test]
    fn test_mock_values_stay_in_range() {
        let schedule = HashedServiceSchedule;
        for i in 0..500 {
            let info = schedule.service_status(&format!("unit-{i}"), 0.0);
            assert!(info.remaining_km >= 0.0 && info.remaining_km < 10_000.0);
            assert!(info.odometer_km >= 10_000.0 && info.odometer_km < 180_000.0);
            assert!(info.progress_percent <= 100);
            assert_eq!(info.next_service_km, info.odometer_km + info.remaining_km);
        }
    }

    #[test]
    fn test_reported_odometer_is_used() {
        let info = HashedServiceSchedule.service_status("veh-1", 123_456.0);
        assert_eq!(info.odometer_km, 123_456.0);
        assert_eq!(info.next_service_km, 123_456.0 + info.remaining_km);
    }

    #[test]
    fn test_known_hash_placement() {
        // "ab" hashes to 97 * 31 + 98 = 3105
        let info = HashedServiceSchedule.service_status("ab", 0.0);
        assert_eq!(info.remaining_km, 3105.0);
        assert_eq!(info.odometer_km, 10_000.0);
        assert_eq!(info.status, ServiceStatus::Ok);
        assert_eq!(info.progress_percent, 69);
    }

    #[test]
    fn test_status_follows_remaining_km() {
        // "a" hashes to 97
        let info = HashedServiceSchedule.service_status("a", 50_000.0);
        assert_eq!(info.remaining_km, 97.0);
        assert_eq!(info.status, ServiceStatus::Critical);
        assert_eq!(info.progress_percent, 99);
    }

    #[test]
    fn test_progress_percent_bounds() {
        assert_eq!(progress_percent(10_000.0), 0);
        assert_eq!(progress_percent(0.0), 100);
        assert_eq!(progress_percent(5_000.0), 50);
        assert_eq!(progress_percent(12_000.0), 0);
    }
}
