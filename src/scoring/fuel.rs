//! Fuel anomaly detection over a short sensor window.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::scoring::types::{FuelRiskResult, FuelSeverity, FuelSnapshot, SensorSeries};
use crate::scoring::utility::round1;

/// Minutes of sensor history evaluated per vehicle.
pub const FUEL_WINDOW_MINUTES: i64 = 60;

/// Litres lost between two readings that count as a sudden drop.
const DROP_THRESHOLD_L: f64 = 5.0;
/// At or below this speed (km/h) the vehicle is considered stationary.
const STATIONARY_SPEED_KMH: f64 = 3.0;
/// Consumption rate (L/h) considered abnormal for a slow vehicle.
const ABNORMAL_CONSUMPTION_LPH: f64 = 10.0;
const SLOW_SPEED_KMH: f64 = 10.0;
/// Readings are assumed to arrive once per minute.
const READINGS_PER_HOUR: f64 = 60.0;

/// Evaluates a chronologically ordered series.
///
/// Rules, first match wins:
/// 1. a drop of more than 5 L between consecutive readings while the vehicle
///    is stationary → `high`
/// 2. consumption above 10 L/h while the final speed is below 10 km/h
///    → `medium`
///
/// Fewer than two snapshots is reported as insufficient data with severity
/// `none`.
pub fn evaluate(snapshots: &[FuelSnapshot]) -> FuelRiskResult {
    if snapshots.len() < 2 {
        return FuelRiskResult::insufficient_data();
    }

    if let Some(result) = sudden_drop(snapshots) {
        return result;
    }

    if let Some(result) = abnormal_consumption(snapshots) {
        return result;
    }

    FuelRiskResult::none()
}

fn sudden_drop(snapshots: &[FuelSnapshot]) -> Option<FuelRiskResult> {
    snapshots.windows(2).find_map(|pair| {
        let (prev, curr) = (&pair[0], &pair[1]);
        let drop = prev.fuel_volume_l? - curr.fuel_volume_l?;
        // A missing speed reading is treated as stationary.
        let speed = curr.speed_kmh.unwrap_or(0.0);

        if drop > DROP_THRESHOLD_L && speed <= STATIONARY_SPEED_KMH {
            let amount = round1(drop);
            Some(FuelRiskResult {
                suspicious_drop: true,
                drop_amount_l: Some(amount),
                consumption_lph: None,
                description: Some(format!(
                    "Fuel dropped by {amount:.1} L while stationary at {}",
                    curr.timestamp.format("%H:%M")
                )),
                severity: FuelSeverity::High,
            })
        } else {
            None
        }
    })
}

fn abnormal_consumption(snapshots: &[FuelSnapshot]) -> Option<FuelRiskResult> {
    let readings: Vec<(usize, f64)> = snapshots
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.fuel_consumed_l.map(|c| (i, c)))
        .collect();

    let (first_idx, first) = *readings.first()?;
    let (last_idx, last) = *readings.last()?;
    if last_idx <= first_idx {
        return None;
    }

    let hours = (last_idx - first_idx) as f64 / READINGS_PER_HOUR;
    let rate = (last - first) / hours;
    let final_speed = snapshots
        .last()
        .and_then(|s| s.speed_kmh)
        .unwrap_or(0.0);

    if rate > ABNORMAL_CONSUMPTION_LPH && final_speed < SLOW_SPEED_KMH {
        let rate = round1(rate);
        Some(FuelRiskResult {
            suspicious_drop: false,
            drop_amount_l: None,
            consumption_lph: Some(rate),
            description: Some(format!(
                "Consumption of {rate:.1} L/h at {final_speed:.0} km/h"
            )),
            severity: FuelSeverity::Medium,
        })
    } else {
        None
    }
}

/// Merges per-sensor series into snapshots keyed by timestamp.
///
/// Each timestamp present in any series yields one snapshot; fields whose
/// sensor has no reading at that instant stay `None`. Output is ascending.
pub fn merge_sensor_series(series: &SensorSeries) -> Vec<FuelSnapshot> {
    let mut merged: BTreeMap<DateTime<Utc>, FuelSnapshot> = BTreeMap::new();

    for p in &series.fuel_level {
        slot(&mut merged, p.timestamp).fuel_volume_l = Some(p.value);
    }
    for p in &series.fuel_consumed {
        slot(&mut merged, p.timestamp).fuel_consumed_l = Some(p.value);
    }
    for p in &series.speed {
        slot(&mut merged, p.timestamp).speed_kmh = Some(p.value);
    }

    merged.into_values().collect()
}

fn slot(
    merged: &mut BTreeMap<DateTime<Utc>, FuelSnapshot>,
    ts: DateTime<Utc>,
) -> &mut FuelSnapshot {
    merged.entry(ts).or_insert_with(|| FuelSnapshot {
        timestamp: ts,
        fuel_volume_l: None,
        fuel_consumed_l: None,
        speed_kmh: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::types::SensorPoint;
    use chrono::{Duration, TimeZone};

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 8, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn snap(minute: i64, volume: Option<f64>, consumed: Option<f64>, speed: Option<f64>) -> FuelSnapshot {
        FuelSnapshot {
            timestamp: at(minute),
            fuel_volume_l: volume,
            fuel_consumed_l: consumed,
            speed_kmh: speed,
        }
    }

    #[test]
    fn test_single_point_is_insufficient() {
        let result = evaluate(&[snap(0, Some(80.0), Some(10.0), Some(0.0))]);
        assert_eq!(result.severity, FuelSeverity::None);
        assert!(!result.suspicious_drop);
        assert_eq!(result.description.as_deref(), Some("insufficient_data"));
    }

    #[test]
    fn test_empty_series_is_insufficient() {
        assert_eq!(evaluate(&[]).severity, FuelSeverity::None);
    }

    #[test]
    fn test_six_litre_drop_while_parked_is_high() {
        let result = evaluate(&[
            snap(0, Some(60.0), None, Some(0.0)),
            snap(1, Some(54.0), None, Some(0.0)),
        ]);
        assert_eq!(result.severity, FuelSeverity::High);
        assert!(result.suspicious_drop);
        assert_eq!(result.drop_amount_l, Some(6.0));
    }

    #[test]
    fn test_drop_while_moving_is_ignored() {
        let result = evaluate(&[
            snap(0, Some(60.0), None, Some(50.0)),
            snap(1, Some(50.0), None, Some(50.0)),
        ]);
        assert_eq!(result.severity, FuelSeverity::None);
    }

    #[test]
    fn test_drop_of_exactly_five_is_ignored() {
        let result = evaluate(&[
            snap(0, Some(60.0), None, Some(0.0)),
            snap(1, Some(55.0), None, Some(0.0)),
        ]);
        assert_eq!(result.severity, FuelSeverity::None);
    }

    #[test]
    fn test_first_drop_wins() {
        let result = evaluate(&[
            snap(0, Some(70.0), None, Some(0.0)),
            snap(1, Some(62.4), None, Some(2.0)),
            snap(2, Some(40.0), None, Some(0.0)),
        ]);
        assert_eq!(result.drop_amount_l, Some(7.6));
    }

    #[test]
    fn test_gap_in_volume_does_not_pair_across() {
        let result = evaluate(&[
            snap(0, Some(70.0), None, Some(0.0)),
            snap(1, None, None, Some(0.0)),
            snap(2, Some(50.0), None, Some(0.0)),
        ]);
        assert_eq!(result.severity, FuelSeverity::None);
    }

    #[test]
    fn test_abnormal_consumption_when_slow() {
        // 1 L over 3 minutes = 20 L/h
        let result = evaluate(&[
            snap(0, None, Some(100.0), Some(5.0)),
            snap(1, None, None, Some(4.0)),
            snap(2, None, None, Some(2.0)),
            snap(3, None, Some(101.0), Some(2.0)),
        ]);
        assert_eq!(result.severity, FuelSeverity::Medium);
        assert!(!result.suspicious_drop);
        assert_eq!(result.consumption_lph, Some(20.0));
    }

    #[test]
    fn test_high_consumption_at_speed_is_normal() {
        let result = evaluate(&[
            snap(0, None, Some(100.0), Some(90.0)),
            snap(1, None, Some(101.0), Some(90.0)),
        ]);
        assert_eq!(result.severity, FuelSeverity::None);
    }

    #[test]
    fn test_drop_takes_priority_over_consumption() {
        let result = evaluate(&[
            snap(0, Some(60.0), Some(100.0), Some(0.0)),
            snap(1, Some(50.0), Some(105.0), Some(0.0)),
        ]);
        assert_eq!(result.severity, FuelSeverity::High);
    }

    #[test]
    fn test_merge_sensor_series_unions_timestamps() {
        let series = SensorSeries {
            fuel_level: vec![
                SensorPoint { timestamp: at(2), value: 40.0 },
                SensorPoint { timestamp: at(0), value: 42.0 },
            ],
            fuel_consumed: vec![SensorPoint { timestamp: at(1), value: 7.0 }],
            speed: vec![
                SensorPoint { timestamp: at(0), value: 0.0 },
                SensorPoint { timestamp: at(2), value: 1.0 },
            ],
        };

        let merged = merge_sensor_series(&series);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0], snap(0, Some(42.0), None, Some(0.0)));
        assert_eq!(merged[1], snap(1, None, Some(7.0), None));
        assert_eq!(merged[2], snap(2, Some(40.0), None, Some(1.0)));
    }
}
