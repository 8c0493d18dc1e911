//! Weather observation to risk points.

use crate::error::ScoringError;
use crate::scoring::types::WeatherObservation;

/// Upper bound on the points weather can contribute.
pub const MAX_WEATHER_POINTS: u32 = 3;

/// Points contributed by one observation, with the factors that fired.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRisk {
    pub points: u32,
    pub factors: Vec<&'static str>,
}

impl WeatherRisk {
    pub fn description(&self) -> String {
        self.factors.join(", ")
    }
}

/// Coarse grouping of WMO weather codes that matter for driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCondition {
    Clear,
    Fog,
    Drizzle,
    FreezingPrecipitation,
    Rain,
    Snow,
    Thunderstorm,
}

impl WeatherCondition {
    pub fn from_code(code: u16) -> Self {
        match code {
            45 | 48 => WeatherCondition::Fog,
            51..=55 => WeatherCondition::Drizzle,
            56 | 57 | 66 | 67 => WeatherCondition::FreezingPrecipitation,
            61..=65 | 80..=82 => WeatherCondition::Rain,
            71..=77 | 85 | 86 => WeatherCondition::Snow,
            95..=99 => WeatherCondition::Thunderstorm,
            _ => WeatherCondition::Clear,
        }
    }

    fn points(self) -> (u32, Option<&'static str>) {
        match self {
            WeatherCondition::Thunderstorm => (2, Some("thunderstorm")),
            WeatherCondition::FreezingPrecipitation => (2, Some("freezing rain")),
            WeatherCondition::Snow => (1, Some("snow")),
            WeatherCondition::Fog => (1, Some("fog")),
            _ => (0, None),
        }
    }
}

/// Scores a weather observation. Never exceeds [`MAX_WEATHER_POINTS`].
pub fn weather_risk(obs: &WeatherObservation) -> Result<WeatherRisk, ScoringError> {
    validate(obs)?;

    let mut points = 0;
    let mut factors = Vec::new();

    if obs.precipitation_mm >= 5.0 {
        points += 2;
        factors.push("heavy precipitation");
    } else if obs.precipitation_mm > 0.5 {
        points += 1;
        factors.push("precipitation");
    }

    if obs.wind_speed_kmh >= 60.0 {
        points += 2;
        factors.push("storm wind");
    } else if obs.wind_speed_kmh >= 40.0 {
        points += 1;
        factors.push("strong wind");
    }

    if obs.temperature_c <= 0.0 {
        points += 1;
        factors.push("freezing temperature");
    }

    let (code_points, code_factor) = WeatherCondition::from_code(obs.weather_code).points();
    points += code_points;
    factors.extend(code_factor);

    Ok(WeatherRisk {
        points: points.min(MAX_WEATHER_POINTS),
        factors,
    })
}

fn validate(obs: &WeatherObservation) -> Result<(), ScoringError> {
    let fields = [
        ("temperature", obs.temperature_c),
        ("wind speed", obs.wind_speed_kmh),
        ("precipitation", obs.precipitation_mm),
    ];
    for (field, value) in fields {
        if !value.is_finite() {
            return Err(ScoringError::InvalidWeather { field });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(temp: f64, wind: f64, precip: f64, code: u16) -> WeatherObservation {
        WeatherObservation {
            temperature_c: temp,
            wind_speed_kmh: wind,
            precipitation_mm: precip,
            weather_code: code,
        }
    }

    #[test]
    fn test_calm_weather_scores_zero() {
        let risk = weather_risk(&obs(18.0, 10.0, 0.0, 0)).unwrap();
        assert_eq!(risk.points, 0);
        assert!(risk.factors.is_empty());
        assert_eq!(risk.description(), "");
    }

    #[test]
    fn test_rain_and_wind_add_up() {
        let risk = weather_risk(&obs(12.0, 45.0, 1.2, 61)).unwrap();
        assert_eq!(risk.points, 2);
        assert_eq!(risk.description(), "precipitation, strong wind");
    }

    #[test]
    fn test_points_are_capped() {
        let risk = weather_risk(&obs(-4.0, 80.0, 12.0, 96)).unwrap();
        assert_eq!(risk.points, MAX_WEATHER_POINTS);
        assert_eq!(risk.factors.len(), 4);
    }

    #[test]
    fn test_fog_code() {
        let risk = weather_risk(&obs(8.0, 5.0, 0.0, 45)).unwrap();
        assert_eq!(risk.points, 1);
        assert_eq!(risk.factors, vec!["fog"]);
    }

    #[test]
    fn test_condition_from_code() {
        assert_eq!(WeatherCondition::from_code(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_code(66), WeatherCondition::FreezingPrecipitation);
        assert_eq!(WeatherCondition::from_code(73), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_code(99), WeatherCondition::Thunderstorm);
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let err = weather_risk(&obs(f64::NAN, 0.0, 0.0, 0)).unwrap_err();
        assert_eq!(err, ScoringError::InvalidWeather { field: "temperature" });
    }
}
