//! Weather suppression factor.
//!
//! Each forecast variable is mapped linearly onto a 0..=1 scale (1 = no
//! suppression) and the most limiting of the four wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::load::utility::interp_clamped;
use crate::model::WeatherSample;

/// Rain over three hours, mm. 12 mm/3h and above is treated as heavy rain.
const RAIN_DOMAIN: (f64, f64) = (0.0, 12.0);
const RAIN_RANGE: (f64, f64) = (1.0, 0.0);

/// A certain chance of rain alone never suppresses below 0.2.
const RAIN_PROB_DOMAIN: (f64, f64) = (0.0, 1.0);
const RAIN_PROB_RANGE: (f64, f64) = (1.0, 0.2);

/// Perceived temperature, °C.
const TEMP_DOMAIN: (f64, f64) = (-5.0, 15.0);
const TEMP_RANGE: (f64, f64) = (0.0, 1.0);

/// Wind speed, m/s. Upper bound is 55 km/h.
const WIND_DOMAIN: (f64, f64) = (0.0, 55.0 / 3.6);
const WIND_RANGE: (f64, f64) = (1.0, 0.0);

/// Weather factor of one city at one forecast time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherFactorRow {
    pub city: String,
    pub time: DateTime<Utc>,
    pub factor: f64,
}

/// Suppression factor for a single sample, or `None` if any input is not a finite number.
pub fn factor(sample: &WeatherSample) -> Option<f64> {
    let inputs = [
        sample.rain_mm_3h,
        sample.rain_probability,
        sample.feels_like_temp_c,
        sample.windspeed_mps,
    ];
    if inputs.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let rain = interp_clamped(sample.rain_mm_3h, RAIN_DOMAIN, RAIN_RANGE);
    let rain_prob = interp_clamped(sample.rain_probability, RAIN_PROB_DOMAIN, RAIN_PROB_RANGE);
    let temp = interp_clamped(sample.feels_like_temp_c, TEMP_DOMAIN, TEMP_RANGE);
    let wind = interp_clamped(sample.windspeed_mps, WIND_DOMAIN, WIND_RANGE);

    Some(rain.min(rain_prob).min(temp).min(wind))
}

/// Factors for every sample that has one. Samples with unusable inputs are left out,
/// so the composer sees them as missing.
pub fn weather_factors(samples: &[WeatherSample]) -> Vec<WeatherFactorRow> {
    samples
        .iter()
        .filter_map(|s| {
            factor(s).map(|factor| WeatherFactorRow {
                city: s.city.clone(),
                time: s.timestamp,
                factor,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(rain: f64, rain_prob: f64, temp_feel: f64, windspeed: f64) -> WeatherSample {
        WeatherSample {
            city: "Paris".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 4, 8, 12, 0, 0).unwrap(),
            rain_mm_3h: rain,
            rain_probability: rain_prob,
            windspeed_mps: windspeed,
            feels_like_temp_c: temp_feel,
        }
    }

    #[test]
    fn test_fair_weather_does_not_suppress() {
        assert_eq!(factor(&sample(0.0, 0.0, 20.0, 0.0)), Some(1.0));
    }

    #[test]
    fn test_heavy_rain_dominates() {
        assert_eq!(factor(&sample(15.0, 0.0, 20.0, 0.0)), Some(0.0));
    }

    #[test]
    fn test_rain_probability_floor() {
        assert_eq!(factor(&sample(0.0, 1.0, 20.0, 0.0)), Some(0.2));
        assert_eq!(factor(&sample(0.0, 1.7, 20.0, 0.0)), Some(0.2));
    }

    #[test]
    fn test_minimum_of_sub_factors() {
        // temp 5 °C -> 0.5, rain 3 mm -> 0.75
        let f = factor(&sample(3.0, 0.0, 5.0, 0.0)).unwrap();
        assert!((f - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_cold_suppresses_fully() {
        assert_eq!(factor(&sample(0.0, 0.0, -12.0, 0.0)), Some(0.0));
    }

    #[test]
    fn test_storm_wind_suppresses_fully() {
        assert_eq!(factor(&sample(0.0, 0.0, 20.0, 20.0)), Some(0.0));
    }

    #[test]
    fn test_non_finite_input_has_no_factor() {
        assert_eq!(factor(&sample(f64::NAN, 0.0, 20.0, 0.0)), None);
    }

    #[test]
    fn test_weather_factors_skips_unusable_samples() {
        let rows = weather_factors(&[sample(0.0, 0.0, 20.0, 0.0), sample(0.0, f64::NAN, 20.0, 0.0)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].factor, 1.0);
        assert_eq!(rows[0].city, "Paris");
    }

    #[test]
    fn test_factor_within_unit_interval() {
        for rain in [0.0, 4.0, 30.0] {
            for temp in [-20.0, 0.0, 10.0, 35.0] {
                for wind in [0.0, 7.5, 40.0] {
                    let f = factor(&sample(rain, 0.4, temp, wind)).unwrap();
                    assert!((0.0..=1.0).contains(&f));
                }
            }
        }
    }
}
