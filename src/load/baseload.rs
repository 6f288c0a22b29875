//! Population-scaled diurnal baseline.
//!
//! A quadratic spline through seven anchor points describes the relative load
//! over a day: quiet at night, peaks in the morning and evening, a dip at noon.
//! The three daytime anchors are jittered per seed so cities do not share an
//! identical curve.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LoadError, LoadResult};
use crate::load::spline::QuadraticSpline;

const LOAD_MIN: f64 = 0.001;
const LOAD_MAX: f64 = 0.1;

pub const ANCHOR_HOURS: [f64; 7] = [0.0, 2.0, 8.0, 12.0, 18.0, 22.0, 24.0];

pub const ANCHOR_LOADS: [f64; 7] = [
    LOAD_MIN,
    LOAD_MAX / 10.0,
    LOAD_MAX,
    LOAD_MAX / 1.5,
    LOAD_MAX,
    LOAD_MAX / 10.0,
    LOAD_MIN,
];

/// Maximum shift of a jittered anchor along the hour axis.
const HOUR_JITTER: f64 = 0.9;
/// Bounds of the multiplicative jitter applied to a jittered anchor's load.
const LOAD_JITTER: (f64, f64) = (0.8, 1.2);

/// Hours at which each city's baseline is sampled, one per 3-hour bucket boundary.
pub const QUERY_HOURS: [f64; 9] = [0.0, 3.0, 6.0, 9.0, 12.0, 15.0, 18.0, 21.0, 24.0];

/// Baseline value of one city at one hour of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseloadRow {
    pub city: String,
    pub hour: u32,
    pub baseload: Option<f64>,
}

/// Anchor points after jitter. Anchors `2..len-2` move; the two at each end stay fixed.
///
/// Each jittered anchor draws from its own generator seeded with `seed + index`,
/// first the hour offset, then the load factor.
pub fn jittered_anchors(seed: u64) -> ([f64; 7], [f64; 7]) {
    let mut hours = ANCHOR_HOURS;
    let mut loads = ANCHOR_LOADS;
    for i in 2..hours.len() - 2 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
        hours[i] += rng.gen_range(-HOUR_JITTER..=HOUR_JITTER);
        loads[i] *= rng.gen_range(LOAD_JITTER.0..=LOAD_JITTER.1);
    }
    (hours, loads)
}

/// Evaluates the jittered curve at every hour in `query_hours`, scaled by `population`.
///
/// Hours outside the anchor range (0..=24) yield `None`.
///
/// # Errors
///
/// [`LoadError::InvalidInput`] for a negative population.
pub fn synthesize(query_hours: &[f64], population: i64, seed: u64) -> LoadResult<Vec<Option<f64>>> {
    if population < 0 {
        return Err(LoadError::InvalidInput(format!(
            "population must not be negative, got {population}"
        )));
    }

    let (hours, loads) = jittered_anchors(seed);
    let curve = QuadraticSpline::interpolate(&hours, &loads)?;

    Ok(query_hours
        .iter()
        .map(|&h| curve.evaluate(h).map(|v| v.abs() * population as f64))
        .collect())
}

/// Baseline rows for one city on the [`QUERY_HOURS`] grid.
pub fn baseline_for_city(city: &str, population: i64, seed: u64) -> LoadResult<Vec<BaseloadRow>> {
    let values = synthesize(&QUERY_HOURS, population, seed)?;
    debug!(city, population, seed, "Baseline synthesized");

    Ok(QUERY_HOURS
        .iter()
        .zip(values)
        .map(|(&hour, baseload)| BaseloadRow {
            city: city.to_string(),
            hour: hour as u32,
            baseload,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const POPULATION: i64 = 1_000_000;

    #[test]
    fn test_deterministic_for_seed() {
        let a = synthesize(&ANCHOR_HOURS, POPULATION, 42).unwrap();
        let b = synthesize(&ANCHOR_HOURS, POPULATION, 42).unwrap();
        let bits = |v: &[Option<f64>]| v.iter().map(|x| x.map(f64::to_bits)).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = synthesize(&QUERY_HOURS, POPULATION, 1).unwrap();
        let b = synthesize(&QUERY_HOURS, POPULATION, 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_out_of_range_hour_has_no_value() {
        let values = synthesize(&[30.0, -1.0, 12.0], POPULATION, 7).unwrap();
        assert_eq!(values[0], None);
        assert_eq!(values[1], None);
        assert!(values[2].is_some());
    }

    #[test]
    fn test_fixed_anchors_are_hit() {
        let values = synthesize(&[0.0, 2.0, 22.0, 24.0], POPULATION, 99).unwrap();
        let expected = [0.001, 0.01, 0.01, 0.001];
        for (v, e) in values.iter().zip(expected) {
            let v = v.unwrap();
            assert!((v - e * POPULATION as f64).abs() < 1e-6, "{v} vs {e}");
        }
    }

    #[test]
    fn test_values_never_negative() {
        let hours: Vec<f64> = (0..=96).map(|q| q as f64 / 4.0).collect();
        for seed in 0..20 {
            for v in synthesize(&hours, POPULATION, seed).unwrap() {
                assert!(v.unwrap() >= 0.0);
            }
        }
    }

    #[test]
    fn test_jitter_bounds() {
        for seed in 0..50 {
            let (hours, loads) = jittered_anchors(seed);
            for i in 0..7 {
                if (2..5).contains(&i) {
                    assert!((hours[i] - ANCHOR_HOURS[i]).abs() <= HOUR_JITTER);
                    let ratio = loads[i] / ANCHOR_LOADS[i];
                    assert!((LOAD_JITTER.0..=LOAD_JITTER.1).contains(&ratio));
                } else {
                    assert_eq!(hours[i], ANCHOR_HOURS[i]);
                    assert_eq!(loads[i], ANCHOR_LOADS[i]);
                }
            }
        }
    }

    #[test]
    fn test_negative_population_rejected() {
        assert!(matches!(
            synthesize(&QUERY_HOURS, -5, 1),
            Err(LoadError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_baseline_for_city_grid() {
        let rows = baseline_for_city("Cologne", POPULATION, 3).unwrap();
        let hours: Vec<u32> = rows.iter().map(|r| r.hour).collect();
        assert_eq!(hours, vec![0, 3, 6, 9, 12, 15, 18, 21, 24]);
        assert!(rows.iter().all(|r| r.city == "Cologne" && r.baseload.is_some()));
    }
}
