//! Joins flight load, weather factors and baseline into the final series.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Timelike, Utc};
use tracing::{debug, warn};

use crate::load::baseload::BaseloadRow;
use crate::load::flightload::{AirportFlightLoad, fill_gaps};
use crate::load::weather::WeatherFactorRow;
use crate::model::LoadSeriesPoint;

pub type CityBuckets = BTreeMap<String, BTreeMap<DateTime<Utc>, u32>>;

/// Re-keys airport buckets by city and sums airports that serve the same city.
///
/// Airports without data or without a known city are skipped.
pub fn flightload_by_city(
    loads: &[AirportFlightLoad],
    airport_city: &HashMap<String, String>,
) -> CityBuckets {
    let mut by_city = CityBuckets::new();
    for load in loads {
        let Some(buckets) = &load.buckets else {
            continue;
        };
        let Some(city) = airport_city.get(&load.airport_code) else {
            warn!(airport = %load.airport_code, "Airport has no city, dropping its flight load");
            continue;
        };

        let city_buckets = by_city.entry(city.clone()).or_default();
        for (&time, &value) in buckets {
            *city_buckets.entry(time).or_default() += value;
        }
    }

    for buckets in by_city.values_mut() {
        fill_gaps(buckets);
    }
    by_city
}

/// One [`LoadSeriesPoint`] per (city, bucket) of the flight load.
///
/// Baseline is matched on hour of day only, exact match. Weather is matched on
/// the exact bucket time. A missing companion leaves the field `None` and so
/// the total; the row is still emitted.
pub fn compose(
    loads: &[AirportFlightLoad],
    airport_city: &HashMap<String, String>,
    weather: &[WeatherFactorRow],
    baseline: &[BaseloadRow],
) -> Vec<LoadSeriesPoint> {
    let mut weather_index: HashMap<(&str, DateTime<Utc>), f64> = HashMap::new();
    for row in weather {
        weather_index
            .entry((row.city.as_str(), row.time))
            .or_insert(row.factor);
    }

    let mut baseline_index: HashMap<(&str, u32), Option<f64>> = HashMap::new();
    for row in baseline {
        baseline_index
            .entry((row.city.as_str(), row.hour))
            .or_insert(row.baseload);
    }

    let mut points = Vec::new();
    for (city, buckets) in flightload_by_city(loads, airport_city) {
        let mut missing_weather = 0usize;
        for (time, flightload) in buckets {
            let baseload = baseline_index
                .get(&(city.as_str(), time.hour()))
                .copied()
                .flatten();
            let weatherfactor = weather_index.get(&(city.as_str(), time)).copied();
            if weatherfactor.is_none() {
                missing_weather += 1;
            }

            points.push(LoadSeriesPoint {
                total_load: LoadSeriesPoint::combine(baseload, flightload, weatherfactor),
                city: city.clone(),
                time,
                baseload,
                flightload,
                weatherfactor,
            });
        }
        debug!(city = %city, missing_weather, "Customer load composed");
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 8, hour, 0, 0).unwrap()
    }

    fn airport(code: &str, buckets: &[(u32, u32)]) -> AirportFlightLoad {
        AirportFlightLoad {
            airport_code: code.to_string(),
            buckets: Some(buckets.iter().map(|&(h, v)| (at(h), v)).collect()),
        }
    }

    fn cities() -> HashMap<String, String> {
        HashMap::from([
            ("CDG".to_string(), "Paris".to_string()),
            ("ORY".to_string(), "Paris".to_string()),
            ("CGN".to_string(), "Cologne".to_string()),
        ])
    }

    fn base(city: &str, hour: u32, value: f64) -> BaseloadRow {
        BaseloadRow {
            city: city.to_string(),
            hour,
            baseload: Some(value),
        }
    }

    fn wf(city: &str, hour: u32, factor: f64) -> WeatherFactorRow {
        WeatherFactorRow {
            city: city.to_string(),
            time: at(hour),
            factor,
        }
    }

    #[test]
    fn test_airports_of_one_city_are_summed() {
        let loads = vec![airport("CDG", &[(6, 4)]), airport("ORY", &[(6, 3), (9, 1)])];
        let by_city = flightload_by_city(&loads, &cities());

        assert_eq!(by_city.len(), 1);
        assert_eq!(by_city["Paris"][&at(6)], 7);
        assert_eq!(by_city["Paris"][&at(9)], 1);
    }

    #[test]
    fn test_city_gaps_are_filled() {
        let loads = vec![airport("CDG", &[(0, 4)]), airport("ORY", &[(9, 3)])];
        let by_city = flightload_by_city(&loads, &cities());

        let values: Vec<u32> = by_city["Paris"].values().copied().collect();
        assert_eq!(values, vec![4, 0, 0, 3]);
    }

    #[test]
    fn test_unknown_airport_and_no_data_are_skipped() {
        let loads = vec![
            airport("XXX", &[(6, 4)]),
            AirportFlightLoad {
                airport_code: "CGN".to_string(),
                buckets: None,
            },
        ];
        assert!(flightload_by_city(&loads, &cities()).is_empty());
        assert!(compose(&loads, &cities(), &[], &[]).is_empty());
    }

    #[test]
    fn test_total_load() {
        let loads = vec![airport("CGN", &[(12, 5)])];
        let points = compose(
            &loads,
            &cities(),
            &[wf("Cologne", 12, 0.5)],
            &[base("Cologne", 12, 10.0)],
        );

        assert_eq!(points.len(), 1);
        let p = &points[0];
        assert_eq!(p.city, "Cologne");
        assert_eq!(p.time, at(12));
        assert_eq!(p.baseload, Some(10.0));
        assert_eq!(p.flightload, 5);
        assert_eq!(p.weatherfactor, Some(0.5));
        assert_eq!(p.total_load, Some(7.5));
    }

    #[test]
    fn test_missing_weather_keeps_row_with_unknown_total() {
        let loads = vec![airport("CGN", &[(12, 5), (15, 2), (18, 1)])];
        let points = compose(
            &loads,
            &cities(),
            &[wf("Cologne", 15, 0.8), wf("Paris", 12, 1.0)],
            &[base("Cologne", 12, 10.0), base("Cologne", 15, 20.0), base("Cologne", 18, 30.0)],
        );

        assert_eq!(points.len(), 3);
        for p in &points {
            assert_eq!(p.weatherfactor.is_none(), p.total_load.is_none());
        }
        assert_eq!(points[0].weatherfactor, None);
        assert_eq!(points[1].total_load, Some((20.0 + 2.0) * 0.8));
        assert_eq!(points[2].weatherfactor, None);
    }

    #[test]
    fn test_baseline_matches_hour_of_day_only() {
        let next_day = Utc.with_ymd_and_hms(2024, 4, 9, 3, 0, 0).unwrap();
        let loads = vec![AirportFlightLoad {
            airport_code: "CGN".to_string(),
            buckets: Some(BTreeMap::from([(next_day, 2)])),
        }];
        let weather = vec![WeatherFactorRow {
            city: "Cologne".to_string(),
            time: next_day,
            factor: 1.0,
        }];
        let points = compose(&loads, &cities(), &weather, &[base("Cologne", 3, 40.0)]);

        assert_eq!(points[0].baseload, Some(40.0));
        assert_eq!(points[0].total_load, Some(42.0));
    }

    #[test]
    fn test_missing_baseline_leaves_total_unknown() {
        let loads = vec![airport("CGN", &[(12, 5)])];
        let points = compose(&loads, &cities(), &[wf("Cologne", 12, 0.5)], &[]);

        assert_eq!(points[0].baseload, None);
        assert_eq!(points[0].weatherfactor, Some(0.5));
        assert_eq!(points[0].total_load, None);
    }
}
