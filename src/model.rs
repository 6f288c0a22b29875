//! Values exchanged between the collaborators and the load engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a flight lands at or leaves the airport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Arrival,
    Departure,
}

/// A single scheduled movement at an airport, as returned by the flight source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightEvent {
    pub airport_code: String,
    pub direction: Direction,
    pub flight_number: String,
    pub scheduled_time: DateTime<Utc>,
    pub terminal: Option<String>,
    pub aircraft_model: Option<String>,
    pub airline: String,
}

/// One row of the aircraft specification table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftReference {
    pub model_name: String,
    pub typical_seats: Option<u32>,
    pub max_seats: Option<u32>,
    pub engine_count: u8,
    pub operators: String,
}

impl AircraftReference {
    /// Freighter variants carry a trailing `F` in their model name.
    pub fn is_freighter(&self) -> bool {
        self.model_name.trim_end().ends_with('F')
    }
}

/// A forecast sample for one city at one 3-hour step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub city: String,
    pub timestamp: DateTime<Utc>,
    /// Rain volume over the last three hours, in mm.
    pub rain_mm_3h: f64,
    /// Probability of precipitation, 0..=1.
    pub rain_probability: f64,
    /// Wind speed in m/s.
    pub windspeed_mps: f64,
    /// Perceived temperature in °C.
    pub feels_like_temp_c: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityPopulation {
    pub city: String,
    pub year: i32,
    pub population: i64,
}

/// Resolved location of a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoCoords {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
}

/// An airport serving a city. Flight rows map back to their city through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirportAssignment {
    pub airport_code: String,
    pub city: String,
}

/// One row of the final per-city load series.
///
/// `weatherfactor` and `baseload` are `None` when no companion value was
/// found for the row; `total_load` is then `None` as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSeriesPoint {
    pub city: String,
    pub time: DateTime<Utc>,
    pub baseload: Option<f64>,
    pub flightload: u32,
    pub weatherfactor: Option<f64>,
    pub total_load: Option<f64>,
}

impl LoadSeriesPoint {
    /// `(baseload + flightload) * weatherfactor`, undefined if either companion is missing.
    pub fn combine(baseload: Option<f64>, flightload: u32, weatherfactor: Option<f64>) -> Option<f64> {
        match (baseload, weatherfactor) {
            (Some(base), Some(factor)) => Some((base + flightload as f64) * factor),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(name: &str) -> AircraftReference {
        AircraftReference {
            model_name: name.to_string(),
            typical_seats: Some(180),
            max_seats: Some(200),
            engine_count: 2,
            operators: String::new(),
        }
    }

    #[test]
    fn test_is_freighter() {
        assert!(reference("Boeing 777F").is_freighter());
        assert!(reference("Airbus A330-200F ").is_freighter());
        assert!(!reference("Airbus A320").is_freighter());
    }

    #[test]
    fn test_combine_defined() {
        assert_eq!(LoadSeriesPoint::combine(Some(10.0), 5, Some(0.5)), Some(7.5));
    }

    #[test]
    fn test_combine_propagates_missing_companions() {
        assert_eq!(LoadSeriesPoint::combine(Some(10.0), 5, None), None);
        assert_eq!(LoadSeriesPoint::combine(None, 5, Some(0.5)), None);
    }
}
