//! Contracts of the external data sources the load run consumes.
//!
//! Implementations return [`LoadError::NotFound`](crate::error::LoadError::NotFound)
//! for names they cannot resolve and [`LoadError::Source`](crate::error::LoadError::Source)
//! when the upstream fails, so the run can tell the two apart.

pub mod city_api;
pub mod flight_api;
pub mod weather_api;

pub use city_api::{CityDirectory, PopulationSource};
pub use flight_api::{AircraftCatalog, AirportLookup, FlightSchedule, flight_windows};
pub use weather_api::WeatherForecast;
