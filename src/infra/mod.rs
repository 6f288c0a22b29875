//! HTTP implementations of the data source contracts.

pub mod aerodatabox;
pub mod openweathermap;
