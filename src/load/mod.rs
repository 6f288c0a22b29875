//! Customer load estimation.
//!
//! Three independent signals per city are computed here and merged on a
//! common 3-hour UTC grid: a population-scaled diurnal baseline, the demand
//! brought by arriving and departing passengers, and a weather suppression
//! factor.

pub mod aircraft;
pub mod baseload;
pub mod compose;
pub mod flightload;
pub mod spline;
pub mod utility;
pub mod weather;
