//! Airports, flight schedules and aircraft specifications.

use chrono::{DateTime, Duration, Utc};

use crate::error::LoadResult;
use crate::model::{AircraftReference, FlightEvent};

/// Longest time window a single schedule request may cover.
pub const MAX_WINDOW_HOURS: u32 = 12;

/// Finds airports with scheduled traffic near a location.
#[async_trait::async_trait]
pub trait AirportLookup: Send + Sync {
    async fn airports_near(&self, latitude: f64, longitude: f64) -> LoadResult<Vec<String>>;
}

#[async_trait::async_trait]
pub trait FlightSchedule: Send + Sync {
    /// Arrivals and departures at `airport_code` scheduled within `from..=to`.
    async fn flights(
        &self,
        airport_code: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> LoadResult<Vec<FlightEvent>>;
}

/// Typical seat counts per aircraft model.
#[async_trait::async_trait]
pub trait AircraftCatalog: Send + Sync {
    async fn aircraft_reference(&self) -> LoadResult<Vec<AircraftReference>>;
}

/// Splits `horizon_hours` from `start` into consecutive windows of at most `max_step_hours`.
///
/// Each window ends one second before the next one starts.
pub fn flight_windows(
    start: DateTime<Utc>,
    horizon_hours: u32,
    max_step_hours: u32,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    if max_step_hours == 0 {
        return Vec::new();
    }
    (0..horizon_hours.div_ceil(max_step_hours))
        .map(|i| {
            let offset = i * max_step_hours;
            let step = max_step_hours.min(horizon_hours - offset);
            let from = start + Duration::hours(offset as i64);
            let to = from + Duration::hours(step as i64) - Duration::seconds(1);
            (from, to)
        })
        .collect()
}
