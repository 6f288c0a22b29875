//! Seat counts for free-text aircraft model names.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::{LoadError, LoadResult};
use crate::model::{AircraftReference, FlightEvent};

/// Seats assumed when the aircraft is unknown: the median single-aisle configuration.
pub const DEFAULT_SEATS: u32 = 150;

/// Matches at or above this distance are rejected.
const MATCH_THRESHOLD: f64 = 0.5;

/// Positional similarity distance between a queried model name and a reference name.
///
/// Counts case-insensitive characters that are equal at the same position, up to
/// the shorter length. Zero matches costs the query length; otherwise the distance
/// is `|1 - len(query) / matches|`, so identical names score 0.
pub fn name_distance(query: &str, candidate: &str) -> f64 {
    let query = query.to_lowercase();
    let candidate = candidate.to_lowercase();

    let equal = query
        .chars()
        .zip(candidate.chars())
        .filter(|(a, b)| a == b)
        .count();
    let query_len = query.chars().count() as f64;

    if equal == 0 {
        query_len
    } else {
        (1.0 - query_len / equal as f64).abs()
    }
}

/// Typical seat count of the closest reference entry, if it is close enough.
///
/// Ties go to the first entry in reference order.
pub fn match_seats(name: &str, reference: &[AircraftReference]) -> Option<u32> {
    let mut best: Option<(f64, &AircraftReference)> = None;
    for entry in reference {
        let d = name_distance(name, &entry.model_name);
        if best.is_none_or(|(min, _)| d < min) {
            best = Some((d, entry));
        }
    }

    match best {
        Some((d, entry)) if d < MATCH_THRESHOLD => entry.typical_seats,
        _ => None,
    }
}

/// Run-scoped passenger estimation over one reference table.
///
/// Freighters are dropped from the table, and each distinct model name is matched once.
pub struct PassengerEstimator {
    reference: Vec<AircraftReference>,
    cache: HashMap<String, Option<u32>>,
}

impl PassengerEstimator {
    /// # Errors
    ///
    /// [`LoadError::Fatal`] if no passenger aircraft remain in the table.
    pub fn new(reference: Vec<AircraftReference>) -> LoadResult<Self> {
        let total = reference.len();
        let reference: Vec<_> = reference.into_iter().filter(|a| !a.is_freighter()).collect();
        if reference.is_empty() {
            return Err(LoadError::Fatal(
                "aircraft reference table holds no passenger aircraft".to_string(),
            ));
        }
        info!(
            total,
            passenger_models = reference.len(),
            "Aircraft reference loaded"
        );

        Ok(Self {
            reference,
            cache: HashMap::new(),
        })
    }

    /// Passenger proxy for one flight: the matched typical seat count, or [`DEFAULT_SEATS`].
    pub fn estimate(&mut self, flight: &FlightEvent) -> u32 {
        flight
            .aircraft_model
            .as_deref()
            .and_then(|model| self.seats_for(model))
            .unwrap_or(DEFAULT_SEATS)
    }

    fn seats_for(&mut self, model: &str) -> Option<u32> {
        if let Some(&seats) = self.cache.get(model) {
            return seats;
        }

        let seats = match_seats(model, &self.reference);
        if seats.is_none() {
            debug!(model, "No aircraft match, using default seats");
        }
        self.cache.insert(model.to_string(), seats);
        seats
    }
}
