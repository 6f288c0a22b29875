//! Demand contributed by air passengers, bucketed per airport.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::load::utility::{bucket_range, bucket_start, round_half_even};

/// Average share of occupied seats on commercial flights.
pub const LOAD_FACTOR: f64 = 0.826;

/// Bounds for the share of passengers that turn into service demand.
const RATE_RANGE: (f64, f64) = (0.005, 0.05);

/// Share of passengers that become demand, fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassengerRate(f64);

impl PassengerRate {
    /// Draws a rate uniformly from `0.005..=0.05`.
    pub fn draw(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self(rng.gen_range(RATE_RANGE.0..=RATE_RANGE.1))
    }

    pub fn fixed(rate: f64) -> Self {
        Self(rate)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// A flight reduced to what the aggregation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatedFlight {
    pub scheduled_time: DateTime<Utc>,
    pub passengers: u32,
}

/// All flights known for one airport. `flights` is `None` when the schedule could not be fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct AirportSchedule {
    pub airport_code: String,
    pub flights: Option<Vec<EstimatedFlight>>,
}

/// Bucketed flight demand of one airport.
///
/// `buckets` is `None` when the airport has no flight data at all. A bucket
/// with value 0 is a real zero: it lies between the first and last flight.
#[derive(Debug, Clone, PartialEq)]
pub struct AirportFlightLoad {
    pub airport_code: String,
    pub buckets: Option<BTreeMap<DateTime<Utc>, u32>>,
}

/// Demand units produced by one flight, rounded half to even.
pub fn flight_demand(passengers: u32, rate: PassengerRate) -> u32 {
    round_half_even(passengers as f64 * LOAD_FACTOR * rate.value()) as u32
}

/// Sums flight demand per airport and 3-hour bucket.
///
/// Schedules that share an airport code are merged. Missing buckets between an
/// airport's first and last bucket are filled with zero.
pub fn aggregate(schedules: &[AirportSchedule], rate: PassengerRate) -> Vec<AirportFlightLoad> {
    let mut per_airport: BTreeMap<&str, Vec<&EstimatedFlight>> = BTreeMap::new();
    for schedule in schedules {
        let flights = per_airport.entry(schedule.airport_code.as_str()).or_default();
        if let Some(list) = &schedule.flights {
            flights.extend(list);
        }
    }

    per_airport
        .into_iter()
        .map(|(airport_code, flights)| {
            let buckets = bucket_flights(&flights, rate);
            match &buckets {
                Some(b) => debug!(airport = airport_code, buckets = b.len(), "Flight load bucketed"),
                None => warn!(airport = airport_code, "No flight data for airport"),
            }
            AirportFlightLoad {
                airport_code: airport_code.to_string(),
                buckets,
            }
        })
        .collect()
}

fn bucket_flights(
    flights: &[&EstimatedFlight],
    rate: PassengerRate,
) -> Option<BTreeMap<DateTime<Utc>, u32>> {
    let mut buckets: BTreeMap<DateTime<Utc>, u32> = BTreeMap::new();
    for flight in flights {
        *buckets.entry(bucket_start(flight.scheduled_time)).or_default() +=
            flight_demand(flight.passengers, rate);
    }

    fill_gaps(&mut buckets);
    (!buckets.is_empty()).then_some(buckets)
}

/// Inserts zero buckets between the first and last existing bucket.
pub(crate) fn fill_gaps(buckets: &mut BTreeMap<DateTime<Utc>, u32>) {
    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return;
    };
    for t in bucket_range(first, last) {
        buckets.entry(t).or_insert(0);
    }
}
