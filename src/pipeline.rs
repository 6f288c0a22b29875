//! One batch run: fetch every city's inputs, then estimate its load.
//!
//! Failures are isolated per city and per airport. A city whose weather
//! cannot be fetched still gets its flight rows (with an unknown weather
//! factor); an airport whose schedule fails contributes no rows. Only a
//! missing aircraft reference table aborts the run.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{Instrument, debug, error, info, warn};

use crate::config::RunConfig;
use crate::error::{LoadError, LoadResult, SourceFailure, Stage};
use crate::load::aircraft::PassengerEstimator;
use crate::load::baseload::{BaseloadRow, baseline_for_city};
use crate::load::compose::compose;
use crate::load::flightload::{AirportSchedule, EstimatedFlight, PassengerRate, aggregate};
use crate::load::weather::weather_factors;
use crate::model::{AirportAssignment, FlightEvent, GeoCoords, LoadSeriesPoint, WeatherSample};
use crate::services::flight_api::MAX_WINDOW_HOURS;
use crate::services::{
    AircraftCatalog, AirportLookup, CityDirectory, FlightSchedule, PopulationSource,
    WeatherForecast, flight_windows,
};
use crate::store;

/// The data sources a run reads from.
#[derive(Clone, Copy)]
pub struct Sources<'a> {
    pub cities: &'a dyn CityDirectory,
    pub population: &'a dyn PopulationSource,
    pub weather: &'a dyn WeatherForecast,
    pub airports: &'a dyn AirportLookup,
    pub flights: &'a dyn FlightSchedule,
    pub aircraft: &'a dyn AircraftCatalog,
}

/// Everything a run produced, including what it had to skip.
#[derive(Debug, Default)]
pub struct RunReport {
    pub seed: u64,
    pub points: Vec<LoadSeriesPoint>,
    pub weather: Vec<WeatherSample>,
    pub flights: Vec<FlightEvent>,
    /// Cities that could be geocoded.
    pub cities: Vec<GeoCoords>,
    /// Every airport the run assigned to a city, including ones whose schedule failed.
    pub airports: Vec<AirportAssignment>,
    pub failures: Vec<SourceFailure>,
}

/// Inputs gathered for one city.
#[derive(Default)]
struct CityInputs {
    coords: Option<GeoCoords>,
    baseline: Vec<BaseloadRow>,
    weather: Vec<WeatherSample>,
    airports: Vec<(String, Option<Vec<FlightEvent>>)>,
    failures: Vec<SourceFailure>,
}

pub struct LoadPipeline<'a> {
    sources: Sources<'a>,
    config: &'a RunConfig,
}

impl<'a> LoadPipeline<'a> {
    pub fn new(sources: Sources<'a>, config: &'a RunConfig) -> Self {
        Self { sources, config }
    }

    /// Computes the load series for every configured city, starting at `start`.
    ///
    /// The same `(inputs, seed)` always gives the same output.
    ///
    /// # Errors
    ///
    /// [`LoadError::Fatal`] when the aircraft reference cannot be loaded or holds
    /// no passenger aircraft. Per-city problems end up in [`RunReport::failures`].
    #[tracing::instrument(skip(self), fields(cities = self.config.cities.len(), horizon = self.config.horizon_hours))]
    pub async fn run(&self, start: DateTime<Utc>, seed: u64) -> LoadResult<RunReport> {
        let reference = self
            .sources
            .aircraft
            .aircraft_reference()
            .await
            .map_err(|e| LoadError::Fatal(format!("aircraft reference unavailable: {e}")))?;
        let mut estimator = PassengerEstimator::new(reference)?;

        let rate = PassengerRate::draw(seed);
        info!(seed, rate = rate.value(), "Passenger rate drawn");

        let mut city_rng = ChaCha8Rng::seed_from_u64(seed);
        city_rng.set_stream(1);

        let mut report = RunReport {
            seed,
            ..Default::default()
        };
        let mut airport_city: HashMap<String, String> = HashMap::new();
        let mut schedules = Vec::new();
        let mut baseline = Vec::new();

        for city in &self.config.cities {
            let city_seed = city_rng.next_u64();
            let span = tracing::info_span!("process_city", city = %city, city_seed);
            let inputs = self
                .gather_city(city, start, city_seed, &airport_city)
                .instrument(span)
                .await;

            report.cities.extend(inputs.coords);
            for (airport, flights) in inputs.airports {
                airport_city.insert(airport.clone(), city.clone());
                report.airports.push(AirportAssignment {
                    airport_code: airport.clone(),
                    city: city.clone(),
                });
                let estimated = flights.as_ref().map(|list| {
                    list.iter()
                        .map(|f| EstimatedFlight {
                            scheduled_time: f.scheduled_time,
                            passengers: estimator.estimate(f),
                        })
                        .collect()
                });
                schedules.push(AirportSchedule {
                    airport_code: airport,
                    flights: estimated,
                });
                report.flights.extend(flights.into_iter().flatten());
            }
            baseline.extend(inputs.baseline);
            report.weather.extend(inputs.weather);
            report.failures.extend(inputs.failures);
        }

        let flightload = aggregate(&schedules, rate);
        let factors = weather_factors(&report.weather);
        report.points = compose(&flightload, &airport_city, &factors, &baseline);

        info!(
            points = report.points.len(),
            unknown_total = report.points.iter().filter(|p| p.total_load.is_none()).count(),
            failures = report.failures.len(),
            "Load run complete"
        );
        Ok(report)
    }

    async fn gather_city(
        &self,
        city: &str,
        start: DateTime<Utc>,
        city_seed: u64,
        known_airports: &HashMap<String, String>,
    ) -> CityInputs {
        let mut inputs = CityInputs::default();

        match self.sources.population.population(city, start.year()).await {
            Ok(pop) => match baseline_for_city(city, pop.population, city_seed) {
                Ok(rows) => inputs.baseline = rows,
                Err(e) => self.skip(&mut inputs, city, Stage::Population, e),
            },
            Err(e) => self.skip(&mut inputs, city, Stage::Population, e),
        }

        match self.sources.weather.forecast(city, self.config.horizon_hours).await {
            Ok(samples) => {
                debug!(samples = samples.len(), "Weather forecast received");
                inputs.weather = samples;
            }
            Err(e) => self.skip(&mut inputs, city, Stage::Weather, e),
        }

        let coords = match self.sources.cities.geocode(city).await {
            Ok(coords) => coords,
            Err(e) => {
                self.skip(&mut inputs, city, Stage::Geocoding, e);
                return inputs;
            }
        };

        let (latitude, longitude) = (coords.latitude, coords.longitude);
        inputs.coords = Some(coords);

        let airports = match self.sources.airports.airports_near(latitude, longitude).await {
            Ok(airports) => airports,
            Err(e) => {
                self.skip(&mut inputs, city, Stage::Airports, e);
                return inputs;
            }
        };
        if airports.is_empty() {
            warn!("No airports found near city");
        } else {
            info!(airports = ?airports, "Airports found");
        }

        for airport in airports {
            if let Some(owner) = known_airports.get(&airport) {
                debug!(airport = %airport, owner = %owner, "Airport already assigned to another city");
                continue;
            }
            if inputs.airports.iter().any(|(code, _)| *code == airport) {
                continue;
            }

            match self.fetch_schedule(&airport, start).await {
                Ok(flights) => {
                    info!(airport = %airport, flights = flights.len(), "Flights fetched");
                    inputs.airports.push((airport, Some(flights)));
                }
                Err(e) => {
                    error!(airport = %airport, error = %e, "Flight fetch failed, airport skipped");
                    inputs
                        .failures
                        .push(SourceFailure::for_airport(city, &airport, Stage::Flights, &e));
                    inputs.airports.push((airport, None));
                }
            }
        }

        inputs
    }

    /// All flights of the horizon, one request per window. Any failed window fails the airport.
    async fn fetch_schedule(&self, airport: &str, start: DateTime<Utc>) -> LoadResult<Vec<FlightEvent>> {
        let mut flights = Vec::new();
        for (from, to) in flight_windows(start, self.config.horizon_hours, MAX_WINDOW_HOURS) {
            self.pause().await;
            flights.extend(self.sources.flights.flights(airport, from, to).await?);
        }
        Ok(flights)
    }

    async fn pause(&self) {
        if self.config.request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)).await;
        }
    }

    fn skip(&self, inputs: &mut CityInputs, city: &str, stage: Stage, e: LoadError) {
        warn!(stage = %stage, error = %e, "City input skipped");
        inputs.failures.push(SourceFailure::for_city(city, stage, &e));
    }
}

/// Appends the run's cities, airports, weather, flights and load points to their
/// tables under `data_dir`.
///
/// Returns the number of load points written.
pub fn persist(report: &RunReport, config: &RunConfig) -> anyhow::Result<usize> {
    store::append_new(&config.cities_table(), &report.cities)?;
    store::append_new(&config.airports_table(), &report.airports)?;
    store::append_new(&config.weather_table(), &report.weather)?;
    store::append_new(&config.flights_table(), &report.flights)?;
    store::append_new(&config.load_table(), &report.points)
}
