//! Append-only CSV tables keyed by a natural key.
//!
//! A table is read in full, rows whose key is already present are dropped,
//! and only the remaining rows are appended. Existing rows are never
//! rewritten or deleted.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::hash::Hash;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::model::{AirportAssignment, FlightEvent, GeoCoords, LoadSeriesPoint, WeatherSample};

/// Identity of a row independent of its measured values.
pub trait NaturalKey {
    type Key: Eq + Hash;

    fn natural_key(&self) -> Self::Key;
}

impl NaturalKey for LoadSeriesPoint {
    type Key = (String, DateTime<Utc>);

    fn natural_key(&self) -> Self::Key {
        (self.city.clone(), self.time)
    }
}

impl NaturalKey for WeatherSample {
    type Key = (String, DateTime<Utc>);

    fn natural_key(&self) -> Self::Key {
        (self.city.clone(), self.timestamp)
    }
}

impl NaturalKey for FlightEvent {
    type Key = (String, String, DateTime<Utc>);

    fn natural_key(&self) -> Self::Key {
        (
            self.airport_code.clone(),
            self.flight_number.clone(),
            self.scheduled_time,
        )
    }
}

impl NaturalKey for GeoCoords {
    type Key = String;

    fn natural_key(&self) -> Self::Key {
        self.city.clone()
    }
}

impl NaturalKey for AirportAssignment {
    type Key = (String, String);

    fn natural_key(&self) -> Self::Key {
        (self.airport_code.clone(), self.city.clone())
    }
}

/// Reads every row of the table at `path`. A missing file is an empty table.
pub fn read_all<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: T = result.with_context(|| format!("bad row in {}", path.display()))?;
        rows.push(record);
    }
    Ok(rows)
}

/// Rows of `candidates` whose key is neither in `existing` nor earlier in `candidates`.
pub fn new_rows<'a, T: NaturalKey>(existing: &[T], candidates: &'a [T]) -> Vec<&'a T> {
    let mut seen: HashSet<T::Key> = existing.iter().map(NaturalKey::natural_key).collect();
    candidates
        .iter()
        .filter(|row| seen.insert(row.natural_key()))
        .collect()
}

/// Appends the rows of `rows` not yet present in the table at `path`.
///
/// Creates the file with headers if it does not exist. Returns the number of rows written.
pub fn append_new<T>(path: &Path, rows: &[T]) -> Result<usize>
where
    T: NaturalKey + Serialize + DeserializeOwned,
{
    let existing: Vec<T> = read_all(path)?;
    let fresh = new_rows(&existing, rows);
    debug!(
        path = %path.display(),
        existing = existing.len(),
        candidates = rows.len(),
        fresh = fresh.len(),
        "Natural-key diff computed"
    );
    if fresh.is_empty() {
        return Ok(0);
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file_exists = path.exists();
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("cannot open {} for append", path.display()))?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);
    for row in &fresh {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = fresh.len(), "Rows appended");
    Ok(fresh.len())
}
