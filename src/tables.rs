//! Reference tables kept as CSV files: aircraft specifications and city populations.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::{LoadError, LoadResult};
use crate::model::{AircraftReference, CityPopulation};
use crate::services::{AircraftCatalog, PopulationSource};

fn read_rows<T: serde::de::DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: T = result?;
        rows.push(record);
    }
    Ok(rows)
}

/// Aircraft specification table with columns
/// `model_name,typical_seats,max_seats,engine_count,operators`.
#[derive(Debug, Clone)]
pub struct AircraftTable {
    rows: Vec<AircraftReference>,
}

impl AircraftTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("cannot open aircraft table {}", path.display()))?;
        let table = Self::from_reader(file)?;
        debug!(path = %path.display(), rows = table.rows.len(), "Aircraft table read");
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(Self {
            rows: read_rows(reader)?,
        })
    }
}

#[async_trait::async_trait]
impl AircraftCatalog for AircraftTable {
    async fn aircraft_reference(&self) -> LoadResult<Vec<AircraftReference>> {
        Ok(self.rows.clone())
    }
}

/// Population table with columns `city,year,population`.
#[derive(Debug, Clone)]
pub struct PopulationTable {
    rows: Vec<CityPopulation>,
}

impl PopulationTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("cannot open population table {}", path.display()))?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(Self {
            rows: read_rows(reader)?,
        })
    }

    pub fn from_rows(rows: Vec<CityPopulation>) -> Self {
        Self { rows }
    }

    /// The record for `year`, or the latest one before it.
    pub fn active(&self, city: &str, year: i32) -> Option<&CityPopulation> {
        self.rows
            .iter()
            .filter(|r| r.city.eq_ignore_ascii_case(city) && r.year <= year)
            .max_by_key(|r| r.year)
    }
}

#[async_trait::async_trait]
impl PopulationSource for PopulationTable {
    async fn population(&self, city: &str, year: i32) -> LoadResult<CityPopulation> {
        self.active(city, year)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(format!("no population for {city} up to {year}")))
    }
}
