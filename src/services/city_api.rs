//! City coordinates and population.

use crate::error::LoadResult;
use crate::model::{CityPopulation, GeoCoords};

/// Resolves a city name to its coordinates and country.
#[async_trait::async_trait]
pub trait CityDirectory: Send + Sync {
    async fn geocode(&self, city: &str) -> LoadResult<GeoCoords>;
}

/// Resolves a city name to its population.
#[async_trait::async_trait]
pub trait PopulationSource: Send + Sync {
    /// The population active in `year`: the record for that year, or the latest earlier one.
    async fn population(&self, city: &str, year: i32) -> LoadResult<CityPopulation>;
}
