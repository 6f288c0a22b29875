//! Run configuration and API credentials.
//!
//! The run configuration is a JSON file:
//! ```json
//! {
//!   "cities": ["Cologne", "Paris", "Madrid"],
//!   "horizon_hours": 48,
//!   "data_dir": "data",
//!   "aircraft_table": "reference/aircraft.csv",
//!   "population_table": "reference/population.csv"
//! }
//! ```
//! Omitted fields take their defaults. Credentials never live in this file;
//! they come from the environment (a `.env` file is honoured).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const OPENWEATHERMAP_KEY_VAR: &str = "OPENWEATHERMAP_API_KEY";
pub const AERODATABOX_KEY_VAR: &str = "AERODATABOX_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub cities: Vec<String>,
    /// How far ahead flights and weather are fetched.
    pub horizon_hours: u32,
    pub data_dir: PathBuf,
    pub aircraft_table: PathBuf,
    pub population_table: PathBuf,
    /// Pause between consecutive upstream requests.
    pub request_delay_ms: u64,
    pub airport_radius_km: u32,
    pub airport_limit: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cities: Vec::new(),
            horizon_hours: 48,
            data_dir: PathBuf::from("data"),
            aircraft_table: PathBuf::from("reference/aircraft.csv"),
            population_table: PathBuf::from("reference/population.csv"),
            request_delay_ms: 200,
            airport_radius_km: 75,
            airport_limit: 1,
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content).context("invalid run config")?;
        Ok(config)
    }

    pub fn load_table(&self) -> PathBuf {
        self.data_dir.join("customerload.csv")
    }

    pub fn cities_table(&self) -> PathBuf {
        self.data_dir.join("cities.csv")
    }

    pub fn airports_table(&self) -> PathBuf {
        self.data_dir.join("airports.csv")
    }

    pub fn weather_table(&self) -> PathBuf {
        self.data_dir.join("weather.csv")
    }

    pub fn flights_table(&self) -> PathBuf {
        self.data_dir.join("flights.csv")
    }
}

/// Keys for the upstream HTTP APIs.
#[derive(Clone)]
pub struct ApiKeys {
    pub openweathermap: String,
    pub aerodatabox: String,
}

impl ApiKeys {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            openweathermap: require_var(OPENWEATHERMAP_KEY_VAR)?,
            aerodatabox: require_var(AERODATABOX_KEY_VAR)?,
        })
    }
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys").finish_non_exhaustive()
    }
}

fn require_var(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = RunConfig::from_json(r#"{"cities": ["Cologne", "Paris"]}"#).unwrap();
        assert_eq!(config.cities, vec!["Cologne", "Paris"]);
        assert_eq!(config.horizon_hours, 48);
        assert_eq!(config.airport_radius_km, 75);
        assert_eq!(config.load_table(), PathBuf::from("data/customerload.csv"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(RunConfig::from_json("{ cities: ").is_err());
    }

    #[test]
    fn test_debug_hides_keys() {
        let keys = ApiKeys {
            openweathermap: "secret-a".to_string(),
            aerodatabox: "secret-b".to_string(),
        };
        let printed = format!("{keys:?}");
        assert!(!printed.contains("secret"));
    }
}
