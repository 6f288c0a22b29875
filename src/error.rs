//! Error types for the load engine and its collaborators.

use std::fmt;

use serde::Serialize;

pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A city, airport or population could not be resolved.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An upstream source answered with an error or could not be reached.
    #[error("Source error: {0}")]
    Source(String),

    /// Reference data without which the run cannot continue.
    #[error("Fatal: {0}")]
    Fatal(String),
}

impl From<anyhow::Error> for LoadError {
    fn from(e: anyhow::Error) -> Self {
        LoadError::Source(format!("{e:#}"))
    }
}

/// Stage of a run in which an isolated failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Geocoding,
    Population,
    Airports,
    Flights,
    Weather,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Geocoding => "geocoding",
            Stage::Population => "population",
            Stage::Airports => "airports",
            Stage::Flights => "flights",
            Stage::Weather => "weather",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    InvalidInput,
    Source,
}

impl From<&LoadError> for FailureKind {
    fn from(e: &LoadError) -> Self {
        match e {
            LoadError::NotFound(_) => FailureKind::NotFound,
            LoadError::InvalidInput(_) => FailureKind::InvalidInput,
            LoadError::Source(_) | LoadError::Fatal(_) => FailureKind::Source,
        }
    }
}

/// A per-city or per-airport failure that was skipped so the rest of the run could go on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub city: String,
    pub airport: Option<String>,
    pub stage: Stage,
    pub kind: FailureKind,
    pub message: String,
}

impl SourceFailure {
    pub fn for_city(city: &str, stage: Stage, error: &LoadError) -> Self {
        Self {
            city: city.to_string(),
            airport: None,
            stage,
            kind: error.into(),
            message: error.to_string(),
        }
    }

    pub fn for_airport(city: &str, airport: &str, stage: Stage, error: &LoadError) -> Self {
        Self {
            airport: Some(airport.to_string()),
            ..Self::for_city(city, stage, error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_keeps_kind_and_message() {
        let err = LoadError::NotFound("Atlantis".to_string());
        let failure = SourceFailure::for_city("Atlantis", Stage::Geocoding, &err);
        assert_eq!(failure.kind, FailureKind::NotFound);
        assert_eq!(failure.message, "Not found: Atlantis");
        assert_eq!(failure.airport, None);
    }

    #[test]
    fn test_airport_failure() {
        let err = LoadError::Source("timeout".to_string());
        let failure = SourceFailure::for_airport("Cologne", "CGN", Stage::Flights, &err);
        assert_eq!(failure.airport.as_deref(), Some("CGN"));
        assert_eq!(failure.kind, FailureKind::Source);
        assert_eq!(failure.stage.to_string(), "flights");
    }
}
