//! Weather forecasts.

use crate::error::LoadResult;
use crate::model::WeatherSample;

/// Forecast samples are 3 hours apart.
pub const FORECAST_STEP_HOURS: u32 = 3;

/// The forecast source never looks further ahead than five days.
pub const MAX_FORECAST_HOURS: u32 = 120;

#[async_trait::async_trait]
pub trait WeatherForecast: Send + Sync {
    /// Samples for `city` covering the next `horizon_hours`.
    async fn forecast(&self, city: &str, horizon_hours: u32) -> LoadResult<Vec<WeatherSample>>;
}

/// Number of samples needed to cover `horizon_hours`, including the current step.
pub fn sample_count(horizon_hours: u32) -> u32 {
    (1 + horizon_hours / FORECAST_STEP_HOURS).min(MAX_FORECAST_HOURS / FORECAST_STEP_HOURS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_count() {
        assert_eq!(sample_count(0), 1);
        assert_eq!(sample_count(12), 5);
        assert_eq!(sample_count(48), 17);
        assert_eq!(sample_count(500), 40);
    }
}
