use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::debug;

use city_load::error::{LoadError, LoadResult};
use city_load::fetch::auth::UrlParam;
use city_load::fetch::{BasicClient, fetch_json};
use city_load::model::{GeoCoords, WeatherSample};
use city_load::services::weather_api::sample_count;
use city_load::services::{CityDirectory, WeatherForecast};

const BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Deserialize)]
struct GeoEntry {
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
}

#[derive(Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastEntry>,
}

#[derive(Deserialize)]
struct ForecastEntry {
    dt: i64,
    main: ForecastMain,
    wind: ForecastWind,
    #[serde(default)]
    pop: f64,
    rain: Option<ForecastRain>,
}

#[derive(Deserialize)]
struct ForecastMain {
    feels_like: f64,
}

#[derive(Deserialize)]
struct ForecastWind {
    speed: f64,
}

#[derive(Deserialize)]
struct ForecastRain {
    #[serde(rename = "3h", default)]
    three_hours: f64,
}

/// Geocoding and 5-day/3-hour forecasts from OpenWeatherMap.
pub struct OpenWeatherMapClient {
    base_url: String,
    http: UrlParam<BasicClient>,
}

impl OpenWeatherMapClient {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        let inner = BasicClient::with_timeouts(Duration::from_secs(30), Duration::from_secs(10))?;
        Ok(Self {
            base_url: BASE_URL.to_string(),
            http: UrlParam::new(inner, "appid", api_key),
        })
    }
}

fn to_geocoords(city: &str, entries: Vec<GeoEntry>) -> LoadResult<GeoCoords> {
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| LoadError::NotFound(format!("city '{city}' unknown to geocoder")))?;
    Ok(GeoCoords {
        city: city.to_string(),
        latitude: entry.lat,
        longitude: entry.lon,
        country: entry.country,
    })
}

/// Converts forecast entries to samples. A missing rain block means 0 mm.
fn to_samples(city: &str, response: ForecastResponse) -> LoadResult<Vec<WeatherSample>> {
    response
        .list
        .into_iter()
        .map(|entry| {
            let timestamp = DateTime::from_timestamp(entry.dt, 0).ok_or_else(|| {
                LoadError::Source(format!("forecast timestamp {} out of range", entry.dt))
            })?;
            Ok(WeatherSample {
                city: city.to_string(),
                timestamp,
                rain_mm_3h: entry.rain.map_or(0.0, |r| r.three_hours),
                rain_probability: entry.pop,
                windspeed_mps: entry.wind.speed,
                feels_like_temp_c: entry.main.feels_like,
            })
        })
        .collect()
}

#[async_trait]
impl CityDirectory for OpenWeatherMapClient {
    async fn geocode(&self, city: &str) -> LoadResult<GeoCoords> {
        let url = format!("{}/geo/1.0/direct", self.base_url);
        let entries: Vec<GeoEntry> = fetch_json(
            &self.http,
            &url,
            &[("q", city.to_string()), ("limit", "1".to_string())],
        )
        .await?;
        to_geocoords(city, entries)
    }
}

#[async_trait]
impl WeatherForecast for OpenWeatherMapClient {
    async fn forecast(&self, city: &str, horizon_hours: u32) -> LoadResult<Vec<WeatherSample>> {
        let url = format!("{}/data/2.5/forecast", self.base_url);
        let count = sample_count(horizon_hours);
        let response: ForecastResponse = fetch_json(
            &self.http,
            &url,
            &[
                ("q", city.to_string()),
                ("units", "metric".to_string()),
                ("cnt", count.to_string()),
            ],
        )
        .await?;
        debug!(city, requested = count, received = response.list.len(), "Forecast parsed");
        to_samples(city, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const FORECAST: &str = r#"{
        "cod": "200",
        "list": [
            {"dt": 1712577600, "main": {"temp": 12.1, "feels_like": 10.4}, "wind": {"speed": 3.2}, "pop": 0.0},
            {"dt": 1712588400, "main": {"temp": 11.0, "feels_like": 9.0}, "wind": {"speed": 5.5}, "pop": 0.8, "rain": {"3h": 2.4}}
        ]
    }"#;

    #[test]
    fn test_forecast_parsing() {
        let response: ForecastResponse = serde_json::from_str(FORECAST).unwrap();
        let samples = to_samples("Cologne", response).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].timestamp, Utc.with_ymd_and_hms(2024, 4, 8, 12, 0, 0).unwrap());
        assert_eq!(samples[0].rain_mm_3h, 0.0);
        assert_eq!(samples[0].feels_like_temp_c, 10.4);
        assert_eq!(samples[1].rain_mm_3h, 2.4);
        assert_eq!(samples[1].rain_probability, 0.8);
        assert_eq!(samples[1].windspeed_mps, 5.5);
    }

    #[test]
    fn test_geocode_empty_is_not_found() {
        let result = to_geocoords("Atlantis", Vec::new());
        assert!(matches!(result, Err(LoadError::NotFound(_))));
    }

    #[test]
    fn test_geocode_takes_first_entry() {
        let entries: Vec<GeoEntry> =
            serde_json::from_str(r#"[{"name": "Paris", "lat": 48.85, "lon": 2.35, "country": "FR"}]"#).unwrap();
        let coords = to_geocoords("Paris", entries).unwrap();
        assert_eq!(coords.country, "FR");
        assert_eq!(coords.latitude, 48.85);
    }
}
