use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use city_load::error::{LoadError, LoadResult};
use city_load::fetch::auth::ApiKey;
use city_load::fetch::{BasicClient, fetch_json};
use city_load::model::{Direction, FlightEvent};
use city_load::services::{AirportLookup, FlightSchedule};

const HOST: &str = "aerodatabox.p.rapidapi.com";

/// Airport search and flight schedules from AeroDataBox (via RapidAPI).
pub struct AeroDataBoxClient {
    base_url: String,
    http: ApiKey<ApiKey<BasicClient>>,
    radius_km: u32,
    limit: u32,
}

impl AeroDataBoxClient {
    pub fn new(api_key: &str, radius_km: u32, limit: u32) -> anyhow::Result<Self> {
        let inner = BasicClient::with_timeouts(Duration::from_secs(30), Duration::from_secs(10))?;
        let http = ApiKey::new(ApiKey::new(inner, "X-RapidAPI-Host", HOST)?, "X-RapidAPI-Key", api_key)?;
        Ok(Self {
            base_url: format!("https://{HOST}"),
            http,
            radius_km,
            limit,
        })
    }
}

fn parse_airports(json: &Value) -> Vec<String> {
    json["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["iata"].as_str())
                .filter(|code| !code.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Scheduled times come as `"2024-04-08 10:05Z"`.
fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim_end_matches('Z'), "%Y-%m-%d %H:%M")
        .ok()
        .map(|t| t.and_utc())
}

fn parse_flights(airport_code: &str, json: &Value) -> LoadResult<Vec<FlightEvent>> {
    if let Some(message) = json["message"].as_str() {
        return Err(LoadError::Source(format!("AeroDataBox error for {airport_code}: {message}")));
    }

    let mut flights = Vec::new();
    for (key, direction) in [("arrivals", Direction::Arrival), ("departures", Direction::Departure)] {
        let Some(entries) = json[key].as_array() else {
            continue;
        };
        for item in entries {
            let movement = &item["movement"];
            let number = item["number"].as_str().unwrap_or("");
            let Some(scheduled_time) = movement["scheduledTime"]["utc"].as_str().and_then(parse_utc)
            else {
                warn!(airport = airport_code, number, "Flight without usable scheduled time");
                continue;
            };
            flights.push(FlightEvent {
                airport_code: airport_code.to_string(),
                direction,
                flight_number: number.to_string(),
                scheduled_time,
                terminal: movement["terminal"].as_str().map(str::to_string),
                aircraft_model: item["aircraft"]["model"].as_str().map(str::to_string),
                airline: item["airline"]["name"].as_str().unwrap_or("").to_string(),
            });
        }
    }
    Ok(flights)
}

#[async_trait]
impl AirportLookup for AeroDataBoxClient {
    async fn airports_near(&self, latitude: f64, longitude: f64) -> LoadResult<Vec<String>> {
        let url = format!("{}/airports/search/location", self.base_url);
        let json: Value = fetch_json(
            &self.http,
            &url,
            &[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("radiusKm", self.radius_km.to_string()),
                ("limit", self.limit.to_string()),
                ("withFlightInfoOnly", "true".to_string()),
            ],
        )
        .await?;
        Ok(parse_airports(&json))
    }
}

#[async_trait]
impl FlightSchedule for AeroDataBoxClient {
    async fn flights(
        &self,
        airport_code: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> LoadResult<Vec<FlightEvent>> {
        let url = format!(
            "{}/flights/airports/iata/{}/{}/{}",
            self.base_url,
            airport_code,
            from.format("%Y-%m-%dT%H:%M"),
            to.format("%Y-%m-%dT%H:%M"),
        );
        let json: Value = fetch_json(
            &self.http,
            &url,
            &[
                ("direction", "Both".to_string()),
                ("withLeg", "false".to_string()),
                ("withCodeshared", "true".to_string()),
                ("withCargo", "false".to_string()),
                ("withPrivate", "false".to_string()),
            ],
        )
        .await?;
        let flights = parse_flights(airport_code, &json)?;
        debug!(airport = airport_code, %from, %to, flights = flights.len(), "Schedule window parsed");
        Ok(flights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_airports() {
        let json: Value = serde_json::from_str(
            r#"{"count": 2, "items": [{"icao": "EDDK", "iata": "CGN"}, {"icao": "EDLW", "iata": ""}]}"#,
        )
        .unwrap();
        assert_eq!(parse_airports(&json), vec!["CGN".to_string()]);
        assert!(parse_airports(&Value::Null).is_empty());
    }

    #[test]
    fn test_parse_flights() {
        let json: Value = serde_json::from_str(
            r#"{
                "departures": [{
                    "number": "EW 582",
                    "movement": {"scheduledTime": {"utc": "2024-04-08 10:05Z", "local": "2024-04-08 12:05+02:00"}, "terminal": "1"},
                    "aircraft": {"model": "Airbus A320"},
                    "airline": {"name": "Eurowings"}
                }],
                "arrivals": [{
                    "number": "LH 1234",
                    "movement": {"scheduledTime": {"utc": "2024-04-08 11:40Z"}},
                    "airline": {"name": "Lufthansa"}
                }, {
                    "number": "XX 1",
                    "movement": {},
                    "airline": {"name": "Nowhere"}
                }]
            }"#,
        )
        .unwrap();
        let flights = parse_flights("CGN", &json).unwrap();

        assert_eq!(flights.len(), 2);
        let arrival = &flights[0];
        assert_eq!(arrival.direction, Direction::Arrival);
        assert_eq!(arrival.aircraft_model, None);
        assert_eq!(arrival.scheduled_time, Utc.with_ymd_and_hms(2024, 4, 8, 11, 40, 0).unwrap());

        let departure = &flights[1];
        assert_eq!(departure.direction, Direction::Departure);
        assert_eq!(departure.terminal.as_deref(), Some("1"));
        assert_eq!(departure.aircraft_model.as_deref(), Some("Airbus A320"));
        assert_eq!(departure.airline, "Eurowings");
    }

    #[test]
    fn test_api_message_is_source_error() {
        let json: Value = serde_json::from_str(r#"{"message": "You are not subscribed to this API."}"#).unwrap();
        assert!(matches!(parse_flights("CGN", &json), Err(LoadError::Source(_))));
    }
}
