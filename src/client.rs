//! Standalone HTTP client for the external weather provider.
//!
//! - Blocking client using `ureq` (no async).
//! - Targets the Open-Meteo forecast API shape; the base URL is
//!   configurable so deployments can point at a compatible proxy.
//! - Uses existing models in `crate::models::weather`.
//! - No retries: the provider is treated as unreliable and callers decide
//!   how to degrade (the scheduling engine runs without weather input).
//!
//! Every request carries the agent-wide timeout, and the response body is
//! either fully decoded or dropped, so no connection is left pending on any
//! exit path.

use std::time::Duration;

use crate::models::weather::ForecastResponse;

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,\
cloud_cover,precipitation,uv_index,wind_speed_10m,wind_direction_10m,weather_code,visibility";
const HOURLY_FIELDS: &str = "temperature_2m,precipitation_probability,weather_code";
const FORECAST_HOURS: u32 = 6;

#[derive(Debug)]
pub enum WeatherClientError {
    Transport(String),
    Http { status: u16, message: String },
    Payload(String),
}

impl core::fmt::Display for WeatherClientError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            WeatherClientError::Transport(s) => write!(f, "weather unavailable (transport): {}", s),
            WeatherClientError::Http { status, message } => {
                write!(f, "weather unavailable (http {}): {}", status, message)
            }
            WeatherClientError::Payload(s) => write!(f, "weather unavailable (payload): {}", s),
        }
    }
}

impl std::error::Error for WeatherClientError {}

pub struct WeatherClient {
    agent: ureq::Agent,
    base_url: String,
}

impl WeatherClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        WeatherClient {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch current conditions plus a short hourly forecast window for a
    /// coordinate pair. Fahrenheit / mph / inch units, UTC timestamps.
    pub fn get_forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastResponse, WeatherClientError> {
        let url = format!("{}/v1/forecast", self.base_url);
        let req = self
            .agent
            .get(&url)
            .set("Accept", "application/json")
            .query("latitude", &latitude.to_string())
            .query("longitude", &longitude.to_string())
            .query("current", CURRENT_FIELDS)
            .query("hourly", HOURLY_FIELDS)
            .query("forecast_hours", &FORECAST_HOURS.to_string())
            .query("temperature_unit", "fahrenheit")
            .query("wind_speed_unit", "mph")
            .query("precipitation_unit", "inch")
            .query("timezone", "UTC");

        match req.call() {
            Ok(res) => {
                // Decode with path tracking so a malformed payload reports
                // which field broke, not just "invalid type".
                let mut de = serde_json::Deserializer::from_reader(res.into_reader());
                serde_path_to_error::deserialize(&mut de)
                    .map_err(|e| WeatherClientError::Payload(e.to_string()))
            }
            Err(ureq::Error::Transport(t)) => Err(WeatherClientError::Transport(t.to_string())),
            Err(ureq::Error::Status(status, res)) => {
                let body = res.into_string().unwrap_or_else(|_| String::from("<no body>"));
                Err(WeatherClientError::Http { status, message: body })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let client = WeatherClient::new("http://localhost:9000/", DEFAULT_TIMEOUT);
        assert_eq!(client.base_url, "http://localhost:9000");
    }

    #[test]
    fn fixture_payload_parses_with_path_tracking() {
        let json = std::fs::read_to_string("tests/data/forecast.json").expect("fixture present");
        let mut de = serde_json::Deserializer::from_str(&json);
        let parsed: ForecastResponse = serde_path_to_error::deserialize(&mut de).expect("parse forecast");
        let current = parsed.current.expect("current block");
        assert_eq!(current.weather_code, Some(61));
        assert!(current.temperature_2m.is_some());
        let hourly = parsed.hourly.expect("hourly block");
        assert_eq!(hourly.time.map(|t| t.len()), Some(6));
    }

    #[test]
    fn malformed_payload_reports_json_path() {
        let json = r#"{"current": {"temperature_2m": "warm"}}"#;
        let mut de = serde_json::Deserializer::from_str(json);
        let err = serde_path_to_error::deserialize::<_, ForecastResponse>(&mut de).unwrap_err();
        assert!(err.to_string().contains("current.temperature_2m"));
    }
}
