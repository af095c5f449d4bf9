//! Models for the external weather provider payload (Open-Meteo-compatible).
//!
//! Scope: types only, no API client/server code.
//!
//! Notes
//! - All payload fields are optional; the provider omits blocks depending on
//!   the requested variables.
//! - Provider timestamps are local-time strings without offsets and remain
//!   strings here; capture time is stamped by the snapshot service instead.

use serde::{Deserialize, Serialize};

/// Top-level response for a current-conditions + short hourly forecast query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub current: Option<CurrentConditions>,
    pub hourly: Option<HourlyForecast>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub time: Option<String>,
    pub temperature_2m: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub precipitation: Option<f64>,
    pub uv_index: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub wind_direction_10m: Option<f64>,
    pub weather_code: Option<u16>,
    /// Meters; converted to miles when the snapshot is assembled.
    pub visibility: Option<f64>,
}

/// Columnar short-range forecast, persisted raw alongside the snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: Option<Vec<String>>,
    pub temperature_2m: Option<Vec<Option<f64>>>,
    pub precipitation_probability: Option<Vec<Option<f64>>>,
    pub weather_code: Option<Vec<Option<u16>>>,
}

/// Classified sky/precipitation condition, stored as lowercase text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Foggy,
    Drizzle,
    Rain,
    RainHeavy,
    Snow,
    SnowHeavy,
    Thunderstorm,
    Unknown,
}

impl WeatherCondition {
    /// Classify a WMO weather interpretation code into fixed numeric-range
    /// buckets. Codes outside the known ranges map to `Unknown`.
    pub fn from_wmo_code(code: u16) -> Self {
        match code {
            0..=1 => WeatherCondition::Clear,
            2..=3 => WeatherCondition::PartlyCloudy,
            45..=48 => WeatherCondition::Foggy,
            51..=57 => WeatherCondition::Drizzle,
            61..=63 | 80..=81 => WeatherCondition::Rain,
            65..=67 | 82 => WeatherCondition::RainHeavy,
            71..=73 | 85 => WeatherCondition::Snow,
            75 | 77 | 86 => WeatherCondition::SnowHeavy,
            95..=99 => WeatherCondition::Thunderstorm,
            _ => WeatherCondition::Unknown,
        }
    }
}
