//! Diesel model structs representing sites, collaborator inputs, and the two
//! engine outputs (weather snapshots and smart-start calculations).

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema;

// Useful constants for standardizing the text-typed columns of
// `smart_start_calculations` and `zone_thermal_state`.
pub mod rate_source {
    pub const OVERRIDE: &str = "override";
    pub const HISTORICAL: &str = "historical";
    pub const CURRENT: &str = "current";
    pub const DEFAULT: &str = "default";
}

pub mod confidence {
    pub const HIGH: &str = "high";
    pub const MEDIUM: &str = "medium";
    pub const LOW: &str = "low";
}

pub mod occupancy_status {
    pub const OCCUPIED: &str = "occupied";
    pub const UNOCCUPIED: &str = "unoccupied";
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::sites)]
pub struct Site {
    pub id: i64,
    pub name: Option<String>,
    pub timezone: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::sites)]
pub struct NewSite {
    pub name: Option<String>,
    pub timezone: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::weather_snapshots)]
#[diesel(belongs_to(Site))]
pub struct WeatherSnapshot {
    pub id: i64,
    pub site_id: i64,
    pub captured_at: DateTime<Utc>,
    pub temp_f: Option<f64>,
    pub feels_like_f: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub cloud_cover_pct: Option<f64>,
    pub precipitation_in: Option<f64>,
    pub uv_index: Option<f64>,
    pub wind_speed_mph: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub condition: String,
    pub illuminance_est: Option<i64>,
    pub solar_elevation_deg: Option<f64>,
    pub visibility_mi: Option<f64>,
    pub forecast: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::weather_snapshots)]
pub struct NewWeatherSnapshot {
    pub site_id: i64,
    pub captured_at: DateTime<Utc>,
    pub temp_f: Option<f64>,
    pub feels_like_f: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub cloud_cover_pct: Option<f64>,
    pub precipitation_in: Option<f64>,
    pub uv_index: Option<f64>,
    pub wind_speed_mph: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub condition: String,
    pub illuminance_est: Option<i64>,
    pub solar_elevation_deg: Option<f64>,
    pub visibility_mi: Option<f64>,
    pub forecast: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::zone_thermal_state)]
#[diesel(belongs_to(Site))]
pub struct ZoneThermalState {
    pub id: i64,
    pub site_id: i64,
    pub device_id: String,
    pub recorded_at: DateTime<Utc>,
    pub indoor_temp_f: Option<f64>,
    pub indoor_humidity_pct: Option<f64>,
    pub outdoor_temp_f: Option<f64>,
    pub indoor_feels_like_f: Option<f64>,
    pub temp_trend_f_per_min: Option<f64>,
    pub occupancy_status: Option<String>,
    pub minutes_since_motion: Option<i32>,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::zone_thermal_state)]
pub struct NewZoneThermalState {
    pub site_id: i64,
    pub device_id: String,
    pub recorded_at: DateTime<Utc>,
    pub indoor_temp_f: Option<f64>,
    pub indoor_humidity_pct: Option<f64>,
    pub outdoor_temp_f: Option<f64>,
    pub indoor_feels_like_f: Option<f64>,
    pub temp_trend_f_per_min: Option<f64>,
    pub occupancy_status: Option<String>,
    pub minutes_since_motion: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::zone_schedule_settings)]
#[diesel(belongs_to(Site))]
pub struct ZoneScheduleSettings {
    pub id: i64,
    pub site_id: i64,
    pub device_id: String,
    pub comfort_buffer_f: f64,
    pub humidity_multiplier: f64,
    pub min_lead_minutes: i32,
    pub max_lead_minutes: i32,
    pub ramp_rate_override: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::zone_schedule_settings)]
pub struct NewZoneScheduleSettings {
    pub site_id: i64,
    pub device_id: String,
    pub comfort_buffer_f: f64,
    pub humidity_multiplier: f64,
    pub min_lead_minutes: i32,
    pub max_lead_minutes: i32,
    pub ramp_rate_override: Option<f64>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::ramp_rate_history)]
pub struct RampRateSample {
    pub id: i64,
    pub device_id: String,
    pub mode: String,
    pub avg_rate_f_per_min: f64,
    pub sample_count: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::ramp_rate_history)]
pub struct NewRampRateSample {
    pub device_id: String,
    pub mode: String,
    pub avg_rate_f_per_min: f64,
    pub sample_count: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::zone_opening_hours)]
#[diesel(belongs_to(Site))]
pub struct ZoneOpeningHours {
    pub id: i64,
    pub site_id: i64,
    pub device_id: String,
    pub opening_minutes: i32,
    pub occupied_heat_f: f64,
    pub occupied_cool_f: f64,
    pub enabled: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::zone_opening_hours)]
pub struct NewZoneOpeningHours {
    pub site_id: i64,
    pub device_id: String,
    pub opening_minutes: i32,
    pub occupied_heat_f: f64,
    pub occupied_cool_f: f64,
    pub enabled: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::smart_start_calculations)]
#[diesel(belongs_to(Site))]
pub struct SmartStartCalculation {
    pub id: i64,
    pub site_id: i64,
    pub device_id: String,
    pub calc_date: NaiveDate,
    pub opening_minutes: i32,
    pub occupied_heat_f: f64,
    pub occupied_cool_f: f64,
    pub indoor_temp_f: f64,
    pub outdoor_temp_f: Option<f64>,
    pub indoor_humidity_pct: Option<f64>,
    pub mode: String,
    pub target_temp_f: f64,
    pub delta_needed_f: f64,
    pub rate_used_f_per_min: f64,
    pub rate_source: String,
    pub humidity_feels_offset_f: f64,
    pub humidity_minutes_adjust: i32,
    pub occupancy_override: bool,
    pub base_lead_minutes: f64,
    pub adjusted_lead_minutes: f64,
    pub final_lead_minutes: i32,
    pub start_minutes: i32,
    pub confidence: String,
    pub hit_guardrail: bool,
    pub computed_at: DateTime<Utc>,
}

// AsChangeset with treat_none_as_null: the daily upsert is a full-row
// overwrite, so a None in the recomputation must clear the stored value.
#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = schema::smart_start_calculations)]
#[diesel(treat_none_as_null = true)]
pub struct NewSmartStartCalculation {
    pub site_id: i64,
    pub device_id: String,
    pub calc_date: NaiveDate,
    pub opening_minutes: i32,
    pub occupied_heat_f: f64,
    pub occupied_cool_f: f64,
    pub indoor_temp_f: f64,
    pub outdoor_temp_f: Option<f64>,
    pub indoor_humidity_pct: Option<f64>,
    pub mode: String,
    pub target_temp_f: f64,
    pub delta_needed_f: f64,
    pub rate_used_f_per_min: f64,
    pub rate_source: String,
    pub humidity_feels_offset_f: f64,
    pub humidity_minutes_adjust: i32,
    pub occupancy_override: bool,
    pub base_lead_minutes: f64,
    pub adjusted_lead_minutes: f64,
    pub final_lead_minutes: i32,
    pub start_minutes: i32,
    pub confidence: String,
    pub hit_guardrail: bool,
    pub computed_at: DateTime<Utc>,
}
