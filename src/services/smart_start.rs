//! Smart-start scheduling engine.
//!
//! For one zone and one scheduled opening time, decide how many minutes of
//! pre-conditioning the space needs to hit its occupied setpoint at opening,
//! and persist the full decision breakdown as the day's record. The
//! computation itself is pure: collaborator lookups (settings, thermal state,
//! ramp-rate history) are loaded up front or injected, so the policy can be
//! unit-tested without a database.

use crate::db::models::{confidence, occupancy_status, rate_source, NewSmartStartCalculation, SmartStartCalculation};
use crate::schema;
use crate::services::weather;
use crate::utils::format_minutes_of_day;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use log::{debug, info, warn};

/// Substituted indoor temperature when no thermal-state row exists.
pub const DEFAULT_INDOOR_TEMP_F: f64 = 65.0;
/// Mode fallback ramp rates, degrees F per minute.
pub const DEFAULT_HEATING_RATE: f64 = 0.15;
pub const DEFAULT_COOLING_RATE: f64 = 0.10;
/// Historical averages and live trends below this magnitude are noise.
pub const MIN_USABLE_RATE: f64 = 0.01;
/// Motion within this many minutes counts as current occupancy.
pub const OCCUPANCY_MOTION_WINDOW_MIN: i32 = 10;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HvacMode {
    Heating,
    Cooling,
}

impl HvacMode {
    pub fn as_str(self) -> &'static str {
        match self {
            HvacMode::Heating => "heating",
            HvacMode::Cooling => "cooling",
        }
    }

    fn default_rate(self) -> f64 {
        match self {
            HvacMode::Heating => DEFAULT_HEATING_RATE,
            HvacMode::Cooling => DEFAULT_COOLING_RATE,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RateSource {
    Override,
    Historical,
    Current,
    Default,
}

impl RateSource {
    pub fn as_str(self) -> &'static str {
        match self {
            RateSource::Override => rate_source::OVERRIDE,
            RateSource::Historical => rate_source::HISTORICAL,
            RateSource::Current => rate_source::CURRENT,
            RateSource::Default => rate_source::DEFAULT,
        }
    }
}

/// One engine invocation: a zone, its opening time, and the occupied
/// setpoints the schedule wants reached at that time.
#[derive(Debug, Clone)]
pub struct SmartStartRequest {
    pub site_id: i64,
    pub device_id: String,
    pub opening_minutes: i32,
    pub occupied_heat_f: f64,
    pub occupied_cool_f: f64,
}

/// Per-zone tunable policy with the documented defaults applied.
#[derive(Debug, Clone)]
pub struct SchedulePolicy {
    pub comfort_buffer_f: f64,
    pub humidity_multiplier: f64,
    pub min_lead_minutes: i32,
    pub max_lead_minutes: i32,
    pub ramp_rate_override: Option<f64>,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        SchedulePolicy {
            comfort_buffer_f: 1.0,
            humidity_multiplier: 1.0,
            min_lead_minutes: 10,
            max_lead_minutes: 90,
            ramp_rate_override: None,
        }
    }
}

impl From<&crate::db::models::ZoneScheduleSettings> for SchedulePolicy {
    fn from(row: &crate::db::models::ZoneScheduleSettings) -> Self {
        SchedulePolicy {
            comfort_buffer_f: row.comfort_buffer_f,
            humidity_multiplier: row.humidity_multiplier,
            min_lead_minutes: row.min_lead_minutes,
            // a misconfigured max below min would make the clamp panic
            max_lead_minutes: row.max_lead_minutes.max(row.min_lead_minutes),
            ramp_rate_override: row.ramp_rate_override.filter(|r| *r > 0.0),
        }
    }
}

/// Zone state inputs, every field optional except what the defaults cover.
#[derive(Debug, Clone, Default)]
pub struct ThermalInputs {
    pub indoor_temp_f: Option<f64>,
    pub indoor_humidity_pct: Option<f64>,
    pub outdoor_temp_f: Option<f64>,
    pub temp_trend_f_per_min: Option<f64>,
    pub occupancy_status: Option<String>,
    pub minutes_since_motion: Option<i32>,
}

impl From<&crate::db::models::ZoneThermalState> for ThermalInputs {
    fn from(row: &crate::db::models::ZoneThermalState) -> Self {
        ThermalInputs {
            indoor_temp_f: row.indoor_temp_f,
            indoor_humidity_pct: row.indoor_humidity_pct,
            outdoor_temp_f: row.outdoor_temp_f,
            temp_trend_f_per_min: row.temp_trend_f_per_min,
            occupancy_status: row.occupancy_status.clone(),
            minutes_since_motion: row.minutes_since_motion,
        }
    }
}

/// Narrow read-only lookup for the historical average recovery rate of a
/// device in a mode. Absent means insufficient history.
pub trait RampRateSource {
    fn average_ramp_rate(&mut self, device_id: &str, mode: HvacMode) -> Result<Option<f64>, String>;
}

/// Diesel-backed lookup against `ramp_rate_history`.
pub struct DbRampRates<'a>(pub &'a mut PgConnection);

impl RampRateSource for DbRampRates<'_> {
    fn average_ramp_rate(&mut self, device_id: &str, mode: HvacMode) -> Result<Option<f64>, String> {
        use schema::ramp_rate_history::dsl as R;

        R::ramp_rate_history
            .filter(R::device_id.eq(device_id).and(R::mode.eq(mode.as_str())))
            .select(R::avg_rate_f_per_min)
            .first::<f64>(self.0)
            .optional()
            .map_err(|e| format!("ramp rate lookup failed: {}", e))
    }
}

/// Compute one smart-start decision. Pure apart from the injected ramp-rate
/// lookup; `calc_date`/`computed_at` are passed in so reruns compare equal.
pub fn compute(
    req: &SmartStartRequest,
    policy: &SchedulePolicy,
    state: &ThermalInputs,
    ramp: &mut dyn RampRateSource,
    calc_date: NaiveDate,
    computed_at: DateTime<Utc>,
) -> Result<NewSmartStartCalculation, String> {
    let indoor = state.indoor_temp_f.unwrap_or(DEFAULT_INDOOR_TEMP_F);

    let midpoint = (req.occupied_heat_f + req.occupied_cool_f) / 2.0;
    let mode = if indoor < midpoint { HvacMode::Heating } else { HvacMode::Cooling };

    let target = match mode {
        HvacMode::Heating => req.occupied_heat_f + policy.comfort_buffer_f,
        HvacMode::Cooling => req.occupied_cool_f - policy.comfort_buffer_f,
    };
    let delta = (target - indoor).abs();

    // Rate priority: operator override, then historical average, then the
    // live short-window trend, then the mode default.
    let (mut rate, source) = if let Some(r) = policy.ramp_rate_override {
        (r, RateSource::Override)
    } else if let Some(h) = ramp
        .average_ramp_rate(&req.device_id, mode)?
        .filter(|h| h.abs() > MIN_USABLE_RATE)
    {
        (h.abs(), RateSource::Historical)
    } else if let Some(t) = state.temp_trend_f_per_min.filter(|t| t.abs() > MIN_USABLE_RATE) {
        (t.abs(), RateSource::Current)
    } else {
        (mode.default_rate(), RateSource::Default)
    };

    // Cold outdoor air slows an assumed heating rate; empirical rates
    // already reflect it, so only the default branch is corrected.
    if source == RateSource::Default
        && mode == HvacMode::Heating
        && let Some(outdoor) = state.outdoor_temp_f
    {
        let outdoor_delta = 65.0 - outdoor;
        if outdoor_delta > 40.0 {
            rate *= 0.6;
        } else if outdoor_delta > 20.0 {
            rate *= 0.8;
        }
    }

    let base_lead = delta / rate;

    let mut feels_offset = 0.0_f64;
    let mut minutes_adjust = 0.0_f64;
    if let Some(h) = state.indoor_humidity_pct {
        match mode {
            HvacMode::Heating if h > 55.0 => {
                feels_offset = ((h - 55.0) * 0.1).round();
                minutes_adjust = (((h - 55.0) / 10.0) * 5.0).round();
            }
            HvacMode::Cooling if h > 60.0 => {
                feels_offset = ((h - 60.0) * 0.15).round();
                minutes_adjust = (((h - 60.0) / 10.0) * 5.0).round();
            }
            // dry air heats faster
            HvacMode::Heating if h < 30.0 => {
                minutes_adjust = -(((30.0 - h) / 10.0) * 3.0).round();
            }
            _ => {}
        }
    }
    let humidity_minutes = (minutes_adjust * policy.humidity_multiplier).round() as i32;

    // Recorded for the actuation layer; does not change the numbers.
    let occupancy_override = state.occupancy_status.as_deref() == Some(occupancy_status::OCCUPIED)
        && state
            .minutes_since_motion
            .is_some_and(|m| m < OCCUPANCY_MOTION_WINDOW_MIN);

    let adjusted_lead = base_lead + humidity_minutes as f64;
    let final_lead = (adjusted_lead.round() as i32).clamp(policy.min_lead_minutes, policy.max_lead_minutes);
    let start_minutes = req.opening_minutes - final_lead;

    let humidity_known = state.indoor_humidity_pct.is_some();
    let outdoor_known = state.outdoor_temp_f.is_some();
    let confidence = if source == RateSource::Historical && humidity_known && outdoor_known {
        confidence::HIGH
    } else if source != RateSource::Default || humidity_known {
        confidence::MEDIUM
    } else {
        confidence::LOW
    };

    let hit_guardrail = final_lead == policy.min_lead_minutes
        || final_lead == policy.max_lead_minutes
        || final_lead == start_minutes;

    Ok(NewSmartStartCalculation {
        site_id: req.site_id,
        device_id: req.device_id.clone(),
        calc_date,
        opening_minutes: req.opening_minutes,
        occupied_heat_f: req.occupied_heat_f,
        occupied_cool_f: req.occupied_cool_f,
        indoor_temp_f: indoor,
        outdoor_temp_f: state.outdoor_temp_f,
        indoor_humidity_pct: state.indoor_humidity_pct,
        mode: mode.as_str().to_string(),
        target_temp_f: target,
        delta_needed_f: delta,
        rate_used_f_per_min: rate,
        rate_source: source.as_str().to_string(),
        humidity_feels_offset_f: feels_offset,
        humidity_minutes_adjust: humidity_minutes,
        occupancy_override,
        base_lead_minutes: base_lead,
        adjusted_lead_minutes: adjusted_lead,
        final_lead_minutes: final_lead,
        start_minutes,
        confidence: confidence.to_string(),
        hit_guardrail,
        computed_at,
    })
}

/// Load the zone's policy, falling back to the documented defaults.
pub fn load_policy(conn: &mut PgConnection, site_id: i64, device_id: &str) -> Result<SchedulePolicy, String> {
    use schema::zone_schedule_settings::dsl as S;

    let row = S::zone_schedule_settings
        .filter(S::site_id.eq(site_id).and(S::device_id.eq(device_id)))
        .first::<crate::db::models::ZoneScheduleSettings>(conn)
        .optional()
        .map_err(|e| format!("settings lookup failed: {}", e))?;

    Ok(match row {
        Some(ref settings) => SchedulePolicy::from(settings),
        None => {
            debug!("No schedule settings for device {device_id}; using defaults");
            SchedulePolicy::default()
        }
    })
}

/// Load the most recent thermal-state row for the site. A missing row is
/// not an error: the engine runs on the documented defaults.
pub fn load_thermal_inputs(conn: &mut PgConnection, site_id: i64) -> Result<ThermalInputs, String> {
    use schema::zone_thermal_state::dsl as T;

    let row = T::zone_thermal_state
        .filter(T::site_id.eq(site_id))
        .order(T::recorded_at.desc())
        .first::<crate::db::models::ZoneThermalState>(conn)
        .optional()
        .map_err(|e| format!("thermal state lookup failed: {}", e))?;

    Ok(match row {
        Some(ref state) => ThermalInputs::from(state),
        None => {
            warn!(
                "No thermal state for site {site_id}; assuming indoor {DEFAULT_INDOOR_TEMP_F}F and no optional inputs"
            );
            ThermalInputs::default()
        }
    })
}

/// Upsert the day's record for (device, date), overwriting any prior run.
/// This is the only write in the engine and the only hard failure path.
pub fn upsert_calculation(
    conn: &mut PgConnection,
    row: &NewSmartStartCalculation,
) -> Result<SmartStartCalculation, String> {
    use schema::smart_start_calculations::dsl as C;

    diesel::insert_into(C::smart_start_calculations)
        .values(row)
        .on_conflict((C::device_id, C::calc_date))
        .do_update()
        .set(row)
        .get_result(conn)
        .map_err(|e| format!("upsert smart start calculation failed: {}", e))
}

/// Full engine pass for one zone: load collaborator inputs, fill a missing
/// outdoor temperature from the latest fresh weather snapshot, compute, and
/// persist. Weather being unavailable or stale only degrades confidence.
pub fn run_for_zone(
    conn: &mut PgConnection,
    req: &SmartStartRequest,
    snapshot_stale_after: chrono::Duration,
) -> Result<SmartStartCalculation, String> {
    let now = Utc::now();
    let policy = load_policy(conn, req.site_id, &req.device_id)?;
    let mut state = load_thermal_inputs(conn, req.site_id)?;

    if state.outdoor_temp_f.is_none() {
        match weather::latest_snapshot(conn, req.site_id)? {
            Some(snap) if !weather::is_stale(snap.captured_at, now, snapshot_stale_after) => {
                state.outdoor_temp_f = snap.temp_f;
            }
            Some(snap) => {
                debug!(
                    "Snapshot for site {} from {} is stale; outdoor correction skipped",
                    req.site_id, snap.captured_at
                );
            }
            None => {}
        }
    }

    let row = compute(req, &policy, &state, &mut DbRampRates(conn), now.date_naive(), now)?;
    let saved = upsert_calculation(conn, &row)?;

    info!(
        "Smart start: device {} opens {} -> lead {} min, start {} ({}, rate {:.3} F/min from {}, confidence {}{})",
        saved.device_id,
        format_minutes_of_day(saved.opening_minutes),
        saved.final_lead_minutes,
        format_minutes_of_day(saved.start_minutes),
        saved.mode,
        saved.rate_used_f_per_min,
        saved.rate_source,
        saved.confidence,
        if saved.hit_guardrail { ", guardrail" } else { "" }
    );

    Ok(saved)
}
