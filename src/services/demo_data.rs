//! Deterministic synthetic collaborator data for local development: one demo
//! site with a handful of zones, their opening hours and policies, a current
//! thermal-state row per zone, and historical ramp-rate aggregates. Seeding
//! is upsert-based so re-running against an existing database is safe.

use crate::db::models::{
    occupancy_status, NewRampRateSample, NewSite, NewZoneOpeningHours, NewZoneScheduleSettings, NewZoneThermalState,
};
use crate::schema;
use chrono::Utc;
use diesel::prelude::*;
use diesel::PgConnection;
use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const SITE_NAME: &str = "Riverside Distribution Center";
const ZONES: [(&str, i32, f64, f64); 5] = [
    // (device, opening minutes-from-midnight, heat setpoint, cool setpoint)
    ("rdc-warehouse-a", 360, 64.0, 78.0),
    ("rdc-warehouse-b", 360, 64.0, 78.0),
    ("rdc-office-1f", 450, 68.0, 76.0),
    ("rdc-office-2f", 450, 68.0, 76.0),
    ("rdc-breakroom", 480, 70.0, 75.0),
];

pub fn run(conn: &mut PgConnection) -> Result<(), String> {
    let site_id = ensure_site(conn)?;
    let mut rng = SmallRng::seed_from_u64(0x00C0_1D5A_CE5E_EDu64);
    let now = Utc::now();

    for (device_id, opening_minutes, heat_f, cool_f) in ZONES {
        let opening = NewZoneOpeningHours {
            site_id,
            device_id: device_id.to_string(),
            opening_minutes,
            occupied_heat_f: heat_f,
            occupied_cool_f: cool_f,
            enabled: true,
        };
        upsert_opening_hours(conn, &opening)?;

        let settings = NewZoneScheduleSettings {
            site_id,
            device_id: device_id.to_string(),
            comfort_buffer_f: 1.0,
            humidity_multiplier: if device_id.contains("warehouse") { 1.2 } else { 1.0 },
            min_lead_minutes: 10,
            max_lead_minutes: if device_id.contains("warehouse") { 120 } else { 90 },
            ramp_rate_override: None,
        };
        upsert_settings(conn, &settings)?;

        for mode in ["heating", "cooling"] {
            let sample = NewRampRateSample {
                device_id: device_id.to_string(),
                mode: mode.to_string(),
                avg_rate_f_per_min: if mode == "heating" {
                    rng.random_range(0.10..=0.25)
                } else {
                    rng.random_range(0.07..=0.18)
                },
                sample_count: rng.random_range(5..=40),
            };
            upsert_ramp_sample(conn, &sample)?;
        }

        let overnight_setback = rng.random_range(55.0..=62.0);
        let state = NewZoneThermalState {
            site_id,
            device_id: device_id.to_string(),
            recorded_at: now,
            indoor_temp_f: Some(overnight_setback),
            indoor_humidity_pct: Some(rng.random_range(25.0..=70.0)),
            outdoor_temp_f: Some(rng.random_range(10.0..=55.0)),
            indoor_feels_like_f: Some(overnight_setback - rng.random_range(0.0..=2.0)),
            temp_trend_f_per_min: Some(rng.random_range(-0.05..=0.05)),
            occupancy_status: Some(occupancy_status::UNOCCUPIED.to_string()),
            minutes_since_motion: Some(rng.random_range(60..=600)),
        };
        diesel::insert_into(schema::zone_thermal_state::dsl::zone_thermal_state)
            .values(&state)
            .execute(conn)
            .map_err(|e| format!("insert thermal state failed: {}", e))?;
    }

    info!("Demo data: seeded site {} with {} zone(s)", site_id, ZONES.len());
    Ok(())
}

fn ensure_site(conn: &mut PgConnection) -> Result<i64, String> {
    use schema::sites::dsl as S;

    let existing = S::sites
        .filter(S::name.eq(SITE_NAME))
        .select(S::id)
        .first::<i64>(conn)
        .optional()
        .map_err(|e| format!("fetch demo site failed: {}", e))?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let new_site = NewSite {
        name: Some(SITE_NAME.to_string()),
        timezone: Some("America/New_York".to_string()),
        latitude: 40.8054,
        longitude: -74.0241,
    };
    diesel::insert_into(S::sites)
        .values(&new_site)
        .returning(S::id)
        .get_result(conn)
        .map_err(|e| format!("insert demo site failed: {}", e))
}

fn upsert_opening_hours(conn: &mut PgConnection, row: &NewZoneOpeningHours) -> Result<(), String> {
    use schema::zone_opening_hours::dsl as O;

    diesel::insert_into(O::zone_opening_hours)
        .values(row)
        .on_conflict((O::site_id, O::device_id))
        .do_update()
        .set((
            O::opening_minutes.eq(row.opening_minutes),
            O::occupied_heat_f.eq(row.occupied_heat_f),
            O::occupied_cool_f.eq(row.occupied_cool_f),
            O::enabled.eq(row.enabled),
            O::updated_at.eq(Utc::now()),
        ))
        .execute(conn)
        .map(|_| ())
        .map_err(|e| format!("upsert opening hours failed: {}", e))
}

fn upsert_settings(conn: &mut PgConnection, row: &NewZoneScheduleSettings) -> Result<(), String> {
    use schema::zone_schedule_settings::dsl as S;

    diesel::insert_into(S::zone_schedule_settings)
        .values(row)
        .on_conflict((S::site_id, S::device_id))
        .do_update()
        .set((
            S::comfort_buffer_f.eq(row.comfort_buffer_f),
            S::humidity_multiplier.eq(row.humidity_multiplier),
            S::min_lead_minutes.eq(row.min_lead_minutes),
            S::max_lead_minutes.eq(row.max_lead_minutes),
            S::ramp_rate_override.eq(row.ramp_rate_override),
            S::updated_at.eq(Utc::now()),
        ))
        .execute(conn)
        .map(|_| ())
        .map_err(|e| format!("upsert schedule settings failed: {}", e))
}

fn upsert_ramp_sample(conn: &mut PgConnection, row: &NewRampRateSample) -> Result<(), String> {
    use schema::ramp_rate_history::dsl as R;

    diesel::insert_into(R::ramp_rate_history)
        .values(row)
        .on_conflict((R::device_id, R::mode))
        .do_update()
        .set((
            R::avg_rate_f_per_min.eq(row.avg_rate_f_per_min),
            R::sample_count.eq(row.sample_count),
            R::updated_at.eq(Utc::now()),
        ))
        .execute(conn)
        .map(|_| ())
        .map_err(|e| format!("upsert ramp rate failed: {}", e))
}
