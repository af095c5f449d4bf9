//! Scheduling pass: refresh weather per site, then run the smart-start
//! engine for every enabled zone. One pass per day is enough (the engine
//! upserts on device+date), but the steady-cadence loop keeps the day's
//! record tracking the latest collaborator state.

use crate::client::WeatherClient;
use crate::db::models::Site;
use crate::schema;
use crate::services::{smart_start, weather};
use diesel::prelude::*;
use diesel::PgConnection;
use log::{info, warn};
use std::thread;
use std::time::{Duration, Instant};

pub fn run_loop(
    conn: &mut PgConnection,
    client: &WeatherClient,
    snapshot_stale_after: chrono::Duration,
    interval: Duration,
) -> Result<(), String> {
    loop {
        let tick_start = Instant::now();

        run_once(conn, client, snapshot_stale_after)?;

        // Maintain steady cadence
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}

/// One full pass over every site with enabled opening hours. A failed
/// weather fetch degrades that site's calculations; a failed decision write
/// aborts the pass so the caller can alert.
pub fn run_once(
    conn: &mut PgConnection,
    client: &WeatherClient,
    snapshot_stale_after: chrono::Duration,
) -> Result<usize, String> {
    use schema::sites::dsl as S;
    use schema::zone_opening_hours::dsl as O;

    let sites: Vec<Site> = S::sites
        .order(S::id.asc())
        .load(conn)
        .map_err(|e| format!("load sites failed: {}", e))?;

    let mut scheduled = 0usize;
    for site in &sites {
        let zones: Vec<crate::db::models::ZoneOpeningHours> = O::zone_opening_hours
            .filter(O::site_id.eq(site.id).and(O::enabled.eq(true)))
            .order(O::device_id.asc())
            .load(conn)
            .map_err(|e| format!("load opening hours failed: {}", e))?;
        if zones.is_empty() {
            continue;
        }

        match weather::fetch_snapshot(client, site) {
            Ok(row) => {
                weather::insert_snapshot(conn, &row)?;
                info!(
                    "Weather: site {} {} {}F (elevation {}deg)",
                    site.id,
                    row.condition,
                    row.temp_f.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string()),
                    row.solar_elevation_deg.map(|e| e.to_string()).unwrap_or_default()
                );
            }
            Err(e) => {
                warn!("Weather fetch failed for site {}; scheduling continues without it: {}", site.id, e);
            }
        }

        for zone in &zones {
            let req = smart_start::SmartStartRequest {
                site_id: zone.site_id,
                device_id: zone.device_id.clone(),
                opening_minutes: zone.opening_minutes,
                occupied_heat_f: zone.occupied_heat_f,
                occupied_cool_f: zone.occupied_cool_f,
            };
            smart_start::run_for_zone(conn, &req, snapshot_stale_after)?;
            scheduled += 1;
        }
    }

    info!("Scheduling pass complete: {} zone(s) across {} site(s)", scheduled, sites.len());
    Ok(scheduled)
}
