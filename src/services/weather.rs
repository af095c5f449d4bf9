//! Weather snapshot service: fetch current conditions from the provider,
//! classify them, fold in the solar/illuminance estimates, and persist the
//! result as an append-only per-site log.

use crate::client::{WeatherClient, WeatherClientError};
use crate::db::models::{NewWeatherSnapshot, Site, WeatherSnapshot};
use crate::models::weather::WeatherCondition;
use crate::schema;
use crate::solar;
use crate::utils::serde_enum_name;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::PgConnection;

const METERS_PER_MILE: f64 = 1609.344;

/// Fetch and normalize one snapshot for a site. Fails without side effects
/// when the provider is unreachable or returns a malformed payload.
pub fn fetch_snapshot(client: &WeatherClient, site: &Site) -> Result<NewWeatherSnapshot, WeatherClientError> {
    let payload = client.get_forecast(site.latitude, site.longitude)?;
    Ok(build_snapshot(site, &payload, Utc::now()))
}

/// Assemble a snapshot row from a provider payload. Pure; capture time is
/// stamped by the caller so tests and backdated ingestion stay deterministic.
pub fn build_snapshot(
    site: &Site,
    payload: &crate::models::weather::ForecastResponse,
    captured_at: DateTime<Utc>,
) -> NewWeatherSnapshot {
    let current = payload.current.clone().unwrap_or_default();

    let condition = current
        .weather_code
        .map(WeatherCondition::from_wmo_code)
        .unwrap_or(WeatherCondition::Unknown);

    let elevation = solar::solar_elevation_deg(site.latitude, site.longitude, captured_at);
    let illuminance = match (current.cloud_cover, current.uv_index) {
        (Some(cloud), Some(uv)) => Some(solar::estimate_illuminance(cloud, uv, elevation)),
        _ => None,
    };

    NewWeatherSnapshot {
        site_id: site.id,
        captured_at,
        temp_f: current.temperature_2m,
        feels_like_f: current.apparent_temperature,
        humidity_pct: current.relative_humidity_2m,
        cloud_cover_pct: current.cloud_cover,
        precipitation_in: current.precipitation,
        uv_index: current.uv_index,
        wind_speed_mph: current.wind_speed_10m,
        wind_direction_deg: current.wind_direction_10m,
        condition: serde_enum_name(&condition).unwrap_or_else(|| "unknown".to_string()),
        illuminance_est: illuminance,
        solar_elevation_deg: Some(elevation),
        visibility_mi: current.visibility.map(|m| m / METERS_PER_MILE),
        forecast: payload
            .hourly
            .as_ref()
            .and_then(|h| serde_json::to_value(h).ok()),
    }
}

/// Append one snapshot row. Duplicate (site, captured_at) inserts are
/// ignored; existing rows are never updated.
pub fn insert_snapshot(conn: &mut PgConnection, row: &NewWeatherSnapshot) -> Result<usize, String> {
    use schema::weather_snapshots::dsl as W;

    diesel::insert_into(W::weather_snapshots)
        .values(row)
        .on_conflict((W::site_id, W::captured_at))
        .do_nothing()
        .execute(conn)
        .map_err(|e| format!("insert weather snapshot failed: {}", e))
}

/// Most recent snapshot for a site, if any.
pub fn latest_snapshot(conn: &mut PgConnection, site_id: i64) -> Result<Option<WeatherSnapshot>, String> {
    use schema::weather_snapshots::dsl as W;

    W::weather_snapshots
        .filter(W::site_id.eq(site_id))
        .order(W::captured_at.desc())
        .first::<WeatherSnapshot>(conn)
        .optional()
        .map_err(|e| format!("fetch latest snapshot failed: {}", e))
}

/// True when the snapshot is older than `threshold` at `now`. No I/O;
/// consumers decide what staleness means for them.
pub fn is_stale(captured_at: DateTime<Utc>, now: DateTime<Utc>, threshold: Duration) -> bool {
    now - captured_at > threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::weather::{CurrentConditions, ForecastResponse};
    use chrono::TimeZone;

    fn test_site() -> Site {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 0, 0, 0).unwrap();
        Site {
            id: 1,
            name: Some("Plant 4".to_string()),
            timezone: Some("Etc/UTC".to_string()),
            latitude: 40.7,
            longitude: -74.0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn snapshot_carries_classification_and_estimates() {
        let payload = ForecastResponse {
            current: Some(CurrentConditions {
                temperature_2m: Some(71.4),
                apparent_temperature: Some(74.2),
                relative_humidity_2m: Some(68.0),
                cloud_cover: Some(85.0),
                precipitation: Some(0.02),
                uv_index: Some(1.2),
                wind_speed_10m: Some(8.7),
                wind_direction_10m: Some(215.0),
                weather_code: Some(61),
                visibility: Some(16093.44),
                ..Default::default()
            }),
            ..Default::default()
        };
        // local solar noon-ish for 74W
        let captured = Utc.with_ymd_and_hms(2026, 6, 21, 17, 0, 0).unwrap();

        let row = build_snapshot(&test_site(), &payload, captured);
        assert_eq!(row.condition, "rain");
        assert_eq!(row.temp_f, Some(71.4));
        let elevation = row.solar_elevation_deg.expect("elevation always computed");
        assert!(elevation > 60.0, "midsummer noon sun, got {elevation}");
        let lux = row.illuminance_est.expect("estimates present when cloud+uv known");
        assert!(lux > 0);
        assert!((row.visibility_mi.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn snapshot_from_empty_payload_is_unknown() {
        let row = build_snapshot(&test_site(), &ForecastResponse::default(), Utc::now());
        assert_eq!(row.condition, "unknown");
        assert!(row.temp_f.is_none());
        assert!(row.illuminance_est.is_none());
        // the astronomy needs no provider data
        assert!(row.solar_elevation_deg.is_some());
    }

    #[test]
    fn staleness_threshold_is_exclusive() {
        let captured = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap();
        let threshold = Duration::minutes(30);
        assert!(!is_stale(captured, captured + Duration::minutes(29), threshold));
        assert!(!is_stale(captured, captured + Duration::minutes(30), threshold));
        assert!(is_stale(captured, captured + Duration::minutes(31), threshold));
        // clock skew: a snapshot from the future is not stale
        assert!(!is_stale(captured, captured - Duration::minutes(5), threshold));
    }
}
