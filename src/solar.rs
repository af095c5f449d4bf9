//! Solar position and ambient illuminance estimation.
//!
//! Pure functions, no I/O. The elevation angle feeds the illuminance
//! estimate, and both are recorded on every weather snapshot so lighting
//! logic downstream can consume them without redoing the astronomy.

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::f64::consts::PI;

const DEG: f64 = PI / 180.0;

/// Sun elevation angle in degrees for a coordinate pair at `at`, rounded to
/// one decimal. Negative values mean the sun is below the horizon.
///
/// Declination uses the standard annual cosine approximation; local solar
/// time is derived from the fractional UTC hour and longitude (15° per hour).
pub fn solar_elevation_deg(latitude: f64, longitude: f64, at: DateTime<Utc>) -> f64 {
    let doy = at.ordinal() as f64;
    let utc_hours = at.hour() as f64 + at.minute() as f64 / 60.0 + at.second() as f64 / 3600.0;

    let declination = -23.45 * ((360.0 / 365.0) * (doy + 10.0) * DEG).cos();

    let solar_time_hours = utc_hours + longitude / 15.0;
    let hour_angle = 15.0 * (solar_time_hours - 12.0);

    let sin_elevation = (latitude * DEG).sin() * (declination * DEG).sin()
        + (latitude * DEG).cos() * (declination * DEG).cos() * (hour_angle * DEG).cos();
    let elevation = sin_elevation.clamp(-1.0, 1.0).asin() / DEG;

    (elevation * 10.0).round() / 10.0
}

/// Estimated ambient illuminance (lux-equivalent) from cloud cover (0-100),
/// UV index and sun elevation.
///
/// Clear-sky base is piecewise linear across twilight/low/medium/high
/// elevation bands, then scaled down by cloud cover (full overcast retains
/// ~10% of the clear-sky value). A daytime UV index of exactly zero means
/// the sensor saturated under heavy cloud; the raw formula would overstate
/// brightness there, so 5% of the clear-sky base is reported instead.
pub fn estimate_illuminance(cloud_cover_pct: f64, uv_index: f64, elevation_deg: f64) -> i64 {
    if elevation_deg < -6.0 {
        return 0;
    }

    let base = if elevation_deg < -0.833 {
        // civil twilight band: 0 at -6deg up to 400 at sunrise/sunset
        400.0 * (elevation_deg + 6.0) / (6.0 - 0.833)
    } else if elevation_deg < 10.0 {
        let e = elevation_deg.max(0.0);
        400.0 + (10_000.0 - 400.0) * e / 10.0
    } else if elevation_deg < 30.0 {
        10_000.0 + (50_000.0 - 10_000.0) * (elevation_deg - 10.0) / 20.0
    } else {
        let e = elevation_deg.min(90.0);
        50_000.0 + (120_000.0 - 50_000.0) * (e - 30.0) / 60.0
    };

    if elevation_deg > 5.0 && uv_index == 0.0 {
        return (base * 0.05).round() as i64;
    }

    let cloud = cloud_cover_pct.clamp(0.0, 100.0);
    (base * (1.0 - (cloud / 100.0) * 0.9)).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn equator_equinox_noon_is_near_zenith() {
        let elevation = solar_elevation_deg(0.0, 0.0, at(2025, 3, 20, 12, 0));
        assert!(elevation > 80.0, "expected near-zenith sun, got {elevation}");
    }

    #[test]
    fn summer_solstice_noon_at_45n() {
        let elevation = solar_elevation_deg(45.0, 0.0, at(2025, 6, 21, 12, 0));
        assert!(
            elevation > 60.0 && elevation < 75.0,
            "expected ~68deg midsummer noon sun, got {elevation}"
        );
    }

    #[test]
    fn midnight_sun_is_below_horizon() {
        let elevation = solar_elevation_deg(40.0, 0.0, at(2025, 3, 20, 0, 0));
        assert!(elevation < 0.0, "expected sub-horizon sun, got {elevation}");
    }

    #[test]
    fn longitude_shifts_solar_noon() {
        // 90degW is six hours behind the prime meridian, so 18:00 UTC there
        // matches 12:00 UTC at Greenwich.
        let greenwich = solar_elevation_deg(40.0, 0.0, at(2025, 6, 21, 12, 0));
        let west = solar_elevation_deg(40.0, -90.0, at(2025, 6, 21, 18, 0));
        assert_eq!(greenwich, west);
    }

    #[test]
    fn elevation_is_rounded_to_one_decimal() {
        let elevation = solar_elevation_deg(51.5, -0.13, at(2025, 10, 3, 9, 17));
        assert!(((elevation * 10.0).round() - elevation * 10.0).abs() < 1e-9);
    }

    #[test]
    fn full_night_is_zero_lux() {
        assert_eq!(estimate_illuminance(0.0, 0.0, -6.1), 0);
        assert_eq!(estimate_illuminance(50.0, 0.0, -45.0), 0);
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(estimate_illuminance(0.0, 5.0, -0.833), 400);
        assert_eq!(estimate_illuminance(0.0, 5.0, 0.0), 400);
        assert_eq!(estimate_illuminance(0.0, 5.0, 10.0), 10_000);
        assert_eq!(estimate_illuminance(0.0, 5.0, 30.0), 50_000);
        assert_eq!(estimate_illuminance(0.0, 5.0, 90.0), 120_000);
        // elevation past vertical clamps at the 90deg value
        assert_eq!(estimate_illuminance(0.0, 5.0, 95.0), 120_000);
    }

    #[test]
    fn full_overcast_retains_a_tenth() {
        assert_eq!(estimate_illuminance(100.0, 5.0, 30.0), 5_000);
    }

    #[test]
    fn saturated_uv_sensor_reports_heavy_overcast() {
        // uv == 0 in daytime overrides the cloud correction entirely
        assert_eq!(estimate_illuminance(40.0, 0.0, 30.0), 2_500);
        // at or below 5deg elevation the override does not apply
        assert_eq!(
            estimate_illuminance(40.0, 0.0, 5.0),
            estimate_illuminance(40.0, 1.0, 5.0)
        );
    }

    #[test]
    fn monotone_non_increasing_in_cloud_cover() {
        for elevation in [-5.0, -0.5, 3.0, 5.5, 15.0, 45.0, 80.0] {
            for uv in [0.0, 2.5] {
                let mut last = i64::MAX;
                for cloud in 0..=20 {
                    let lux = estimate_illuminance(cloud as f64 * 5.0, uv, elevation);
                    assert!(
                        lux <= last,
                        "lux increased with cloud cover at elevation {elevation}, uv {uv}"
                    );
                    last = lux;
                }
            }
        }
    }
}
