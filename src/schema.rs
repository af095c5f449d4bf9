//! Handwritten Diesel schema declarations used by model structs.
//!
//! Migrations define the actual tables and constraints. This module only
//! provides `diesel::table!` declarations so we can derive Insertable/Queryable
//! in a type-safe way without running `diesel print-schema`.

diesel::table! {
    sites (id) {
        id -> BigInt,
        name -> Nullable<Text>,
        timezone -> Nullable<Text>,
        latitude -> Double,
        longitude -> Double,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

// Append-only log: one row per provider fetch, never updated
diesel::table! {
    weather_snapshots (id) {
        id -> BigInt,
        site_id -> BigInt,
        captured_at -> Timestamptz,
        temp_f -> Nullable<Double>,
        feels_like_f -> Nullable<Double>,
        humidity_pct -> Nullable<Double>,
        cloud_cover_pct -> Nullable<Double>,
        precipitation_in -> Nullable<Double>,
        uv_index -> Nullable<Double>,
        wind_speed_mph -> Nullable<Double>,
        wind_direction_deg -> Nullable<Double>,
        condition -> Text,
        illuminance_est -> Nullable<BigInt>,
        solar_elevation_deg -> Nullable<Double>,
        visibility_mi -> Nullable<Double>,
        forecast -> Nullable<Jsonb>,
    }
}

// Controller-reported state; consumers take the most recent row per site
diesel::table! {
    zone_thermal_state (id) {
        id -> BigInt,
        site_id -> BigInt,
        device_id -> Text,
        recorded_at -> Timestamptz,
        indoor_temp_f -> Nullable<Double>,
        indoor_humidity_pct -> Nullable<Double>,
        outdoor_temp_f -> Nullable<Double>,
        indoor_feels_like_f -> Nullable<Double>,
        temp_trend_f_per_min -> Nullable<Double>,
        occupancy_status -> Nullable<Text>,
        minutes_since_motion -> Nullable<Integer>,
    }
}

diesel::table! {
    zone_schedule_settings (id) {
        id -> BigInt,
        site_id -> BigInt,
        device_id -> Text,
        comfort_buffer_f -> Double,
        humidity_multiplier -> Double,
        min_lead_minutes -> Integer,
        max_lead_minutes -> Integer,
        ramp_rate_override -> Nullable<Double>,
        updated_at -> Timestamptz,
    }
}

// Maintained by an external aggregation job over past thermal recoveries
diesel::table! {
    ramp_rate_history (id) {
        id -> BigInt,
        device_id -> Text,
        mode -> Text,
        avg_rate_f_per_min -> Double,
        sample_count -> Integer,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    zone_opening_hours (id) {
        id -> BigInt,
        site_id -> BigInt,
        device_id -> Text,
        opening_minutes -> Integer,
        occupied_heat_f -> Double,
        occupied_cool_f -> Double,
        enabled -> Bool,
        updated_at -> Timestamptz,
    }
}

// One decision record per (device_id, calc_date); reruns overwrite
diesel::table! {
    smart_start_calculations (id) {
        id -> BigInt,
        site_id -> BigInt,
        device_id -> Text,
        calc_date -> Date,
        opening_minutes -> Integer,
        occupied_heat_f -> Double,
        occupied_cool_f -> Double,
        indoor_temp_f -> Double,
        outdoor_temp_f -> Nullable<Double>,
        indoor_humidity_pct -> Nullable<Double>,
        mode -> Text,
        target_temp_f -> Double,
        delta_needed_f -> Double,
        rate_used_f_per_min -> Double,
        rate_source -> Text,
        humidity_feels_offset_f -> Double,
        humidity_minutes_adjust -> Integer,
        occupancy_override -> Bool,
        base_lead_minutes -> Double,
        adjusted_lead_minutes -> Double,
        final_lead_minutes -> Integer,
        start_minutes -> Integer,
        confidence -> Text,
        hit_guardrail -> Bool,
        computed_at -> Timestamptz,
    }
}

diesel::joinable!(weather_snapshots -> sites (site_id));
diesel::joinable!(zone_thermal_state -> sites (site_id));
diesel::joinable!(zone_schedule_settings -> sites (site_id));
diesel::joinable!(zone_opening_hours -> sites (site_id));
diesel::joinable!(smart_start_calculations -> sites (site_id));

diesel::allow_tables_to_appear_in_same_query!(
    sites,
    weather_snapshots,
    zone_thermal_state,
    zone_schedule_settings,
    ramp_rate_history,
    zone_opening_hours,
    smart_start_calculations,
);
