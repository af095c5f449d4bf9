use serde::Serialize;

/// Serialize a serde-backed enum into its string name (e.g. snake_case).
pub fn serde_enum_name<T: Serialize>(val: &T) -> Option<String> {
    serde_json::to_value(val).ok()?.as_str().map(|s| s.to_string())
}

/// Render minutes-from-midnight as HH:MM for log lines. Values outside a
/// single day (a lead time larger than the opening time) wrap into the
/// previous/next day.
pub fn format_minutes_of_day(minutes: i32) -> String {
    let wrapped = minutes.rem_euclid(24 * 60);
    format!("{:02}:{:02}", wrapped / 60, wrapped % 60)
}
