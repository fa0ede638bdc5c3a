//! Unit conversion and missing-data handling applied at the adapter boundary.
//!
//! NASA POWER marks gaps with large negative sentinels (`-999`, `-8888`);
//! other providers simply omit the field. Both collapse to `None` here.

/// Values at or below this threshold are provider "no data" sentinels.
pub const SENTINEL_THRESHOLD: f64 = -900.0;

/// Returns `value` unless it is absent or a sentinel, in which case `fallback`.
pub fn sanitize(value: Option<f64>, fallback: f64) -> f64 {
    sanitize_opt(value).unwrap_or(fallback)
}

/// Like [`sanitize`] but keeps the absence visible to the caller.
pub fn sanitize_opt(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > SENTINEL_THRESHOLD)
}

/// Text fields only have the "absent" form of missing data. Blank counts.
pub fn sanitize_text(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => fallback.to_string(),
    }
}

pub fn kph_to_mps(kph: f64) -> f64 {
    kph / 3.6
}

pub fn kpa_to_hpa(kpa: f64) -> f64 {
    kpa * 10.0
}

/// Whole degrees / percentages.
pub fn round_whole(x: f64) -> f64 {
    x.round()
}

/// One decimal place, used for wind speed and precipitation.
pub fn round_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
