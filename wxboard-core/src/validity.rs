//! Plausibility checks for provider output.

use std::ops::RangeInclusive;

use crate::model::{CurrentConditions, ForecastDay};

const CURRENT_TEMPERATURE: RangeInclusive<f64> = -80.0..=60.0;
const HUMIDITY: RangeInclusive<f64> = 0.0..=100.0;
/// m/s; generous enough for extreme storms, tight enough to catch km/h leaking through.
const WIND_SPEED: RangeInclusive<f64> = 0.0..=100.0;

const FORECAST_MIN_FLOOR: f64 = -100.0;
const FORECAST_MAX_CEILING: f64 = 70.0;
pub const MIN_FORECAST_DAYS: usize = 3;

fn within(value: f64, range: &RangeInclusive<f64>) -> bool {
    value.is_finite() && range.contains(&value)
}

pub fn is_valid_current(current: &CurrentConditions) -> bool {
    within(current.temperature, &CURRENT_TEMPERATURE)
        && within(current.humidity, &HUMIDITY)
        && within(current.wind_speed, &WIND_SPEED)
}

pub fn is_valid_forecast(forecast: &[ForecastDay]) -> bool {
    forecast.len() >= MIN_FORECAST_DAYS && forecast.iter().all(is_valid_day)
}

fn is_valid_day(day: &ForecastDay) -> bool {
    let (min, max) = (day.temperature_min, day.temperature_max);
    min.is_finite()
        && max.is_finite()
        && min >= FORECAST_MIN_FLOOR
        && max <= FORECAST_MAX_CEILING
        && max >= min
}
