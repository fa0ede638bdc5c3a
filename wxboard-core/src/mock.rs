//! Static payload served when every provider has failed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};

use crate::{
    cache::Clock,
    classify::Icon,
    error::Result,
    model::{Coordinate, CurrentConditions, DataSource, ForecastDay, WeatherReport},
    provider::WeatherSource,
};

pub const FORECAST_DAYS: u64 = 7;

pub fn current() -> CurrentConditions {
    CurrentConditions {
        temperature: 22.0,
        temperature_min: 18.0,
        temperature_max: 26.0,
        humidity: 65.0,
        wind_speed: 12.0,
        wind_direction: 180.0,
        pressure: 1013.0,
        precipitation: 0.0,
        solar: 250.0,
        description: "Partly Cloudy".to_string(),
        icon: Icon::PartlyCloudy,
    }
}

/// Seven days starting the day after `today`.
pub fn forecast(today: NaiveDate) -> Vec<ForecastDay> {
    (1..=FORECAST_DAYS)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .map(|date| ForecastDay {
            date,
            day: ForecastDay::weekday_label(date),
            temperature_min: 18.0,
            temperature_max: 26.0,
            description: "Partly Cloudy".to_string(),
            icon: Icon::PartlyCloudy,
            precipitation: 0.0,
        })
        .collect()
}

pub fn report(today: NaiveDate) -> WeatherReport {
    WeatherReport {
        current: current(),
        forecast: forecast(today),
        hourly: Vec::new(),
        alerts: Vec::new(),
        source: DataSource::Mock,
    }
}

/// Terminal element of every fallback chain; never fails.
#[derive(Debug, Clone)]
pub struct MockSource {
    clock: Arc<dyn Clock>,
}

impl MockSource {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn report(&self) -> WeatherReport {
        report(self.clock.now().date_naive())
    }
}

#[async_trait]
impl WeatherSource for MockSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch(&self, _coord: Coordinate) -> Result<WeatherReport> {
        Ok(self.report())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validity::{is_valid_current, is_valid_forecast};

    #[test]
    fn mock_report_is_valid() {
        let today = NaiveDate::from_ymd_opt(2026, 12, 28).unwrap();
        let report = report(today);

        assert_eq!(report.source, DataSource::Mock);
        assert!(is_valid_current(&report.current));
        assert!(is_valid_forecast(&report.forecast));
        assert!(report.hourly.is_empty());
    }

    #[test]
    fn forecast_starts_tomorrow_and_crosses_year_end() {
        let today = NaiveDate::from_ymd_opt(2026, 12, 28).unwrap();
        let days = forecast(today);

        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 12, 29).unwrap());
        assert_eq!(days[6].date, NaiveDate::from_ymd_opt(2027, 1, 4).unwrap());
    }

    #[test]
    fn mock_current_matches_documented_values() {
        let c = current();
        assert_eq!(c.temperature, 22.0);
        assert_eq!(c.humidity, 65.0);
        assert_eq!(c.description, "Partly Cloudy");
        assert_eq!(c.icon.glyph(), "⛅");
    }
}
