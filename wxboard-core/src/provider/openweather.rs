use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    cache::{Clock, TtlCache, WEATHER_TTL_SECS},
    classify::classify,
    config::ProviderConfig,
    error::{Result, WeatherError},
    model::{Coordinate, CurrentConditions, DataSource, ForecastDay, HourlyPoint, WeatherReport},
    normalize::{round_tenth, round_whole, sanitize, sanitize_opt, sanitize_text},
    provider::{ProviderId, get_json},
};

use super::WeatherSource;

/// The free forecast is 3-hourly, so eight entries cover a day.
const HOURLY_ENTRIES: usize = 8;

/// OpenWeather free tier: current conditions plus the 5-day / 3-hour forecast.
#[derive(Debug)]
pub struct OpenWeatherProvider {
    config: ProviderConfig,
    http: Client,
    cache: TtlCache<String, WeatherReport>,
}

impl OpenWeatherProvider {
    pub fn new(config: ProviderConfig, http: Client, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            http,
            cache: TtlCache::with_ttl_secs(WEATHER_TTL_SECS, clock),
        }
    }

    async fn fetch_report(&self, coord: Coordinate) -> Result<WeatherReport> {
        let api_key = self
            .config
            .usable_api_key()
            .ok_or(WeatherError::NotConfigured(ProviderId::OpenWeather))?;

        let cache_key = format!("openweather-{}", coord.cache_key());
        if let Some(hit) = self.cache.get(&cache_key) {
            tracing::debug!(key = %cache_key, "openweather cache hit");
            return Ok(hit);
        }

        let (lat, lon) = (coord.lat.to_string(), coord.lon.to_string());
        let params = [
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("appid", api_key),
            ("units", "metric"),
        ];

        let current_req = self.http.get(self.config.endpoint_url("current")).query(&params);
        let forecast_req = self.http.get(self.config.endpoint_url("forecast")).query(&params);

        let (current, forecast) = tokio::try_join!(
            get_json::<OwCurrentResponse>(ProviderId::OpenWeather, current_req),
            get_json::<OwForecastResponse>(ProviderId::OpenWeather, forecast_req),
        )?;

        if forecast.list.is_empty() {
            return Err(WeatherError::MissingData {
                provider: ProviderId::OpenWeather,
                detail: "forecast.list".to_string(),
            });
        }

        let report = WeatherReport {
            current: map_current(&current),
            forecast: daily_from_entries(&forecast.list),
            hourly: forecast.list.iter().take(HOURLY_ENTRIES).filter_map(map_hour).collect(),
            alerts: Vec::new(),
            source: DataSource::Live,
        };

        self.cache.insert(cache_key, report.clone());
        Ok(report)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherProvider {
    fn name(&self) -> &'static str {
        ProviderId::OpenWeather.as_str()
    }

    async fn fetch(&self, coord: Coordinate) -> Result<WeatherReport> {
        self.fetch_report(coord).await
    }
}

#[derive(Debug, Deserialize, Default)]
struct OwMain {
    temp: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize, Default)]
struct OwWind {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct OwPrecip {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    rain: OwPrecip,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    #[serde(default)]
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    /// Probability of precipitation, 0..1.
    pop: Option<f64>,
    #[serde(default)]
    rain: OwPrecip,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

fn first_description(weather: &[OwWeather]) -> Option<&str> {
    weather.first().map(|w| w.description.as_str())
}

fn map_current(parsed: &OwCurrentResponse) -> CurrentConditions {
    let temperature = sanitize(parsed.main.temp, 20.0);
    let text = first_description(&parsed.weather);

    CurrentConditions {
        temperature: round_whole(temperature),
        temperature_min: round_whole(sanitize(parsed.main.temp_min, temperature)),
        temperature_max: round_whole(sanitize(parsed.main.temp_max, temperature)),
        humidity: round_whole(sanitize(parsed.main.humidity, 60.0)),
        wind_speed: round_tenth(sanitize(parsed.wind.speed, 0.0)),
        wind_direction: round_whole(sanitize(parsed.wind.deg, 0.0)),
        pressure: round_whole(sanitize(parsed.main.pressure, 1013.0)),
        precipitation: round_tenth(sanitize(parsed.rain.one_hour, 0.0)),
        solar: 0.0,
        description: sanitize_text(text, "Unknown"),
        icon: classify(text.unwrap_or_default()),
    }
}

fn map_hour(entry: &OwForecastEntry) -> Option<HourlyPoint> {
    let start_time = DateTime::<Utc>::from_timestamp(entry.dt, 0)?.fixed_offset();
    Some(HourlyPoint {
        start_time,
        temperature: round_whole(sanitize(entry.main.temp, 0.0)),
        precipitation_probability: round_whole(sanitize(entry.pop, 0.0).clamp(0.0, 1.0) * 100.0),
        icon: classify(first_description(&entry.weather).unwrap_or_default()),
    })
}

#[derive(Debug, Default)]
struct DayAccumulator<'a> {
    low: Option<f64>,
    high: Option<f64>,
    precipitation: f64,
    /// (distance from 12:00 in hours, description)
    midday: Option<(u32, &'a str)>,
}

/// Fold 3-hourly entries into one record per UTC date.
fn daily_from_entries(entries: &[OwForecastEntry]) -> Vec<ForecastDay> {
    let mut days: BTreeMap<NaiveDate, DayAccumulator<'_>> = BTreeMap::new();

    for entry in entries {
        let Some(at) = DateTime::<Utc>::from_timestamp(entry.dt, 0) else {
            continue;
        };
        let acc = days.entry(at.date_naive()).or_default();

        if let Some(low) = sanitize_opt(entry.main.temp_min.or(entry.main.temp)) {
            acc.low = Some(acc.low.map_or(low, |l| l.min(low)));
        }
        if let Some(high) = sanitize_opt(entry.main.temp_max.or(entry.main.temp)) {
            acc.high = Some(acc.high.map_or(high, |h| h.max(high)));
        }
        acc.precipitation += sanitize(entry.rain.three_hours, 0.0);

        if let Some(text) = first_description(&entry.weather) {
            let distance = at.hour().abs_diff(12);
            if acc.midday.is_none_or(|(best, _)| distance < best) {
                acc.midday = Some((distance, text));
            }
        }
    }

    days.into_iter()
        .filter_map(|(date, acc)| {
            let (low, high) = (acc.low?, acc.high?);
            let text = acc.midday.map(|(_, t)| t);
            Some(ForecastDay {
                date,
                day: ForecastDay::weekday_label(date),
                temperature_min: round_whole(low),
                temperature_max: round_whole(high),
                description: sanitize_text(text, ""),
                icon: classify(text.unwrap_or_default()),
                precipitation: round_tenth(acc.precipitation),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Icon;

    // 2026-10-15T00:00:00Z
    const MIDNIGHT: i64 = 1_792_022_400;

    fn entry(
        offset_hours: i64,
        min: f64,
        max: f64,
        rain: Option<f64>,
        text: &str,
    ) -> serde_json::Value {
        let mut v = serde_json::json!({
            "dt": MIDNIGHT + offset_hours * 3600,
            "main": { "temp": (min + max) / 2.0, "temp_min": min, "temp_max": max },
            "weather": [ { "description": text } ],
            "pop": 0.35
        });
        if let Some(mm) = rain {
            v["rain"] = serde_json::json!({ "3h": mm });
        }
        v
    }

    fn forecast() -> OwForecastResponse {
        serde_json::from_value(serde_json::json!({
            "list": [
                entry(0, 9.0, 10.0, None, "clear sky"),
                entry(12, 14.0, 17.5, Some(0.4), "light rain"),
                entry(15, 13.0, 16.0, Some(1.0), "overcast clouds"),
                entry(24, 8.0, 9.0, None, "mist"),
            ]
        }))
        .expect("forecast should deserialize")
    }

    #[test]
    fn groups_entries_per_day() {
        let days = daily_from_entries(&forecast().list);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 10, 15).unwrap());
        assert_eq!(days[0].temperature_min, 9.0);
        assert_eq!(days[0].temperature_max, 18.0);
        assert_eq!(days[0].precipitation, 1.4);
        assert_eq!(days[0].description, "light rain");
        assert_eq!(days[0].icon, Icon::Rain);
        assert_eq!(days[1].icon, Icon::Fog);
    }

    #[test]
    fn hourly_probability_is_percent() {
        let parsed = forecast();
        let h = map_hour(&parsed.list[0]).expect("valid timestamp");
        assert_eq!(h.precipitation_probability, 35.0);
        assert_eq!(h.temperature, 10.0);
        assert_eq!(h.icon, Icon::Clear);
    }

    #[test]
    fn current_keeps_metric_wind() {
        let parsed: OwCurrentResponse = serde_json::from_value(serde_json::json!({
            "main": { "temp": 21.4, "temp_min": 19.0, "temp_max": 23.8, "humidity": 40, "pressure": 1009 },
            "weather": [ { "description": "scattered clouds" } ],
            "wind": { "speed": 4.12, "deg": 300 },
            "rain": { "1h": 0.26 }
        }))
        .unwrap();

        let c = map_current(&parsed);
        assert_eq!(c.temperature, 21.0);
        assert_eq!(c.temperature_max, 24.0);
        assert_eq!(c.wind_speed, 4.1);
        assert_eq!(c.precipitation, 0.3);
        assert_eq!(c.icon, Icon::PartlyCloudy);
    }
}
