use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    cache::{Clock, TtlCache, WEATHER_TTL_SECS},
    classify::classify,
    config::ProviderConfig,
    error::{Result, WeatherError},
    model::{
        Coordinate, CurrentConditions, DataSource, ForecastDay, HourlyPoint, WeatherAlert,
        WeatherReport,
    },
    normalize::{kph_to_mps, round_tenth, round_whole, sanitize, sanitize_text},
    provider::{ProviderId, get_json},
};

use super::WeatherSource;

const FORECAST_DAYS: usize = 7;
const HOURLY_POINTS: usize = 24;

/// WeatherAPI.com: current, 7-day forecast, hourly and alerts in one request.
#[derive(Debug)]
pub struct WeatherApiProvider {
    config: ProviderConfig,
    http: Client,
    cache: TtlCache<String, WeatherReport>,
}

impl WeatherApiProvider {
    pub fn new(config: ProviderConfig, http: Client, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            http,
            cache: TtlCache::with_ttl_secs(WEATHER_TTL_SECS, clock),
        }
    }

    pub async fn fetch_combined(&self, coord: Coordinate) -> Result<WeatherReport> {
        let api_key = self
            .config
            .usable_api_key()
            .ok_or(WeatherError::NotConfigured(ProviderId::WeatherApi))?;

        let cache_key = format!("weatherapi-{}", coord.cache_key());
        if let Some(hit) = self.cache.get(&cache_key) {
            tracing::debug!(key = %cache_key, "weatherapi cache hit");
            return Ok(hit);
        }

        let q = format!("{},{}", coord.lat, coord.lon);
        let request = self.http.get(self.config.endpoint_url("forecast")).query(&[
            ("key", api_key),
            ("q", q.as_str()),
            ("days", "7"),
            ("aqi", "no"),
            ("alerts", "yes"),
        ]);

        let parsed: WaResponse = get_json(ProviderId::WeatherApi, request).await?;
        if parsed.forecast.forecastday.is_empty() {
            return Err(WeatherError::MissingData {
                provider: ProviderId::WeatherApi,
                detail: "forecast.forecastday".to_string(),
            });
        }
        let report = parsed.into_report();

        self.cache.insert(cache_key, report.clone());
        Ok(report)
    }
}

#[async_trait]
impl WeatherSource for WeatherApiProvider {
    fn name(&self) -> &'static str {
        ProviderId::WeatherApi.as_str()
    }

    async fn fetch(&self, coord: Coordinate) -> Result<WeatherReport> {
        self.fetch_combined(coord).await
    }
}

#[derive(Debug, Deserialize, Default)]
struct WaCondition {
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct WaCurrent {
    temp_c: Option<f64>,
    humidity: Option<f64>,
    wind_kph: Option<f64>,
    wind_degree: Option<f64>,
    pressure_mb: Option<f64>,
    precip_mm: Option<f64>,
    uv: Option<f64>,
    #[serde(default)]
    condition: WaCondition,
}

#[derive(Debug, Deserialize, Default)]
struct WaDay {
    maxtemp_c: Option<f64>,
    mintemp_c: Option<f64>,
    totalprecip_mm: Option<f64>,
    uv: Option<f64>,
    #[serde(default)]
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastHour {
    time_epoch: Option<i64>,
    time: Option<String>,
    temp_c: Option<f64>,
    chance_of_rain: Option<f64>,
    #[serde(default)]
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    #[serde(default)]
    day: WaDay,
    #[serde(default)]
    hour: Vec<WaForecastHour>,
}

#[derive(Debug, Deserialize, Default)]
struct WaForecast {
    #[serde(default)]
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaAlert {
    headline: Option<String>,
    event: Option<String>,
    severity: Option<String>,
    effective: Option<String>,
    expires: Option<String>,
    desc: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct WaAlerts {
    #[serde(default)]
    alert: Vec<WaAlert>,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    #[serde(default)]
    current: WaCurrent,
    #[serde(default)]
    forecast: WaForecast,
    #[serde(default)]
    alerts: WaAlerts,
}

impl WaResponse {
    fn into_report(self) -> WeatherReport {
        let today = self.forecast.forecastday.first();
        let current = map_current(&self.current, today.map(|d| &d.day));

        let hourly = today
            .map(|d| d.hour.iter().take(HOURLY_POINTS).filter_map(map_hour).collect())
            .unwrap_or_default();

        let forecast = self
            .forecast
            .forecastday
            .iter()
            .take(FORECAST_DAYS)
            .map(map_day)
            .collect();

        let alerts = self.alerts.alert.into_iter().map(map_alert).collect();

        WeatherReport {
            current,
            forecast,
            hourly,
            alerts,
            source: DataSource::Live,
        }
    }
}

fn map_current(current: &WaCurrent, today: Option<&WaDay>) -> CurrentConditions {
    let temperature = sanitize(current.temp_c, 20.0);
    let text = current.condition.text.as_deref();

    CurrentConditions {
        temperature: round_whole(temperature),
        temperature_min: round_whole(sanitize(today.and_then(|d| d.mintemp_c), temperature)),
        temperature_max: round_whole(sanitize(today.and_then(|d| d.maxtemp_c), temperature)),
        humidity: round_whole(sanitize(current.humidity, 60.0)),
        wind_speed: round_tenth(kph_to_mps(sanitize(current.wind_kph, 0.0))),
        wind_direction: round_whole(sanitize(current.wind_degree, 0.0)),
        pressure: round_whole(sanitize(current.pressure_mb, 1013.0)),
        precipitation: round_tenth(sanitize(current.precip_mm, 0.0)),
        // UV index stands in for irradiance
        solar: round_whole(sanitize(current.uv.or(today.and_then(|d| d.uv)), 0.0)),
        description: sanitize_text(text, "Unknown"),
        icon: classify(text.unwrap_or_default()),
    }
}

fn map_day(fd: &WaForecastDay) -> ForecastDay {
    let text = fd.day.condition.text.as_deref();
    ForecastDay {
        date: fd.date,
        day: ForecastDay::weekday_label(fd.date),
        temperature_min: round_whole(sanitize(fd.day.mintemp_c, 0.0)),
        temperature_max: round_whole(sanitize(fd.day.maxtemp_c, 0.0)),
        description: sanitize_text(text, ""),
        icon: classify(text.unwrap_or_default()),
        precipitation: round_tenth(sanitize(fd.day.totalprecip_mm, 0.0)),
    }
}

fn map_hour(h: &WaForecastHour) -> Option<HourlyPoint> {
    let start_time = h
        .time_epoch
        .and_then(epoch_to_fixed)
        .or_else(|| h.time.as_deref().and_then(parse_local_time))?;

    Some(HourlyPoint {
        start_time,
        temperature: round_whole(sanitize(h.temp_c, 0.0)),
        precipitation_probability: round_whole(sanitize(h.chance_of_rain, 0.0).clamp(0.0, 100.0)),
        icon: classify(h.condition.text.as_deref().unwrap_or_default()),
    })
}

fn map_alert(a: WaAlert) -> WeatherAlert {
    WeatherAlert {
        headline: a
            .headline
            .or_else(|| a.event.clone())
            .unwrap_or_else(|| "Weather alert".to_string()),
        event: a.event,
        severity: a.severity,
        effective: a.effective,
        expires: a.expires,
        description: a.desc,
    }
}

fn epoch_to_fixed(ts: i64) -> Option<DateTime<FixedOffset>> {
    Utc.timestamp_opt(ts, 0).single().map(|dt| dt.fixed_offset())
}

/// "2026-10-15 13:00" without zone information; read as UTC.
fn parse_local_time(s: &str) -> Option<DateTime<FixedOffset>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Icon;

    fn sample() -> WaResponse {
        serde_json::from_value(serde_json::json!({
            "current": {
                "temp_c": 17.6,
                "humidity": 71,
                "wind_kph": 20.0,
                "wind_degree": 235,
                "pressure_mb": 1016.4,
                "precip_mm": 0.04,
                "uv": 3.0,
                "condition": { "text": "Partly cloudy" }
            },
            "forecast": {
                "forecastday": [
                    {
                        "date": "2026-10-15",
                        "day": {
                            "maxtemp_c": 19.4, "mintemp_c": 11.2, "totalprecip_mm": 1.26,
                            "uv": 4.0, "condition": { "text": "Patchy rain nearby" }
                        },
                        "hour": [
                            { "time_epoch": 1792022400, "time": "2026-10-15 00:00", "temp_c": 12.4,
                              "chance_of_rain": 64, "condition": { "text": "Light drizzle" } },
                            { "time": "2026-10-15 01:00", "temp_c": 12.1,
                              "chance_of_rain": 0, "condition": { "text": "Clear" } },
                            { "temp_c": 11.8 }
                        ]
                    },
                    {
                        "date": "2026-10-16",
                        "day": { "maxtemp_c": 21.0, "mintemp_c": 13.0, "condition": { "text": "Sunny" } }
                    }
                ]
            },
            "alerts": {
                "alert": [
                    { "headline": "Coastal Flood Advisory", "severity": "Moderate", "desc": "Minor flooding" }
                ]
            }
        }))
        .expect("sample should deserialize")
    }

    #[test]
    fn maps_current_with_unit_conversion() {
        let report = sample().into_report();
        let c = &report.current;

        assert_eq!(c.temperature, 18.0);
        assert_eq!(c.temperature_min, 11.0);
        assert_eq!(c.temperature_max, 19.0);
        assert_eq!(c.humidity, 71.0);
        assert_eq!(c.wind_speed, 5.6);
        assert_eq!(c.wind_direction, 235.0);
        assert_eq!(c.pressure, 1016.0);
        assert_eq!(c.precipitation, 0.0);
        assert_eq!(c.solar, 3.0);
        assert_eq!(c.icon, Icon::PartlyCloudy);
        assert_eq!(report.source, DataSource::Live);
    }

    #[test]
    fn uv_proxy_is_rounded() {
        let current = WaCurrent {
            uv: Some(4.6),
            ..WaCurrent::default()
        };
        assert_eq!(map_current(&current, None).solar, 5.0);

        let day = WaDay {
            uv: Some(2.2),
            ..WaDay::default()
        };
        assert_eq!(map_current(&WaCurrent::default(), Some(&day)).solar, 2.0);
    }

    #[test]
    fn maps_forecast_days() {
        let report = sample().into_report();

        assert_eq!(report.forecast.len(), 2);
        let first = &report.forecast[0];
        assert_eq!(first.day, "Thu");
        assert_eq!(first.temperature_min, 11.0);
        assert_eq!(first.temperature_max, 19.0);
        assert_eq!(first.precipitation, 1.3);
        assert_eq!(first.icon, Icon::Rain);
        assert_eq!(report.forecast[1].icon, Icon::Clear);
        assert_eq!(report.forecast[1].precipitation, 0.0);
    }

    #[test]
    fn maps_hourly_and_skips_untimed_hours() {
        let report = sample().into_report();

        assert_eq!(report.hourly.len(), 2);
        assert_eq!(report.hourly[0].start_time.timestamp(), 1_792_022_400);
        assert_eq!(report.hourly[0].precipitation_probability, 64.0);
        assert_eq!(report.hourly[0].icon, Icon::Rain);
        assert_eq!(report.hourly[1].start_time.to_rfc3339(), "2026-10-15T01:00:00+00:00");
    }

    #[test]
    fn maps_alerts() {
        let report = sample().into_report();
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].headline, "Coastal Flood Advisory");
        assert_eq!(report.alerts[0].severity.as_deref(), Some("Moderate"));
    }

    #[test]
    fn empty_payload_uses_fallbacks() {
        let parsed: WaResponse = serde_json::from_str("{}").unwrap();
        let report = parsed.into_report();

        assert_eq!(report.current.temperature, 20.0);
        assert_eq!(report.current.humidity, 60.0);
        assert_eq!(report.current.pressure, 1013.0);
        assert_eq!(report.current.description, "Unknown");
        assert!(report.forecast.is_empty());
        assert!(report.hourly.is_empty());
    }
}
