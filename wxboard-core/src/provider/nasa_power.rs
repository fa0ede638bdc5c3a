//! NASA POWER daily point and climatology data.
//!
//! POWER has no real-time feed: daily values lag by a few days while the
//! satellite products are processed, and the series is not guaranteed to be
//! contiguous. "Current" therefore means the latest dated value present.
//! Every value may be a `-999` style sentinel.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{Datelike, Days, NaiveDate};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    cache::{Clock, TtlCache, WEATHER_TTL_SECS},
    classify::{describe, icon_for},
    config::ProviderConfig,
    error::Result,
    model::{Coordinate, CurrentConditions, ForecastDay},
    normalize::{kpa_to_hpa, round_tenth, round_whole, sanitize, sanitize_opt},
    provider::{ProviderId, get_json},
};

const DAILY_PARAMETERS: &str =
    "T2M,T2M_MIN,T2M_MAX,PRECTOTCORR,WS2M,WD2M,RH2M,PS,ALLSKY_SFC_SW_DWN";
const CLIMATOLOGY_PARAMETERS: &str = "T2M,T2M_MIN,T2M_MAX,PRECTOTCORR,WS2M,WD2M";
const FORECAST_DAYS: u64 = 7;
const BASELINE_TEMPERATURE: f64 = 20.0;

const MONTH_KEYS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// parameter -> (date or month key -> value)
type ParameterTable = BTreeMap<String, BTreeMap<String, Option<f64>>>;

#[derive(Debug, Deserialize)]
struct PowerResponse {
    properties: PowerProperties,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    #[serde(default)]
    parameter: ParameterTable,
}

#[derive(Debug)]
pub struct NasaPowerClient {
    config: ProviderConfig,
    http: Client,
    clock: Arc<dyn Clock>,
    current_cache: TtlCache<String, Option<CurrentConditions>>,
    forecast_cache: TtlCache<String, Vec<ForecastDay>>,
}

impl NasaPowerClient {
    pub fn new(config: ProviderConfig, http: Client, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            http,
            current_cache: TtlCache::with_ttl_secs(WEATHER_TTL_SECS, clock.clone()),
            forecast_cache: TtlCache::with_ttl_secs(WEATHER_TTL_SECS, clock.clone()),
            clock,
        }
    }

    /// Latest daily observation. `Ok(None)` when the series has no dated entry at all.
    pub async fn current(&self, coord: Coordinate) -> Result<Option<CurrentConditions>> {
        let cache_key = format!("nasa-current-{}", coord.cache_key());
        if let Some(hit) = self.current_cache.get(&cache_key) {
            tracing::debug!(key = %cache_key, "nasa current cache hit");
            return Ok(hit);
        }

        let today = self.clock.now().date_naive();
        let start = today.checked_sub_days(Days::new(1)).unwrap_or(today);
        let (start, end) = (compact_date(start), compact_date(today));
        let (lat, lon) = (coord.lat.to_string(), coord.lon.to_string());

        let request = self.http.get(self.config.endpoint_url("daily")).query(&[
            ("parameters", DAILY_PARAMETERS),
            ("community", "RE"),
            ("longitude", lon.as_str()),
            ("latitude", lat.as_str()),
            ("start", start.as_str()),
            ("end", end.as_str()),
            ("format", "JSON"),
        ]);

        let response: PowerResponse = get_json(ProviderId::NasaPower, request).await?;
        let current = current_from_table(&response.properties.parameter);

        self.current_cache.insert(cache_key, current.clone());
        Ok(current)
    }

    /// Seven days starting tomorrow, derived from long-term monthly means.
    pub async fn forecast(&self, coord: Coordinate) -> Result<Vec<ForecastDay>> {
        let cache_key = format!("nasa-forecast-{}", coord.cache_key());
        if let Some(hit) = self.forecast_cache.get(&cache_key) {
            tracing::debug!(key = %cache_key, "nasa forecast cache hit");
            return Ok(hit);
        }

        let (lat, lon) = (coord.lat.to_string(), coord.lon.to_string());
        let request = self
            .http
            .get(self.config.endpoint_url("climatology"))
            .query(&[
                ("parameters", CLIMATOLOGY_PARAMETERS),
                ("community", "RE"),
                ("longitude", lon.as_str()),
                ("latitude", lat.as_str()),
                ("format", "JSON"),
            ]);

        let response: PowerResponse = get_json(ProviderId::NasaPower, request).await?;
        let today = self.clock.now().date_naive();
        let forecast = forecast_from_climatology(&response.properties.parameter, today);

        self.forecast_cache.insert(cache_key, forecast.clone());
        Ok(forecast)
    }
}

/// `YYYYMMDD`, the only date format POWER accepts.
fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

fn value_at(table: &ParameterTable, parameter: &str, key: &str) -> Option<f64> {
    sanitize_opt(table.get(parameter)?.get(key).copied().flatten())
}

fn current_from_table(table: &ParameterTable) -> Option<CurrentConditions> {
    // YYYYMMDD keys sort chronologically
    let latest = table.get("T2M")?.keys().next_back()?;
    let at = |parameter: &str| value_at(table, parameter, latest);

    let t = at("T2M");
    let precip = at("PRECTOTCORR");
    let temperature = round_whole(t.unwrap_or(BASELINE_TEMPERATURE));

    Some(CurrentConditions {
        temperature,
        temperature_min: round_whole(at("T2M_MIN").unwrap_or((temperature - 5.0).max(-50.0))),
        temperature_max: round_whole(at("T2M_MAX").unwrap_or((temperature + 5.0).min(60.0))),
        humidity: round_whole(at("RH2M").unwrap_or(60.0)),
        // WS2M is already m/s
        wind_speed: round_tenth(at("WS2M").unwrap_or(5.0)),
        wind_direction: round_whole(at("WD2M").unwrap_or(180.0)),
        pressure: round_whole(at("PS").map(kpa_to_hpa).unwrap_or(1013.0)),
        precipitation: round_tenth(precip.unwrap_or(0.0)),
        solar: round_whole(at("ALLSKY_SFC_SW_DWN").unwrap_or(200.0)),
        description: describe(t.unwrap_or(temperature), precip.unwrap_or(0.0)).to_string(),
        icon: icon_for(t.unwrap_or(temperature), precip.unwrap_or(0.0)),
    })
}

fn forecast_from_climatology(table: &ParameterTable, today: NaiveDate) -> Vec<ForecastDay> {
    (1..=FORECAST_DAYS)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .map(|date| {
            let month = MONTH_KEYS[date.month0() as usize];
            let at = |parameter: &str| value_at(table, parameter, month);

            let mean = sanitize(at("T2M"), BASELINE_TEMPERATURE);
            let low = at("T2M_MIN").unwrap_or(mean - 5.0);
            let high = at("T2M_MAX").unwrap_or(mean + 5.0);
            let precip = at("PRECTOTCORR").unwrap_or(0.0);

            ForecastDay {
                date,
                day: ForecastDay::weekday_label(date),
                temperature_min: round_whole(low.min(high)),
                temperature_max: round_whole(low.max(high)),
                description: describe(mean, precip).to_string(),
                icon: icon_for(mean, precip),
                precipitation: round_tenth(precip),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Icon;

    fn table(json: serde_json::Value) -> ParameterTable {
        serde_json::from_value(json).expect("table should deserialize")
    }

    #[test]
    fn picks_latest_date_even_with_gaps() {
        let t = table(serde_json::json!({
            "T2M": { "20261009": 9.0, "20261013": 14.4 },
            "RH2M": { "20261009": 50.0, "20261013": 82.3 },
            "PS": { "20261013": 101.32 },
            "WS2M": { "20261013": 3.46 }
        }));

        let c = current_from_table(&t).expect("has dates");
        assert_eq!(c.temperature, 14.0);
        assert_eq!(c.humidity, 82.0);
        assert_eq!(c.pressure, 1013.0);
        assert_eq!(c.wind_speed, 3.5);
        assert_eq!(c.temperature_min, 9.0);
        assert_eq!(c.temperature_max, 19.0);
        assert_eq!(c.description, "Cool");
    }

    #[test]
    fn sentinels_take_fallbacks() {
        let t = table(serde_json::json!({
            "T2M": { "20261013": -999.0 },
            "RH2M": { "20261013": -999.0 },
            "PRECTOTCORR": { "20261013": -8888.0 },
            "ALLSKY_SFC_SW_DWN": { "20261013": null }
        }));

        let c = current_from_table(&t).expect("has dates");
        assert_eq!(c.temperature, 20.0);
        assert_eq!(c.humidity, 60.0);
        assert_eq!(c.precipitation, 0.0);
        assert_eq!(c.solar, 200.0);
        assert_eq!(c.wind_direction, 180.0);
    }

    #[test]
    fn no_dates_means_no_current() {
        assert!(current_from_table(&table(serde_json::json!({ "T2M": {} }))).is_none());
        assert!(current_from_table(&ParameterTable::new()).is_none());
    }

    #[test]
    fn climatology_forecast_uses_month_of_each_day() {
        let t = table(serde_json::json!({
            "T2M": { "OCT": 12.0, "NOV": 6.0 },
            "T2M_MIN": { "OCT": 7.6, "NOV": -999.0 },
            "T2M_MAX": { "OCT": 17.2 },
            "PRECTOTCORR": { "OCT": 2.8, "NOV": 0.3 }
        }));
        let today = NaiveDate::from_ymd_opt(2026, 10, 28).unwrap();

        let days = forecast_from_climatology(&t, today);
        assert_eq!(days.len(), 7);

        let oct = &days[0];
        assert_eq!(oct.date, NaiveDate::from_ymd_opt(2026, 10, 29).unwrap());
        assert_eq!((oct.temperature_min, oct.temperature_max), (8.0, 17.0));
        assert_eq!(oct.description, "Rain");
        assert_eq!(oct.icon, Icon::Rain);

        let nov = &days[6];
        assert_eq!(nov.date, NaiveDate::from_ymd_opt(2026, 11, 4).unwrap());
        assert_eq!((nov.temperature_min, nov.temperature_max), (1.0, 11.0));
        assert_eq!(nov.description, "Cool");
        assert_eq!(nov.precipitation, 0.3);
    }

    #[test]
    fn empty_climatology_uses_baseline() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let days = forecast_from_climatology(&ParameterTable::new(), today);

        assert!(days.iter().all(|d| d.temperature_min == 15.0 && d.temperature_max == 25.0));
    }

    #[test]
    fn compact_dates() {
        let d = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(compact_date(d), "20260105");
    }
}
