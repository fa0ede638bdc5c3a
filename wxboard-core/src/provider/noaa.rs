//! US National Weather Service (api.weather.gov).
//!
//! Resolution is two-step: `/points/{lat},{lon}` names the forecast office
//! grid cell and hands back the forecast URLs, which are followed verbatim.
//! Only US territory is covered; elsewhere the points call returns 404.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use reqwest::{
    Client, RequestBuilder,
    header::{ACCEPT, USER_AGENT},
};
use serde::{Deserialize, Serialize};

use crate::{
    cache::{Clock, TtlCache, WEATHER_TTL_SECS},
    classify::classify,
    config::ProviderConfig,
    error::Result,
    model::{Coordinate, HourlyPoint},
    normalize::{round_whole, sanitize},
    provider::{ProviderId, get_json},
};

const HOURLY_PERIODS: usize = 24;
const ACCEPT_LD_JSON: &str = "application/ld+json";

/// The API answers either as GeoJSON (payload under `properties`) or, when
/// asked for JSON-LD, with the payload flattened into the top level.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Document<T> {
    GeoJson { properties: T },
    Flat(T),
}

impl<T> Document<T> {
    fn into_inner(self) -> T {
        match self {
            Document::GeoJson { properties } => properties,
            Document::Flat(inner) => inner,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointProperties {
    forecast: String,
    forecast_hourly: String,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    periods: Vec<NoaaPeriod>,
}

/// NWS sometimes reports temperature as a bare number, sometimes as a
/// quantitative value object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NoaaTemperature {
    Value(f64),
    Quantity { value: Option<f64> },
}

impl NoaaTemperature {
    pub fn value(&self) -> Option<f64> {
        match self {
            NoaaTemperature::Value(v) => Some(*v),
            NoaaTemperature::Quantity { value } => *value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoaaQuantity {
    pub value: Option<f64>,
    #[serde(default)]
    pub unit_code: Option<String>,
}

/// One forecast period in the service's own shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoaaPeriod {
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub name: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    #[serde(default)]
    pub is_daytime: bool,
    pub temperature: Option<NoaaTemperature>,
    #[serde(default)]
    pub temperature_unit: Option<String>,
    #[serde(default)]
    pub probability_of_precipitation: Option<NoaaQuantity>,
    #[serde(default)]
    pub wind_speed: Option<String>,
    #[serde(default)]
    pub wind_direction: Option<String>,
    #[serde(default)]
    pub short_forecast: String,
    #[serde(default)]
    pub detailed_forecast: String,
}

impl NoaaPeriod {
    pub fn to_hourly_point(&self) -> HourlyPoint {
        let temperature = self.temperature.as_ref().and_then(NoaaTemperature::value);
        let probability = self
            .probability_of_precipitation
            .as_ref()
            .and_then(|p| p.value);

        HourlyPoint {
            start_time: self.start_time,
            temperature: round_whole(sanitize(temperature, 0.0)),
            precipitation_probability: round_whole(sanitize(probability, 0.0).clamp(0.0, 100.0)),
            icon: classify(&self.short_forecast),
        }
    }
}

/// Everything one NOAA resolution yields, not yet unit-normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct NoaaBundle {
    pub current: Option<NoaaPeriod>,
    pub forecast: Vec<NoaaPeriod>,
    pub hourly: Vec<NoaaPeriod>,
}

impl NoaaBundle {
    pub fn hourly_points(&self) -> Vec<HourlyPoint> {
        self.hourly.iter().map(NoaaPeriod::to_hourly_point).collect()
    }
}

#[derive(Debug)]
pub struct NoaaClient {
    config: ProviderConfig,
    http: Client,
    user_agent: String,
    cache: TtlCache<String, NoaaBundle>,
}

impl NoaaClient {
    pub fn new(
        config: ProviderConfig,
        http: Client,
        user_agent: String,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            http,
            user_agent,
            cache: TtlCache::with_ttl_secs(WEATHER_TTL_SECS, clock),
        }
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.http
            .get(url)
            .header(USER_AGENT, self.user_agent.as_str())
            .header(ACCEPT, ACCEPT_LD_JSON)
    }

    pub async fn fetch(&self, coord: Coordinate) -> Result<NoaaBundle> {
        let cache_key = format!("noaa-{}", coord.cache_key());
        if let Some(hit) = self.cache.get(&cache_key) {
            tracing::debug!(key = %cache_key, "noaa cache hit");
            return Ok(hit);
        }

        // NWS redirects anything more precise than four decimals
        let points_url = format!(
            "{}/{:.4},{:.4}",
            self.config.endpoint_url("points"),
            coord.lat,
            coord.lon
        );
        let points: Document<PointProperties> =
            get_json(ProviderId::Noaa, self.get(&points_url)).await?;
        let points = points.into_inner();

        let forecast_req = self.get(&points.forecast).query(&[("units", "si")]);
        let hourly_req = self.get(&points.forecast_hourly).query(&[("units", "si")]);

        let (forecast, hourly) = tokio::try_join!(
            get_json::<Document<ForecastProperties>>(ProviderId::Noaa, forecast_req),
            get_json::<Document<ForecastProperties>>(ProviderId::Noaa, hourly_req),
        )?;

        let forecast = forecast.into_inner().periods;
        let hourly_periods = hourly.into_inner().periods;

        let bundle = NoaaBundle {
            current: hourly_periods.first().cloned(),
            forecast,
            hourly: hourly_periods.into_iter().take(HOURLY_PERIODS).collect(),
        };

        self.cache.insert(cache_key, bundle.clone());
        Ok(bundle)
    }
}
