//! NASA Earth imagery (Landsat 8 derived) and asset listings.
//!
//! All entry points degrade instead of failing: an unconfigured key or a
//! failed request is logged and reported as `None` / `false`.

use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    cache::{Clock, IMAGERY_TTL_SECS, TtlCache},
    config::{Config, ProviderConfig},
    error::{Result, WeatherError},
    model::{Coordinate, EarthImage},
    provider::{ProviderId, get_json, http_client},
};

/// Side of the bounding box around the point, in degrees (~15 km).
const IMAGE_DIM_DEGREES: &str = "0.15";
const ASSETS_BEGIN: &str = "2018-01-01";

/// Canary used to check credentials: Johnson Space Center on a date with known coverage.
const CANARY_LAT: &str = "29.78";
const CANARY_LON: &str = "-95.33";
const CANARY_DATE: &str = "2020-01-01";
const CANARY_DIM: &str = "0.1";

#[derive(Debug, Deserialize)]
struct AssetsResponse {
    results: Option<Vec<Asset>>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    date: String,
}

#[derive(Debug)]
pub struct ImageryService {
    config: ProviderConfig,
    http: Client,
    clock: Arc<dyn Clock>,
    image_cache: TtlCache<String, EarthImage>,
    assets_cache: TtlCache<String, Vec<String>>,
}

impl ImageryService {
    pub fn new(config: ProviderConfig, http: Client, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            http,
            image_cache: TtlCache::with_ttl_secs(IMAGERY_TTL_SECS, clock.clone()),
            assets_cache: TtlCache::with_ttl_secs(IMAGERY_TTL_SECS, clock.clone()),
            clock,
        }
    }

    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let http = http_client(&config.http)?;
        Ok(Self::new(config.nasa_earth.clone(), http, clock))
    }

    fn api_key(&self) -> Option<&str> {
        let key = self.config.usable_api_key();
        if key.is_none() {
            tracing::warn!("NASA Earth API key not configured");
        }
        key
    }

    /// Image covering `coord` on `date` (today when absent).
    pub async fn get_earth_imagery(
        &self,
        coord: Coordinate,
        date: Option<NaiveDate>,
    ) -> Option<EarthImage> {
        let api_key = self.api_key()?;

        let cache_key = match date {
            Some(d) => format!("earth-image-{}-{d}", coord.cache_key()),
            None => format!("earth-image-{}-latest", coord.cache_key()),
        };
        if let Some(hit) = self.image_cache.get(&cache_key) {
            tracing::debug!(key = %cache_key, "imagery cache hit");
            return Some(hit);
        }

        let date = date.unwrap_or_else(|| self.clock.now().date_naive());
        match self.fetch_image(api_key, coord, date).await {
            Ok(image) => {
                self.image_cache.insert(cache_key, image.clone());
                Some(image)
            }
            Err(e) => {
                tracing::warn!(error = %e, "NASA Earth imagery request failed");
                None
            }
        }
    }

    async fn fetch_image(
        &self,
        api_key: &str,
        coord: Coordinate,
        date: NaiveDate,
    ) -> Result<EarthImage> {
        let (lat, lon, day) = (
            coord.lat.to_string(),
            coord.lon.to_string(),
            date.to_string(),
        );
        let res = self
            .http
            .get(self.config.endpoint_url("imagery"))
            .query(&[
                ("lon", lon.as_str()),
                ("lat", lat.as_str()),
                ("date", day.as_str()),
                ("dim", IMAGE_DIM_DEGREES),
                ("api_key", api_key),
            ])
            .send()
            .await
            .map_err(|source| WeatherError::Transport {
                provider: ProviderId::NasaEarth,
                source,
            })?;

        if res.status() != StatusCode::OK {
            return Err(WeatherError::Status {
                provider: ProviderId::NasaEarth,
                status: res.status().as_u16(),
                body: String::new(),
            });
        }

        // The body is the image itself; consumers load it from the final URL.
        Ok(EarthImage {
            image_url: res.url().to_string(),
            date,
            coordinates: coord,
        })
    }

    /// Dates with imagery since 2018, newest first. `None` when unavailable.
    pub async fn get_available_dates(&self, coord: Coordinate) -> Option<Vec<String>> {
        let api_key = self.api_key()?;

        let cache_key = format!("earth-assets-{}", coord.cache_key());
        if let Some(hit) = self.assets_cache.get(&cache_key) {
            tracing::debug!(key = %cache_key, "assets cache hit");
            return Some(hit);
        }

        let (lat, lon) = (coord.lat.to_string(), coord.lon.to_string());
        let request = self.http.get(self.config.endpoint_url("assets")).query(&[
            ("lon", lon.as_str()),
            ("lat", lat.as_str()),
            ("begin", ASSETS_BEGIN),
            ("api_key", api_key),
        ]);

        match get_json::<AssetsResponse>(ProviderId::NasaEarth, request).await {
            Ok(AssetsResponse { results: Some(assets) }) => {
                let dates = newest_first(assets.into_iter().map(|a| a.date).collect());
                self.assets_cache.insert(cache_key, dates.clone());
                Some(dates)
            }
            Ok(AssetsResponse { results: None }) => Some(Vec::new()),
            Err(e) => {
                tracing::warn!(error = %e, "NASA Earth assets request failed");
                None
            }
        }
    }

    /// Issues the canary request; only an HTTP 200 counts as valid.
    pub async fn is_api_key_valid(&self) -> bool {
        let Some(api_key) = self.config.usable_api_key() else {
            return false;
        };

        let result = self
            .http
            .get(self.config.endpoint_url("imagery"))
            .query(&[
                ("lon", CANARY_LON),
                ("lat", CANARY_LAT),
                ("date", CANARY_DATE),
                ("dim", CANARY_DIM),
                ("api_key", api_key),
            ])
            .send()
            .await;

        match result {
            Ok(res) => res.status() == StatusCode::OK,
            Err(e) => {
                tracing::warn!(error = %e, "NASA API key validation failed");
                false
            }
        }
    }
}

/// Asset dates are ISO-8601 strings, so lexical order is chronological.
fn newest_first(mut dates: Vec<String>) -> Vec<String> {
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_dates_newest_first() {
        let dates = newest_first(vec![
            "2019-03-02T15:57:12.000000".into(),
            "2021-07-11T16:01:44.000000".into(),
            "2018-01-05T15:58:00.000000".into(),
        ]);
        assert_eq!(dates[0], "2021-07-11T16:01:44.000000");
        assert_eq!(dates[2], "2018-01-05T15:58:00.000000");
    }

    #[test]
    fn assets_without_results_field() {
        let parsed: AssetsResponse = serde_json::from_str(r#"{"count": 0}"#).unwrap();
        assert!(parsed.results.is_none());
    }
}
