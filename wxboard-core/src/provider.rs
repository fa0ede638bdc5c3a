use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug, time::Duration};

use crate::{
    config::HttpConfig,
    error::{Result, WeatherError},
    model::{Coordinate, WeatherReport},
};

pub mod nasa_earth;
pub mod nasa_power;
pub mod noaa;
pub mod nominatim;
pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    WeatherApi,
    OpenWeather,
    NasaPower,
    Noaa,
    NasaEarth,
    Nominatim,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::WeatherApi => "weatherapi",
            ProviderId::OpenWeather => "openweather",
            ProviderId::NasaPower => "nasa-power",
            ProviderId::Noaa => "noaa",
            ProviderId::NasaEarth => "nasa-earth",
            ProviderId::Nominatim => "nominatim",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[
            ProviderId::WeatherApi,
            ProviderId::OpenWeather,
            ProviderId::NasaPower,
            ProviderId::Noaa,
            ProviderId::NasaEarth,
            ProviderId::Nominatim,
        ]
    }

    /// Providers that refuse requests without an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(
            self,
            ProviderId::WeatherApi | ProviderId::OpenWeather | ProviderId::NasaEarth
        )
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        let lower = value.to_lowercase().replace('_', "-");

        match lower.as_str() {
            "weatherapi" => Ok(ProviderId::WeatherApi),
            "openweather" => Ok(ProviderId::OpenWeather),
            "nasa-power" => Ok(ProviderId::NasaPower),
            "noaa" => Ok(ProviderId::Noaa),
            "nasa-earth" => Ok(ProviderId::NasaEarth),
            "nominatim" => Ok(ProviderId::Nominatim),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: weatherapi, openweather, \
                 nasa-power, noaa, nasa-earth, nominatim."
            )),
        }
    }
}

/// One entry of the aggregator's fallback chain.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    async fn fetch(&self, coord: Coordinate) -> Result<WeatherReport>;
}

/// Shared client for every adapter of a service.
pub fn http_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(WeatherError::Client)
}

/// Send a request and decode a JSON body, attributing failures to `provider`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    provider: ProviderId,
    request: RequestBuilder,
) -> Result<T> {
    let res = request
        .send()
        .await
        .map_err(|source| WeatherError::Transport { provider, source })?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| WeatherError::Transport { provider, source })?;

    if !status.is_success() {
        return Err(WeatherError::Status {
            provider,
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    serde_json::from_str(&body).map_err(|source| WeatherError::Parse { provider, source })
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
