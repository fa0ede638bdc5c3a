//! Provider selection and fallback.
//!
//! The aggregator walks an ordered list of [`WeatherSource`]s and returns the
//! first result that passes the validity guard. A [`MockSource`] always sits
//! at the end, so callers get a well-formed envelope no matter what failed.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    cache::{Clock, SystemClock},
    config::Config,
    error::Result,
    mock::{self, MockSource},
    model::{Coordinate, DataSource, Location, WeatherEnvelope, WeatherReport},
    provider::{
        ProviderId, WeatherSource, http_client,
        nasa_power::NasaPowerClient,
        noaa::NoaaClient,
        nominatim::Geocoder,
        openweather::OpenWeatherProvider,
        weatherapi::WeatherApiProvider,
    },
    validity::{is_valid_current, is_valid_forecast},
};

/// Keyless fallback: NASA POWER for current and forecast, NOAA for hourly.
///
/// NASA current and NOAA are fetched together, then the NASA forecast.
/// Fails only when both of the first two fail; any substituted part marks
/// the report as degraded.
#[derive(Debug)]
pub struct NasaNoaaSource {
    nasa: NasaPowerClient,
    noaa: NoaaClient,
    clock: Arc<dyn Clock>,
}

impl NasaNoaaSource {
    pub fn new(nasa: NasaPowerClient, noaa: NoaaClient, clock: Arc<dyn Clock>) -> Self {
        Self { nasa, noaa, clock }
    }
}

#[async_trait]
impl WeatherSource for NasaNoaaSource {
    fn name(&self) -> &'static str {
        "nasa-power+noaa"
    }

    async fn fetch(&self, coord: Coordinate) -> Result<WeatherReport> {
        let (current, noaa) = tokio::join!(self.nasa.current(coord), self.noaa.fetch(coord));

        let (current, noaa) = match (current, noaa) {
            (Err(nasa_err), Err(noaa_err)) => {
                tracing::warn!(error = %noaa_err, "NOAA request failed");
                return Err(nasa_err);
            }
            pair => pair,
        };

        let mut degraded = false;
        let today = self.clock.now().date_naive();

        let current = match current {
            Ok(Some(c)) => c,
            Ok(None) => {
                tracing::warn!("NASA POWER returned no dated values, using mock current");
                degraded = true;
                mock::current()
            }
            Err(e) => {
                tracing::warn!(error = %e, "NASA POWER current request failed");
                degraded = true;
                mock::current()
            }
        };

        let hourly = match noaa {
            Ok(bundle) if bundle.hourly.is_empty() => {
                tracing::warn!("NOAA returned no hourly periods");
                degraded = true;
                Vec::new()
            }
            Ok(bundle) => bundle.hourly_points(),
            Err(e) => {
                tracing::warn!(error = %e, "NOAA request failed");
                degraded = true;
                Vec::new()
            }
        };

        let forecast = match self.nasa.forecast(coord).await {
            Ok(days) => days,
            Err(e) => {
                tracing::warn!(error = %e, "NASA POWER climatology request failed");
                degraded = true;
                mock::forecast(today)
            }
        };

        Ok(WeatherReport {
            current,
            forecast,
            hourly,
            alerts: Vec::new(),
            source: if degraded {
                DataSource::Degraded
            } else {
                DataSource::Live
            },
        })
    }
}

/// Entry point for weather consumers. Build once and share by reference.
#[derive(Debug)]
pub struct WeatherService {
    sources: Vec<Box<dyn WeatherSource>>,
    fallback: MockSource,
    geocoder: Geocoder,
}

impl WeatherService {
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Default chain: WeatherAPI alone when it is configured, else OpenWeather
    /// when that is, else the keyless NASA+NOAA composite.
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let http = http_client(&config.http)?;

        let mut sources: Vec<Box<dyn WeatherSource>> = Vec::new();
        if config.is_provider_configured(ProviderId::WeatherApi) {
            sources.push(Box::new(WeatherApiProvider::new(
                config.weatherapi.clone(),
                http.clone(),
                clock.clone(),
            )));
        } else if config.is_provider_configured(ProviderId::OpenWeather) {
            sources.push(Box::new(OpenWeatherProvider::new(
                config.openweather.clone(),
                http.clone(),
                clock.clone(),
            )));
        } else {
            sources.push(Box::new(NasaNoaaSource::new(
                NasaPowerClient::new(config.nasa_power.clone(), http.clone(), clock.clone()),
                NoaaClient::new(
                    config.noaa.clone(),
                    http.clone(),
                    config.http.user_agent.clone(),
                    clock.clone(),
                ),
                clock.clone(),
            )));
        }

        let geocoder = Geocoder::new(config.geocoding.clone(), http);
        Ok(Self::with_sources(sources, geocoder, clock))
    }

    pub fn with_sources(
        sources: Vec<Box<dyn WeatherSource>>,
        geocoder: Geocoder,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sources,
            fallback: MockSource::new(clock),
            geocoder,
        }
    }

    /// Names of the chain in the order they are tried, mock last.
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources
            .iter()
            .map(|s| s.name())
            .chain(std::iter::once(self.fallback.name()))
            .collect()
    }

    /// Weather for a point. Never fails: the last resort is the mock payload.
    pub async fn get_weather_data(
        &self,
        lat: f64,
        lon: f64,
        location: Option<Location>,
    ) -> WeatherEnvelope {
        let coord = match Coordinate::new(lat, lon) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "rejecting coordinate, serving mock data");
                let label = Location {
                    lat,
                    lon,
                    name: format!("{lat:.2}, {lon:.2}"),
                    country: None,
                    state: None,
                };
                let location = location.unwrap_or(label);
                return WeatherEnvelope::from_report(location, self.fallback.report());
            }
        };
        let location = location.unwrap_or_else(|| Location::approximate(coord));

        for source in &self.sources {
            match source.fetch(coord).await {
                Ok(report) if is_plausible(&report) => {
                    tracing::info!(
                        source = source.name(),
                        outcome = ?report.source,
                        "weather fetched"
                    );
                    return WeatherEnvelope::from_report(location, report);
                }
                Ok(_) => {
                    tracing::warn!(
                        source = source.name(),
                        "implausible weather data, trying next source"
                    );
                }
                Err(e) if e.is_configuration() => {
                    tracing::debug!(source = source.name(), "weather source not configured");
                }
                Err(e) => {
                    tracing::warn!(
                        source = source.name(),
                        provider = ?e.provider(),
                        error = %e,
                        "weather source failed"
                    );
                }
            }
        }

        tracing::warn!("all weather sources failed, serving mock data");
        WeatherEnvelope::from_report(location, self.fallback.report())
    }

    /// Up to five places matching `query`; empty on failure.
    pub async fn search_location(&self, query: &str) -> Vec<Location> {
        self.geocoder.search_location(query).await
    }
}

fn is_plausible(report: &WeatherReport) -> bool {
    is_valid_current(&report.current) && is_valid_forecast(&report.forecast)
}
