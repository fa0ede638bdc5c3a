//! Core library for the `wxboard` weather dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Adapters for the upstream weather, imagery and geocoding services
//! - Normalization of their payloads into one shared model
//! - The aggregator that walks the provider chain and falls back to mock data
//!
//! It is used by `wxboard-cli`, but can also be reused by other binaries or services.

pub mod aggregator;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod mock;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod tips;
pub mod validity;

pub use aggregator::{NasaNoaaSource, WeatherService};
pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use classify::Icon;
pub use config::{Config, HttpConfig, ProviderConfig};
pub use error::{Result, WeatherError};
pub use model::{
    Coordinate, CurrentConditions, DataSource, EarthImage, ForecastDay, HourlyPoint, Location,
    WeatherAlert, WeatherEnvelope, WeatherReport,
};
pub use provider::{ProviderId, WeatherSource, nasa_earth::ImageryService};
