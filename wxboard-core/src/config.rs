use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::PathBuf};

use crate::provider::ProviderId;

/// Connection settings for a single upstream provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    /// Endpoint name -> path relative to `base_url`.
    pub endpoints: BTreeMap<String, String>,
}

impl ProviderConfig {
    fn new(base_url: &str, endpoints: &[(&str, &str)]) -> Self {
        Self {
            api_key: None,
            base_url: base_url.to_string(),
            endpoints: endpoints
                .iter()
                .map(|(name, path)| (name.to_string(), path.to_string()))
                .collect(),
        }
    }

    /// The API key, unless it is absent or still a placeholder.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !is_placeholder_key(k))
    }

    pub fn is_configured(&self) -> bool {
        self.usable_api_key().is_some()
    }

    /// Full URL for a named endpoint; unknown names resolve to the base URL.
    pub fn endpoint_url(&self, name: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        match self.endpoints.get(name) {
            Some(path) => format!("{base}{path}"),
            None => base.to_string(),
        }
    }

    /// Fill anything a partial config file left out.
    fn merge_defaults(&mut self, defaults: &ProviderConfig) {
        if self.base_url.trim().is_empty() {
            self.base_url = defaults.base_url.clone();
        }
        for (name, path) in &defaults.endpoints {
            self.endpoints
                .entry(name.clone())
                .or_insert_with(|| path.clone());
        }
    }
}

/// Keys shipped in templates ("YOUR_API_KEY_HERE", "<key>", "****") count as missing.
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim();
    key.is_empty()
        || key.to_uppercase().contains("YOUR_")
        || key.contains("***")
        || key.contains('<')
        || key.contains('>')
}

/// Settings for the shared HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: concat!("wxboard/", env!("CARGO_PKG_VERSION"), " (weather dashboard)")
                .to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [weatherapi]
/// api_key = "..."
///
/// [http]
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub weatherapi: ProviderConfig,
    pub openweather: ProviderConfig,
    pub nasa_power: ProviderConfig,
    pub noaa: ProviderConfig,
    pub nasa_earth: ProviderConfig,
    pub geocoding: ProviderConfig,
    pub http: HttpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weatherapi: ProviderConfig::new(
                "https://api.weatherapi.com/v1",
                &[("current", "/current.json"), ("forecast", "/forecast.json")],
            ),
            openweather: ProviderConfig::new(
                "https://api.openweathermap.org/data/2.5",
                &[("current", "/weather"), ("forecast", "/forecast")],
            ),
            nasa_power: ProviderConfig::new(
                "https://power.larc.nasa.gov/api",
                &[
                    ("daily", "/temporal/daily/point"),
                    ("climatology", "/temporal/climatology/point"),
                ],
            ),
            noaa: ProviderConfig::new("https://api.weather.gov", &[("points", "/points")]),
            nasa_earth: ProviderConfig::new(
                "https://api.nasa.gov",
                &[
                    ("imagery", "/planetary/earth/imagery"),
                    ("assets", "/planetary/earth/assets"),
                ],
            ),
            geocoding: ProviderConfig::new(
                "https://nominatim.openstreetmap.org",
                &[("search", "/search")],
            ),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    pub fn provider(&self, id: ProviderId) -> &ProviderConfig {
        match id {
            ProviderId::WeatherApi => &self.weatherapi,
            ProviderId::OpenWeather => &self.openweather,
            ProviderId::NasaPower => &self.nasa_power,
            ProviderId::Noaa => &self.noaa,
            ProviderId::NasaEarth => &self.nasa_earth,
            ProviderId::Nominatim => &self.geocoding,
        }
    }

    pub fn provider_mut(&mut self, id: ProviderId) -> &mut ProviderConfig {
        match id {
            ProviderId::WeatherApi => &mut self.weatherapi,
            ProviderId::OpenWeather => &mut self.openweather,
            ProviderId::NasaPower => &mut self.nasa_power,
            ProviderId::Noaa => &mut self.noaa,
            ProviderId::NasaEarth => &mut self.nasa_earth,
            ProviderId::Nominatim => &mut self.geocoding,
        }
    }

    /// Point every provider at `base_url`. Handy for tests and local proxies.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        for id in ProviderId::all() {
            self.provider_mut(*id).base_url = base_url.to_string();
        }
        self
    }

    /// Load config from disk, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: nothing saved yet.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse TOML, filling omitted URLs and endpoints from the defaults.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let mut cfg: Config = toml::from_str(contents)?;
        let defaults = Config::default();
        for id in ProviderId::all() {
            cfg.provider_mut(*id).merge_defaults(defaults.provider(*id));
        }
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxboard", "wxboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set or replace a provider API key.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.provider_mut(provider_id).api_key = Some(api_key);
    }

    /// Returns a usable API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider(provider_id).usable_api_key()
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider(provider_id).is_configured()
    }
}
