use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use wxboard_core::{
    Config, Coordinate, DataSource, ImageryService, Location, ProviderId, SystemClock,
    WeatherEnvelope, WeatherService, tips::weather_tip,
};

const HOURLY_SHOWN: usize = 12;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxboard", version, about = "Weather dashboard in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials (or the endpoint) for a specific provider.
    Configure {
        /// Provider short name, e.g. "weatherapi" or "nasa-earth".
        provider: String,
    },

    /// Show current conditions, forecast and alerts for a point.
    Show {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,

        /// Display name for the location.
        #[arg(long)]
        name: Option<String>,

        /// Print the raw envelope as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Look up places by name.
    Search {
        query: String,

        #[arg(long)]
        json: bool,
    },

    /// Satellite image URL for a point.
    Imagery {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,

        /// YYYY-MM-DD; today when absent.
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Dates with satellite imagery for a point, newest first.
    Dates {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },

    /// Check the NASA API key against a known image.
    CheckKey,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure { provider } => configure(config, &provider)?,
            Command::Show { lat, lon, name, json } => {
                let service = WeatherService::from_config(&config)?;
                tracing::debug!(chain = ?service.source_names(), "weather sources");
                let location = name.map(|name| Location {
                    lat,
                    lon,
                    name,
                    country: None,
                    state: None,
                });
                let envelope = service.get_weather_data(lat, lon, location).await;

                if json {
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                } else {
                    print_envelope(&envelope);
                }
            }
            Command::Search { query, json } => {
                let service = WeatherService::from_config(&config)?;
                let places = service.search_location(&query).await;

                if json {
                    println!("{}", serde_json::to_string_pretty(&places)?);
                } else if places.is_empty() {
                    println!("No places found for \"{query}\".");
                } else {
                    for place in &places {
                        println!("{:>9.4} {:>10.4}  {}", place.lat, place.lon, place.name);
                    }
                }
            }
            Command::Imagery { lat, lon, date } => {
                let imagery = imagery_service(&config)?;
                match imagery.get_earth_imagery(Coordinate::new(lat, lon)?, date).await {
                    Some(image) => println!("{} ({})", image.image_url, image.date),
                    None => bail!("No imagery available for {lat}, {lon}"),
                }
            }
            Command::Dates { lat, lon } => {
                let imagery = imagery_service(&config)?;
                match imagery.get_available_dates(Coordinate::new(lat, lon)?).await {
                    Some(dates) if dates.is_empty() => println!("No imagery dates found."),
                    Some(dates) => dates.iter().for_each(|d| println!("{d}")),
                    None => bail!("Could not list imagery dates for {lat}, {lon}"),
                }
            }
            Command::CheckKey => {
                if imagery_service(&config)?.is_api_key_valid().await {
                    println!("NASA API key is valid.");
                } else {
                    bail!("NASA API key is missing or was rejected");
                }
            }
        }

        Ok(())
    }
}

fn imagery_service(config: &Config) -> anyhow::Result<ImageryService> {
    Ok(ImageryService::from_config(config, Arc::new(SystemClock))?)
}

fn configure(mut config: Config, provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    if id.requires_api_key() {
        let key = Password::new(&format!("API key for {id}:"))
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .context("No API key entered")?;
        config.upsert_provider_api_key(id, key.trim().to_string());

        if !config.is_provider_configured(id) {
            bail!("That looks like a placeholder, not a real {id} key");
        }
    } else {
        let current = config.provider(id).base_url.clone();
        let base_url = Text::new(&format!("Base URL for {id}:"))
            .with_default(&current)
            .prompt()
            .context("No base URL entered")?;
        config.provider_mut(id).base_url = base_url.trim().to_string();
    }

    config.save()?;
    println!("Saved {id} settings to {}", Config::config_file_path()?.display());
    Ok(())
}

fn print_envelope(env: &WeatherEnvelope) {
    let c = &env.current;

    println!("{}", env.location.name);
    match env.source {
        DataSource::Live => {}
        DataSource::Degraded => println!("(partial data, some sources unavailable)"),
        DataSource::Mock => println!("(sample data, no provider reachable)"),
    }
    println!();
    println!(
        "{} {}  {:.0}°C  {}",
        c.icon,
        c.description,
        c.temperature,
        weather_tip(Some(c))
    );
    println!(
        "   low {:.0}°C  high {:.0}°C  humidity {:.0}%  wind {:.1} m/s @ {:.0}°",
        c.temperature_min, c.temperature_max, c.humidity, c.wind_speed, c.wind_direction
    );
    println!(
        "   pressure {:.0} hPa  precipitation {:.1} mm",
        c.pressure, c.precipitation
    );

    for alert in &env.alerts {
        println!();
        println!("⚠️  {}", alert.headline);
        if let Some(expires) = &alert.expires {
            println!("   until {expires}");
        }
    }

    if !env.hourly.is_empty() {
        println!();
        for hour in env.hourly.iter().take(HOURLY_SHOWN) {
            println!(
                "{}  {} {:>3.0}°C  {:>3.0}%",
                hour.start_time.format("%H:%M"),
                hour.icon,
                hour.temperature,
                hour.precipitation_probability
            );
        }
    }

    println!();
    for day in &env.forecast {
        println!(
            "{} {}  {} {:>3.0}° / {:>3.0}°  {}",
            day.day,
            day.date.format("%m-%d"),
            day.icon,
            day.temperature_min,
            day.temperature_max,
            day.description
        );
    }
}
