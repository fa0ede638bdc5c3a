use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{classify::Icon, error::WeatherError};

/// A point on the globe. Latitude in `[-90, 90]`, longitude in `[-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, WeatherError> {
        let in_range = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);

        if in_range {
            Ok(Self { lat, lon })
        } else {
            Err(WeatherError::InvalidCoordinate { lat, lon })
        }
    }

    /// Cache identity: points closer than ~11 m share an entry.
    pub fn cache_key(&self) -> String {
        format!("{:.4}-{:.4}", self.lat, self.lon)
    }
}

/// A named place, either from geocoding or labelled from a raw coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl Location {
    /// Label for a point picked on the map.
    pub fn pinned(coord: Coordinate) -> Self {
        Self::labelled(coord, format!("{:.4}, {:.4}", coord.lat, coord.lon))
    }

    /// Label used when a weather request arrives without a known place.
    pub fn approximate(coord: Coordinate) -> Self {
        Self::labelled(coord, format!("{:.2}, {:.2}", coord.lat, coord.lon))
    }

    fn labelled(coord: Coordinate, name: String) -> Self {
        Self {
            lat: coord.lat,
            lon: coord.lon,
            name,
            country: None,
            state: None,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate { lat: self.lat, lon: self.lon }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    /// °C
    pub temperature: f64,
    pub temperature_min: f64,
    pub temperature_max: f64,
    /// %
    pub humidity: f64,
    /// m/s
    pub wind_speed: f64,
    /// Degrees clockwise from north.
    pub wind_direction: f64,
    /// hPa
    pub pressure: f64,
    /// mm
    pub precipitation: f64,
    /// W/m², or the UV index where a provider has nothing better.
    pub solar: f64,
    pub description: String,
    pub icon: Icon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: NaiveDate,
    /// Short weekday label, e.g. "Mon".
    pub day: String,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub description: String,
    pub icon: Icon,
    pub precipitation: f64,
}

impl ForecastDay {
    pub fn weekday_label(date: NaiveDate) -> String {
        date.format("%a").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPoint {
    pub start_time: DateTime<FixedOffset>,
    pub temperature: f64,
    pub precipitation_probability: f64,
    pub icon: Icon,
}

/// A severe-weather alert as issued by the upstream provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WeatherAlert {
    pub headline: String,
    pub event: Option<String>,
    pub severity: Option<String>,
    pub effective: Option<String>,
    pub expires: Option<String>,
    pub description: Option<String>,
}

/// Where an envelope's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Every part came from an upstream provider.
    Live,
    /// Composed from several providers with at least one part substituted.
    Degraded,
    /// Static fallback payload.
    Mock,
}

/// Provider output before it is bound to a caller's location.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastDay>,
    pub hourly: Vec<HourlyPoint>,
    pub alerts: Vec<WeatherAlert>,
    pub source: DataSource,
}

/// The aggregated payload handed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherEnvelope {
    pub location: Location,
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastDay>,
    pub hourly: Vec<HourlyPoint>,
    pub alerts: Vec<WeatherAlert>,
    pub source: DataSource,
}

impl WeatherEnvelope {
    pub fn from_report(location: Location, report: WeatherReport) -> Self {
        Self {
            location,
            current: report.current,
            forecast: report.forecast,
            hourly: report.hourly,
            alerts: report.alerts,
            source: report.source,
        }
    }
}

/// A satellite image reference for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarthImage {
    pub image_url: String,
    pub date: NaiveDate,
    pub coordinates: Coordinate,
}
