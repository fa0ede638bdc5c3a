//! Shared fixtures for the wiremock-backed integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use wxboard_core::{Config, ManualClock};

/// Thursday 2026-10-15, noon UTC.
pub fn clock() -> Arc<ManualClock> {
    let start = Utc
        .with_ymd_and_hms(2026, 10, 15, 12, 0, 0)
        .single()
        .expect("valid start time");
    Arc::new(ManualClock::new(start))
}

/// Every provider pointed at the mock server, no keys set.
pub fn config(server_uri: &str) -> Config {
    Config::default().with_base_url(server_uri)
}

pub fn weatherapi_body() -> Value {
    let days: Vec<Value> = (15..22)
        .map(|d| {
            json!({
                "date": format!("2026-10-{d}"),
                "day": {
                    "maxtemp_c": 18.4,
                    "mintemp_c": 9.1,
                    "totalprecip_mm": 1.2,
                    "uv": 3.0,
                    "condition": { "text": "Patchy rain nearby" }
                },
                "hour": [
                    {
                        "time_epoch": 1_792_065_600,
                        "time": format!("2026-10-{d} 12:00"),
                        "temp_c": 14.2,
                        "chance_of_rain": 40,
                        "condition": { "text": "Partly cloudy" }
                    }
                ]
            })
        })
        .collect();

    json!({
        "location": { "name": "New York", "country": "USA" },
        "current": {
            "temp_c": 14.6,
            "humidity": 71,
            "wind_kph": 18.0,
            "wind_degree": 240,
            "pressure_mb": 1016.0,
            "precip_mm": 0.0,
            "uv": 4.0,
            "condition": { "text": "Partly cloudy" }
        },
        "forecast": { "forecastday": days },
        "alerts": {
            "alert": [
                {
                    "headline": "Coastal Flood Advisory",
                    "event": "Coastal Flood Advisory",
                    "severity": "Minor",
                    "effective": "2026-10-15T10:00:00-04:00",
                    "expires": "2026-10-15T22:00:00-04:00",
                    "desc": "Up to one half foot of inundation."
                }
            ]
        }
    })
}

pub fn nasa_daily_body() -> Value {
    json!({
        "properties": {
            "parameter": {
                "T2M": { "20261014": 13.2, "20261015": -999.0 },
                "T2M_MIN": { "20261014": 8.7, "20261015": -999.0 },
                "T2M_MAX": { "20261014": 17.9, "20261015": -999.0 },
                "PRECTOTCORR": { "20261014": 0.4, "20261015": -999.0 },
                "WS2M": { "20261014": 3.41, "20261015": -999.0 },
                "WD2M": { "20261014": 221.0, "20261015": -999.0 },
                "RH2M": { "20261014": 68.5, "20261015": -999.0 },
                "PS": { "20261014": 101.2, "20261015": -999.0 },
                "ALLSKY_SFC_SW_DWN": { "20261014": 3.1, "20261015": -999.0 }
            }
        }
    })
}

pub fn nasa_climatology_body() -> Value {
    json!({
        "properties": {
            "parameter": {
                "T2M": { "OCT": 13.5, "ANN": 12.6 },
                "T2M_MIN": { "OCT": 9.0 },
                "T2M_MAX": { "OCT": 18.2 },
                "PRECTOTCORR": { "OCT": 3.2 },
                "WS2M": { "OCT": 3.9 },
                "WD2M": { "OCT": 230.0 }
            }
        }
    })
}

pub fn noaa_points_body(server_uri: &str) -> Value {
    json!({
        "properties": {
            "gridId": "OKX",
            "forecast": format!("{server_uri}/gridpoints/OKX/33,35/forecast"),
            "forecastHourly": format!("{server_uri}/gridpoints/OKX/33,35/forecast/hourly")
        }
    })
}

pub fn noaa_forecast_body(periods: usize) -> Value {
    let periods: Vec<Value> = (0..periods)
        .map(|i| {
            json!({
                "number": i + 1,
                "name": "",
                "startTime": format!("2026-10-15T{:02}:00:00-04:00", i % 24),
                "endTime": format!("2026-10-15T{:02}:59:00-04:00", i % 24),
                "isDaytime": true,
                "temperature": { "unitCode": "wmoUnit:degC", "value": 12.8 },
                "probabilityOfPrecipitation": { "unitCode": "wmoUnit:percent", "value": 20 },
                "windSpeed": "15 km/h",
                "windDirection": "SW",
                "shortForecast": "Mostly Cloudy",
                "detailedForecast": ""
            })
        })
        .collect();

    json!({ "properties": { "periods": periods } })
}
