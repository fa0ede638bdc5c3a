//! Forward geocoding: free-text place search to coordinates.
//! Uses Nominatim (OpenStreetMap) - free, no API key required, but a
//! descriptive User-Agent is mandatory.

use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::ProviderConfig,
    error::Result,
    model::{Coordinate, Location},
    provider::{ProviderId, get_json},
};

const MAX_RESULTS: usize = 5;

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    country: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    config: ProviderConfig,
    http: Client,
}

impl Geocoder {
    pub fn new(config: ProviderConfig, http: Client) -> Self {
        Self { config, http }
    }

    /// Up to five candidate places for `query`. Failures yield an empty list.
    pub async fn search_location(&self, query: &str) -> Vec<Location> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        match self.try_search(query).await {
            Ok(locations) => locations,
            Err(e) => {
                tracing::warn!(query, error = %e, "geocoding failed");
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &str) -> Result<Vec<Location>> {
        let limit = MAX_RESULTS.to_string();
        let request = self.http.get(self.config.endpoint_url("search")).query(&[
            ("q", query),
            ("format", "json"),
            ("limit", limit.as_str()),
            ("addressdetails", "1"),
        ]);

        let places: Vec<NominatimPlace> = get_json(ProviderId::Nominatim, request).await?;

        let locations: Vec<Location> = places
            .into_iter()
            .filter_map(place_to_location)
            .take(MAX_RESULTS)
            .collect();

        tracing::info!(query, results = locations.len(), "geocoded");
        Ok(locations)
    }
}

/// Drops places whose coordinates don't parse or fall out of range.
fn place_to_location(place: NominatimPlace) -> Option<Location> {
    let lat = place.lat.trim().parse::<f64>().ok()?;
    let lon = place.lon.trim().parse::<f64>().ok()?;
    let coord = Coordinate::new(lat, lon).ok()?;

    let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
    let (country, state) = match place.address {
        Some(addr) => (non_empty(addr.country), non_empty(addr.state)),
        None => (None, None),
    };

    Some(Location {
        lat: coord.lat,
        lon: coord.lon,
        name: place.display_name,
        country,
        state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(lat: &str, lon: &str, address: Option<serde_json::Value>) -> NominatimPlace {
        let mut v = serde_json::json!({
            "lat": lat,
            "lon": lon,
            "display_name": "Paris, Île-de-France, France métropolitaine, France"
        });
        if let Some(a) = address {
            v["address"] = a;
        }
        serde_json::from_value(v).expect("place should deserialize")
    }

    #[test]
    fn extracts_country_and_state() {
        let loc = place_to_location(place(
            "48.8588897",
            "2.3200410",
            Some(serde_json::json!({ "country": "France", "state": "Île-de-France", "city": "Paris" })),
        ))
        .expect("valid place");

        assert_eq!(loc.lat, 48.8588897);
        assert_eq!(loc.country.as_deref(), Some("France"));
        assert_eq!(loc.state.as_deref(), Some("Île-de-France"));
    }

    #[test]
    fn missing_or_blank_address_fields_become_none() {
        let loc = place_to_location(place("1.0", "2.0", None)).expect("valid place");
        assert!(loc.country.is_none());

        let loc = place_to_location(place("1.0", "2.0", Some(serde_json::json!({ "state": "" }))))
            .expect("valid place");
        assert!(loc.state.is_none());
    }

    #[test]
    fn bad_coordinates_are_dropped() {
        assert!(place_to_location(place("not-a-number", "2.0", None)).is_none());
        assert!(place_to_location(place("95.0", "2.0", None)).is_none());
    }

    #[tokio::test]
    async fn blank_query_skips_network() {
        let cfg = ProviderConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..ProviderConfig::default()
        };
        let geocoder = Geocoder::new(cfg, Client::new());
        assert!(geocoder.search_location("   ").await.is_empty());
    }
}
