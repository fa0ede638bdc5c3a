use thiserror::Error;

use crate::provider::ProviderId;

/// Failures raised by provider adapters.
///
/// None of these reach the consumer of [`crate::WeatherService`]: the
/// aggregator logs them and degrades to the next source or to mock data.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Missing or placeholder API key.
    #[error("provider '{0}' is not configured (missing or placeholder API key)")]
    NotConfigured(ProviderId),

    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} request failed with status {status}: {body}")]
    Status {
        provider: ProviderId,
        status: u16,
        body: String,
    },

    #[error("failed to parse {provider} response: {source}")]
    Parse {
        provider: ProviderId,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} response is missing data: {detail}")]
    MissingData { provider: ProviderId, detail: String },

    #[error("coordinate ({lat}, {lon}) is out of range")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl WeatherError {
    /// The provider the failure is attributed to, if any.
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            Self::NotConfigured(p) => Some(*p),
            Self::Transport { provider, .. }
            | Self::Status { provider, .. }
            | Self::Parse { provider, .. }
            | Self::MissingData { provider, .. } => Some(*provider),
            Self::InvalidCoordinate { .. } | Self::Client(_) => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }
}

pub type Result<T> = std::result::Result<T, WeatherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_mentions_provider_and_code() {
        let err = WeatherError::Status {
            provider: ProviderId::Noaa,
            status: 503,
            body: "unavailable".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("noaa"));
        assert!(msg.contains("503"));
        assert_eq!(err.provider(), Some(ProviderId::Noaa));
    }

    #[test]
    fn not_configured_is_configuration_error() {
        let err = WeatherError::NotConfigured(ProviderId::NasaEarth);
        assert!(err.is_configuration());
        assert!(err.to_string().contains("nasa-earth"));
    }

    #[test]
    fn invalid_coordinate_has_no_provider() {
        let err = WeatherError::InvalidCoordinate { lat: 91.0, lon: 0.0 };
        assert_eq!(err.provider(), None);
    }
}
