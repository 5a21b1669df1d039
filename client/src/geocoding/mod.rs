//! Reverse geocoding - turning a coordinate pair into a street address

use crate::config::GeocodingConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Address lookup outcome. Finding no address is not a failure: `address` is
/// empty and `error` says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub address: Option<String>,
    pub source: String,
    pub error: Option<String>,
}

/// Transport-level failures only
#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Geocoding service returned error: {0}")]
    Status(reqwest::StatusCode),

    #[error("Malformed geocoding response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub trait ReverseGeocoder {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<GeocodeResult, GeocodeError>;
}

/// Client for a Nominatim-compatible `/reverse` endpoint
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    display_name: Option<String>,
    error: Option<String>,
}

impl NominatimGeocoder {
    pub const SOURCE: &'static str = "nominatim";

    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build geocoding HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<GeocodeResult, GeocodeError> {
        debug!("Reverse geocoding {:.6},{:.6} via {}", latitude, longitude, self.base_url);

        let response = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status()));
        }

        let body = response.text().await?;
        parse_nominatim_response(&body)
    }
}

/// Parse a Nominatim `jsonv2` reply
pub fn parse_nominatim_response(body: &str) -> Result<GeocodeResult, GeocodeError> {
    let parsed: NominatimResponse = serde_json::from_str(body)?;

    let address = parsed
        .display_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    let error = match (&address, parsed.error) {
        (Some(_), _) => None,
        (None, Some(e)) => Some(e),
        (None, None) => Some("No address found".to_string()),
    };

    Ok(GeocodeResult {
        address,
        source: NominatimGeocoder::SOURCE.to_string(),
        error,
    })
}

/// Geocoder selected from configuration
pub enum Geocoder {
    Nominatim(NominatimGeocoder),
    Disabled,
}

impl Geocoder {
    pub fn from_config(config: &GeocodingConfig) -> Result<Self> {
        if config.enabled {
            Ok(Geocoder::Nominatim(NominatimGeocoder::new(config)?))
        } else {
            Ok(Geocoder::Disabled)
        }
    }
}

impl ReverseGeocoder for Geocoder {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<GeocodeResult, GeocodeError> {
        match self {
            Geocoder::Nominatim(g) => g.reverse_geocode(latitude, longitude).await,
            Geocoder::Disabled => Ok(GeocodeResult {
                address: None,
                source: "disabled".to_string(),
                error: None,
            }),
        }
    }
}
