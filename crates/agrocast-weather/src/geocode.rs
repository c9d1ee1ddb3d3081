//! Forward geocoding: convert a city name to coordinates.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use std::time::Duration;

use agrocast_core::{with_retry, Config, RetryConfig};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{Coordinates, GeocodeError};

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[allow(dead_code)]
    display_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    client: Client,
    search_url: String,
    country_suffix: String,
    retry: RetryConfig,
}

impl Geocoder {
    pub fn new(
        search_url: &str,
        country_suffix: &str,
        user_agent: &str,
        retry: RetryConfig,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            search_url: search_url.to_string(),
            country_suffix: country_suffix.to_string(),
            retry,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GeocodeError> {
        Self::new(
            &config.geocoding.search_url,
            &config.geocoding.country_suffix,
            &config.geocoding.user_agent,
            config.retry.to_retry_config(),
        )
    }

    /// Resolve `city` to the first Nominatim match.
    #[instrument(skip(self), level = "debug")]
    pub async fn lookup(&self, city: &str) -> Result<Coordinates, GeocodeError> {
        let query = if self.country_suffix.is_empty() {
            city.to_string()
        } else {
            format!("{},{}", city, self.country_suffix)
        };

        let response = with_retry(&self.retry, || {
            self.client
                .get(&self.search_url)
                .query(&[("q", query.as_str()), ("format", "json"), ("limit", "1")])
                .send()
        })
        .await?;

        if !response.status().is_success() {
            tracing::debug!("Geocode returned status {}", response.status());
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let places: Vec<NominatimPlace> = response.json().await?;
        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NoMatch(city.to_string()))?;

        let coordinates = Coordinates {
            lat: parse_coordinate(&place.lat)?,
            lon: parse_coordinate(&place.lon)?,
        };

        tracing::info!("Geocoded {} to ({}, {})", city, coordinates.lat, coordinates.lon);
        Ok(coordinates)
    }
}

fn parse_coordinate(raw: &str) -> Result<f64, GeocodeError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GeocodeError::InvalidCoordinate(raw.to_string()))
}
