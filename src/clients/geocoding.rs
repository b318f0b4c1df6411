use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::config::GeocodingConfig;
use crate::models::Coordinates;

/// Resolves free-text addresses to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the address is unknown to the service.
    async fn resolve(&self, address: &str) -> Result<Option<Coordinates>>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimPlace {
    fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates {
            lat: self.lat.parse().ok()?,
            lon: self.lon.parse().ok()?,
        })
    }
}

pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build geocoding client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, address: &str) -> Result<Option<Coordinates>> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[("q", address), ("format", "json"), ("limit", "1")],
        )
        .context("Invalid geocoding URL")?;

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Geocoding error: {} - {}", status, body));
        }

        let places: Vec<NominatimPlace> = response.json().await?;

        Ok(places.first().and_then(NominatimPlace::coordinates))
    }
}

/// Used when geocoding is switched off; every address stays without coordinates.
pub struct DisabledGeocoder;

#[async_trait]
impl Geocoder for DisabledGeocoder {
    async fn resolve(&self, _address: &str) -> Result<Option<Coordinates>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_coordinates() {
        let places: Vec<NominatimPlace> =
            serde_json::from_str(r#"[{"lat":"52.5170365","lon":"13.3888599","display_name":"Berlin"}]"#)
                .unwrap();
        let coordinates = places[0].coordinates().unwrap();
        assert!((coordinates.lat - 52.517_036_5).abs() < 1e-9);
        assert!((coordinates.lon - 13.388_859_9).abs() < 1e-9);
    }

    #[test]
    fn unparseable_coordinates_are_ignored() {
        let place = NominatimPlace {
            lat: "north".to_string(),
            lon: "13.4".to_string(),
        };
        assert!(place.coordinates().is_none());
    }

    #[tokio::test]
    async fn disabled_geocoder_resolves_nothing() {
        assert_eq!(DisabledGeocoder.resolve("Main St 1").await.unwrap(), None);
    }
}
