//! Forward geocoding through a Nominatim-compatible search endpoint.

use crate::adapters::http::read_json;
use crate::domain::model::Coordinates;
use crate::domain::ports::Geocoder;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
    #[allow(dead_code)]
    display_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
}

impl NominatimGeocoder {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, address: &str) -> Option<Coordinates> {
        tracing::debug!("Geocoding '{}' via {}", address, self.endpoint);

        let response = match self
            .client
            .get(&self.endpoint)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Geocode request failed: {}", e);
                return None;
            }
        };

        let results: Vec<SearchResult> = match read_json(response).await {
            Ok(results) => results,
            Err(e) => {
                tracing::debug!("Geocode response unusable: {}", e);
                return None;
            }
        };

        let best = results.into_iter().next()?;
        let coords = match (best.lat.trim().parse::<f64>(), best.lon.trim().parse::<f64>()) {
            (Ok(latitude), Ok(longitude)) => Coordinates::new(latitude, longitude),
            _ => {
                tracing::debug!("Geocode result has non-numeric coordinates: {:?}", best);
                return None;
            }
        };

        if !coords.is_valid() {
            tracing::debug!("Geocode result out of range: {}", coords);
            return None;
        }

        tracing::info!("📍 Coordinates: {}", coords);
        Some(coords)
    }
}
