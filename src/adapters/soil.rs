use crate::adapters::http::read_json;
use crate::domain::model::{Coordinates, SoilSample};
use crate::domain::ports::SoilSource;
use crate::utils::error::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const PH_PROPERTY: &str = "phh2o";

// properties.phh2o.layers[0].depths[0].values.mean
#[derive(Debug, Deserialize)]
struct SoilResponse {
    properties: Option<SoilProperties>,
}

#[derive(Debug, Deserialize)]
struct SoilProperties {
    phh2o: Option<PropertyLayers>,
}

#[derive(Debug, Deserialize)]
struct PropertyLayers {
    #[serde(default)]
    layers: Vec<Layer>,
}

#[derive(Debug, Deserialize)]
struct Layer {
    #[serde(default)]
    depths: Vec<Depth>,
}

#[derive(Debug, Deserialize)]
struct Depth {
    values: Option<DepthValues>,
}

#[derive(Debug, Deserialize)]
struct DepthValues {
    mean: Option<f64>,
}

impl SoilResponse {
    fn surface_mean(self) -> Result<f64, SourceError> {
        let layers = self
            .properties
            .and_then(|p| p.phh2o)
            .map(|p| p.layers)
            .unwrap_or_default();
        let layer = layers
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::missing("properties.phh2o.layers[0]"))?;
        let depth = layer
            .depths
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::missing("layers[0].depths[0]"))?;
        depth
            .values
            .and_then(|v| v.mean)
            .ok_or_else(|| SourceError::missing("depths[0].values.mean"))
    }
}

#[derive(Debug, Clone)]
pub struct SoilGridsSoil {
    client: Client,
    endpoint: String,
    depth: String,
}

impl SoilGridsSoil {
    pub fn new(client: Client, endpoint: impl Into<String>, depth: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            depth: depth.into(),
        }
    }
}

#[async_trait]
impl SoilSource for SoilGridsSoil {
    async fn fetch_ph(&self, coords: Coordinates) -> Result<SoilSample, SourceError> {
        tracing::debug!("Fetching soil pH for {}", coords);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("lon", coords.longitude.to_string()),
                ("lat", coords.latitude.to_string()),
                ("property", PH_PROPERTY.to_string()),
                ("depth", self.depth.clone()),
                ("value", "mean".to_string()),
            ])
            .send()
            .await?;

        let body: SoilResponse = read_json(response).await?;
        let raw = body.surface_mean()?;
        let sample = SoilSample::from_raw_mean(raw);

        tracing::debug!("Soil pH: {:.1} (raw {})", sample.ph, raw);
        Ok(sample)
    }
}
