use crate::adapters::{http, NominatimGeocoder, OpenWeatherMap, SoilGridsSoil};
use crate::config::toml_config::AdvisorConfig;
use crate::core::engine::PredictionEngine;
use crate::core::features::FeatureAssembler;
use crate::domain::model::{
    Coordinates, DataSource, EnvironmentReport, FeatureSchema, PipelineStage, Recommendation,
    SoilSample, WeatherSample,
};
use crate::domain::ports::{Geocoder, SoilSource, WeatherSource};
use crate::utils::error::{PipelineError, PipelineFailure, Result, SourceError, SourceFailure};
use std::sync::Arc;

pub type HttpCropPipeline = CropPipeline<NominatimGeocoder, OpenWeatherMap, SoilGridsSoil>;

/// Address → crop label.
///
/// Idle → Geocoding → FetchingEnvironment → Assembling → Predicting → Done,
/// with any stage able to end the run in `PipelineFailure`. Each run is
/// independent; the only shared state is the read-only engine.
pub struct CropPipeline<G, W, S> {
    geocoder: G,
    weather: W,
    soil: S,
    assembler: FeatureAssembler,
    engine: Arc<PredictionEngine>,
}

fn enter(stage: PipelineStage) {
    tracing::debug!("→ {}", stage);
}

fn fail(stage: PipelineStage, error: PipelineError) -> PipelineFailure {
    tracing::warn!("❌ {} failed: {}", stage, error);
    PipelineFailure::new(stage, error)
}

impl HttpCropPipeline {
    /// 以設定檔建立 HTTP 版本的 pipeline
    pub fn from_config(config: &AdvisorConfig, engine: Arc<PredictionEngine>) -> Result<Self> {
        let client = http::build_client(&config.http)?;

        let geocoder = NominatimGeocoder::new(client.clone(), config.geocoder.endpoint.clone());
        let weather = OpenWeatherMap::new(
            client.clone(),
            config.weather.endpoint.clone(),
            config.weather.api_key.clone(),
        );
        let soil = SoilGridsSoil::new(client, config.soil.endpoint.clone(), config.soil.depth.clone());

        Self::new(
            geocoder,
            weather,
            soil,
            FeatureAssembler::new(config.model.schema),
            engine,
        )
    }
}

impl<G, W, S> CropPipeline<G, W, S>
where
    G: Geocoder,
    W: WeatherSource,
    S: SoilSource,
{
    /// Fails with `SchemaMismatch` when a loaded model's width disagrees
    /// with the assembler's schema. An unavailable engine is accepted.
    pub fn new(
        geocoder: G,
        weather: W,
        soil: S,
        assembler: FeatureAssembler,
        engine: Arc<PredictionEngine>,
    ) -> Result<Self> {
        if let Some(width) = engine.input_width() {
            assembler.ensure_compatible(width)?;
        }

        Ok(Self {
            geocoder,
            weather,
            soil,
            assembler,
            engine,
        })
    }

    pub fn schema(&self) -> FeatureSchema {
        self.assembler.schema()
    }

    pub fn engine(&self) -> &PredictionEngine {
        &self.engine
    }

    pub async fn locate(&self, address: &str) -> std::result::Result<Coordinates, PipelineFailure> {
        enter(PipelineStage::Geocoding);
        let address = address.trim();
        if address.is_empty() {
            return Err(fail(PipelineStage::Geocoding, PipelineError::LocationNotFound));
        }

        self.geocoder
            .resolve(address)
            .await
            .ok_or_else(|| fail(PipelineStage::Geocoding, PipelineError::LocationNotFound))
    }

    /// Weather and soil have no data dependency, so when the schema needs
    /// both they are requested together.
    async fn fetch_environment(
        &self,
        coords: Coordinates,
    ) -> std::result::Result<(WeatherSample, Option<SoilSample>), PipelineFailure> {
        enter(PipelineStage::FetchingEnvironment);

        let (weather, soil) = if self.schema().requires(DataSource::Soil) {
            let (weather, soil) = tokio::join!(
                self.weather.fetch_current(coords),
                self.soil.fetch_ph(coords)
            );
            (weather, Some(soil))
        } else {
            (self.weather.fetch_current(coords).await, None)
        };

        let mut failures = Vec::new();
        let mut record = |source: DataSource, error: &SourceError| {
            tracing::debug!("{} source failed: {}", source, error);
            failures.push(SourceFailure {
                source,
                cause: error.to_string(),
            });
        };

        let weather = match weather {
            Ok(sample) => Some(sample),
            Err(e) => {
                record(DataSource::Weather, &e);
                None
            }
        };
        let soil = match soil {
            Some(Ok(sample)) => Some(sample),
            Some(Err(e)) => {
                record(DataSource::Soil, &e);
                None
            }
            None => None,
        };

        match weather {
            Some(weather) if failures.is_empty() => Ok((weather, soil)),
            _ => Err(fail(
                PipelineStage::FetchingEnvironment,
                PipelineError::EnvironmentDataUnavailable { failures },
            )),
        }
    }

    /// Runs everything short of prediction. Works while the engine is
    /// unavailable.
    pub async fn survey(
        &self,
        address: &str,
    ) -> std::result::Result<EnvironmentReport, PipelineFailure> {
        tracing::info!("Fetching data for {}", address.trim());

        let coordinates = self.locate(address).await?;
        let (weather, soil) = self.fetch_environment(coordinates).await?;

        enter(PipelineStage::Assembling);
        let features = self
            .assembler
            .assemble(Some(&weather), soil.as_ref())
            .map_err(|e| fail(PipelineStage::Assembling, e))?;

        Ok(EnvironmentReport {
            address: address.trim().to_string(),
            coordinates,
            weather,
            soil,
            features,
        })
    }

    pub async fn run(&self, address: &str) -> std::result::Result<Recommendation, PipelineFailure> {
        let report = self.survey(address).await?;

        enter(PipelineStage::Predicting);
        let prediction = self
            .engine
            .predict(&report.features)
            .map_err(|e| fail(PipelineStage::Predicting, e))?;

        enter(PipelineStage::Done);
        tracing::info!("🌾 Predicted crop: {}", prediction.label);
        Ok(Recommendation { report, prediction })
    }
}
