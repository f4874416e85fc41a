use crate::domain::model::{FeatureField, FeatureSchema, FeatureVector, SoilSample, WeatherSample};
use crate::utils::error::{AdvisorError, PipelineError, Result};

/// Lays samples out in the order the configured schema dictates. Pure; no I/O.
#[derive(Debug, Clone, Copy)]
pub struct FeatureAssembler {
    schema: FeatureSchema,
}

impl FeatureAssembler {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> FeatureSchema {
        self.schema
    }

    /// A model that takes a different number of inputs is a startup error,
    /// not something to discover per request.
    pub fn ensure_compatible(&self, model_width: usize) -> Result<()> {
        if model_width != self.schema.width() {
            return Err(AdvisorError::SchemaMismatch {
                schema: self.schema.to_string(),
                expected: self.schema.width(),
                actual: model_width,
            });
        }
        Ok(())
    }

    pub fn assemble(
        &self,
        weather: Option<&WeatherSample>,
        soil: Option<&SoilSample>,
    ) -> std::result::Result<FeatureVector, PipelineError> {
        let mut values = Vec::with_capacity(self.schema.width());
        let mut missing = Vec::new();

        for field in self.schema.fields() {
            let value = match field {
                FeatureField::Temperature => weather.map(|w| w.temperature),
                FeatureField::Humidity => weather.map(|w| w.humidity),
                FeatureField::Rainfall => weather.map(|w| w.rainfall),
                FeatureField::Ph => soil.map(|s| s.ph),
            };

            // NaN 視同缺值
            match value.filter(|v| v.is_finite()) {
                Some(v) => values.push(v),
                None => missing.push(field.name().to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(PipelineError::IncompleteFeatures { missing });
        }

        Ok(FeatureVector {
            schema: self.schema,
            values,
        })
    }
}
