use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Current conditions in metric units. `rainfall` is the last hour's
/// precipitation and is 0.0 when the provider reports no rain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilSample {
    pub ph: f64,
}

impl SoilSample {
    /// 土壤供應商以 pH 的十分之一為單位回傳
    pub fn from_raw_mean(raw: f64) -> Self {
        Self {
            ph: round_one_decimal(raw * 0.1),
        }
    }
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Weather,
    Soil,
    Climate,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Weather => write!(f, "weather"),
            DataSource::Soil => write!(f, "soil"),
            DataSource::Climate => write!(f, "climate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureField {
    Temperature,
    Humidity,
    Ph,
    Rainfall,
}

impl FeatureField {
    pub fn name(&self) -> &'static str {
        match self {
            FeatureField::Temperature => "temperature",
            FeatureField::Humidity => "humidity",
            FeatureField::Ph => "ph",
            FeatureField::Rainfall => "rainfall",
        }
    }

    pub fn source(&self) -> DataSource {
        match self {
            FeatureField::Ph => DataSource::Soil,
            _ => DataSource::Weather,
        }
    }
}

/// Input layout of the trained model. Order matters: the model cannot tell
/// a swapped column from a real one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureSchema {
    #[default]
    ThreeFeature,
    FourFeature,
}

impl FeatureSchema {
    pub fn fields(&self) -> &'static [FeatureField] {
        match self {
            FeatureSchema::ThreeFeature => &[
                FeatureField::Temperature,
                FeatureField::Humidity,
                FeatureField::Rainfall,
            ],
            FeatureSchema::FourFeature => &[
                FeatureField::Temperature,
                FeatureField::Humidity,
                FeatureField::Ph,
                FeatureField::Rainfall,
            ],
        }
    }

    pub fn width(&self) -> usize {
        self.fields().len()
    }

    pub fn requires(&self, source: DataSource) -> bool {
        self.fields().iter().any(|field| field.source() == source)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FeatureSchema::ThreeFeature => "three-feature",
            FeatureSchema::FourFeature => "four-feature",
        }
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for FeatureSchema {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "three-feature" | "3" => Ok(FeatureSchema::ThreeFeature),
            "four-feature" | "4" => Ok(FeatureSchema::FourFeature),
            other => Err(format!(
                "unknown feature schema '{}', expected 'three-feature' or 'four-feature'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub schema: FeatureSchema,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Geocoding,
    FetchingEnvironment,
    Assembling,
    Predicting,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Geocoding => "geocoding",
            PipelineStage::FetchingEnvironment => "fetching environment",
            PipelineStage::Assembling => "assembling",
            PipelineStage::Predicting => "predicting",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Everything fetched for one address, up to and including the assembled
/// feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentReport {
    pub address: String,
    pub coordinates: Coordinates,
    pub weather: WeatherSample,
    pub soil: Option<SoilSample>,
    pub features: FeatureVector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub report: EnvironmentReport,
    pub prediction: PredictionResult,
}

/// Aggregated daily history for one location, as printed by `history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateSummary {
    pub coordinates: Coordinates,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: usize,
    pub mean_temperature: Option<f64>,
    pub total_rainfall: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soil_scale_law() {
        assert_eq!(SoilSample::from_raw_mean(65.0).ph, 6.5);
        assert_eq!(SoilSample::from_raw_mean(60.0).ph, 6.0);
        assert_eq!(SoilSample::from_raw_mean(57.4).ph, 5.7);
    }

    #[test]
    fn test_schema_field_order() {
        assert_eq!(
            FeatureSchema::FourFeature.fields(),
            &[
                FeatureField::Temperature,
                FeatureField::Humidity,
                FeatureField::Ph,
                FeatureField::Rainfall
            ]
        );
        assert_eq!(FeatureSchema::ThreeFeature.width(), 3);
        assert!(!FeatureSchema::ThreeFeature.requires(DataSource::Soil));
        assert!(FeatureSchema::FourFeature.requires(DataSource::Soil));
    }

    #[test]
    fn test_schema_parsing() {
        assert_eq!(
            "four-feature".parse::<FeatureSchema>().unwrap(),
            FeatureSchema::FourFeature
        );
        assert_eq!("3".parse::<FeatureSchema>().unwrap(), FeatureSchema::ThreeFeature);
        assert!("five".parse::<FeatureSchema>().is_err());
    }

    #[test]
    fn test_coordinates_range() {
        assert!(Coordinates::new(7.3775, 3.9470).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, f64::NAN).is_valid());
    }
}
