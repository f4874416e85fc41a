pub mod engine;
pub mod features;
pub mod forest;
pub mod pipeline;

pub use crate::domain::model::{
    Coordinates, EnvironmentReport, FeatureSchema, FeatureVector, PredictionResult,
    Recommendation, SoilSample, WeatherSample,
};
pub use crate::domain::ports::{Classifier, Geocoder, SoilSource, WeatherSource};
pub use crate::utils::error::Result;
