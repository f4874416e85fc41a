pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::AdvisorConfig;

pub use crate::core::{
    engine::PredictionEngine,
    features::FeatureAssembler,
    forest::RandomForest,
    pipeline::{CropPipeline, HttpCropPipeline},
};
pub use crate::utils::error::{AdvisorError, PipelineError, PipelineFailure, Result};
