use crate::domain::model::{DataSource, PipelineStage};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Failed to load model from '{path}': {message}")]
    ModelLoadError { path: String, message: String },

    #[error("Schema '{schema}' expects {expected} features but the model takes {actual}")]
    SchemaMismatch {
        schema: String,
        expected: usize,
        actual: usize,
    },

    #[error("Model rejected input: {message}")]
    ModelError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Model,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AdvisorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AdvisorError::Http(_) => ErrorCategory::Network,
            AdvisorError::ConfigValidationError { .. }
            | AdvisorError::InvalidConfigValueError { .. }
            | AdvisorError::MissingConfigError { .. }
            | AdvisorError::SchemaMismatch { .. } => ErrorCategory::Configuration,
            AdvisorError::ModelLoadError { .. } | AdvisorError::ModelError { .. } => {
                ErrorCategory::Model
            }
            AdvisorError::IoError(_) | AdvisorError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AdvisorError::Http(_) => ErrorSeverity::Medium,
            AdvisorError::ModelError { .. } => ErrorSeverity::Medium,
            AdvisorError::ConfigValidationError { .. }
            | AdvisorError::InvalidConfigValueError { .. }
            | AdvisorError::MissingConfigError { .. }
            | AdvisorError::ModelLoadError { .. } => ErrorSeverity::High,
            AdvisorError::SchemaMismatch { .. }
            | AdvisorError::IoError(_)
            | AdvisorError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AdvisorError::Http(_) => "Could not reach an external data provider".to_string(),
            AdvisorError::ConfigValidationError { field, .. }
            | AdvisorError::InvalidConfigValueError { field, .. } => {
                format!("Configuration value '{}' is invalid", field)
            }
            AdvisorError::MissingConfigError { field } => {
                format!("Configuration value '{}' is required", field)
            }
            AdvisorError::ModelLoadError { path, .. } => {
                format!("The prediction model at '{}' could not be loaded", path)
            }
            AdvisorError::SchemaMismatch { .. } => {
                "The configured feature schema does not match the loaded model".to_string()
            }
            AdvisorError::ModelError { .. } => "The model could not score this input".to_string(),
            AdvisorError::IoError(_) => "A file could not be read or written".to_string(),
            AdvisorError::SerializationError(_) => "Data could not be (de)serialized".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AdvisorError::Http(_) => "Check your network connection and try again",
            AdvisorError::ConfigValidationError { .. }
            | AdvisorError::InvalidConfigValueError { .. }
            | AdvisorError::MissingConfigError { .. } => {
                "Fix the value in the TOML config or the matching environment variable"
            }
            AdvisorError::ModelLoadError { .. } => {
                "Make sure the model file exists and is a valid decision-forest JSON artifact"
            }
            AdvisorError::SchemaMismatch { .. } => {
                "Set [model].schema (or --schema) to the schema the model was trained on"
            }
            AdvisorError::ModelError { .. } => "Check the fetched environment values",
            AdvisorError::IoError(_) | AdvisorError::SerializationError(_) => {
                "Check file permissions and file contents"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;

/// 單一外部資料來源的失敗原因
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    #[error("provider returned HTTP {status}")]
    Status { status: u16 },

    #[error("response is missing required field '{field}'")]
    MissingField { field: String },

    #[error("could not decode response: {message}")]
    Decode { message: String },
}

// 請求 URL 含 API key，不可進入錯誤訊息
impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        SourceError::Transport(e.without_url())
    }
}

impl SourceError {
    pub fn missing(field: &str) -> Self {
        SourceError::MissingField {
            field: field.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub source: DataSource,
    pub cause: String,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.source, self.cause)
    }
}

/// Per-request failures. None of these escape the orchestrator as panics;
/// they are the `Error(reason)` terminal of a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("location could not be found")]
    LocationNotFound,

    #[error("environment data unavailable from {}", join_failures(.failures))]
    EnvironmentDataUnavailable { failures: Vec<SourceFailure> },

    #[error("incomplete features, missing: {}", .missing.join(", "))]
    IncompleteFeatures { missing: Vec<String> },

    #[error("prediction failed: {detail}")]
    PredictionFailed { detail: String },

    #[error("prediction engine unavailable: {reason}")]
    EngineUnavailable { reason: String },
}

fn join_failures(failures: &[SourceFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl PipelineError {
    pub fn failed_sources(&self) -> Vec<DataSource> {
        match self {
            PipelineError::EnvironmentDataUnavailable { failures } => {
                failures.iter().map(|f| f.source).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// A run that ended in `Error(reason)`, tagged with the stage it failed in.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{stage} failed: {error}")]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    pub error: PipelineError,
}

impl PipelineFailure {
    pub fn new(stage: PipelineStage, error: PipelineError) -> Self {
        Self { stage, error }
    }

    pub fn user_friendly_message(&self) -> String {
        match &self.error {
            PipelineError::LocationNotFound => {
                "Couldn't find the location coordinates.".to_string()
            }
            PipelineError::EnvironmentDataUnavailable { failures } => format!(
                "Could not fetch environment data: {}",
                join_failures(failures)
            ),
            PipelineError::IncompleteFeatures { missing } => format!(
                "Missing data required for prediction: {}",
                missing.join(", ")
            ),
            PipelineError::PredictionFailed { detail } => {
                format!("Error during prediction: {}", detail)
            }
            PipelineError::EngineUnavailable { .. } => {
                "Model not loaded. Cannot make prediction.".to_string()
            }
        }
    }
}
