use crate::domain::model::FeatureSchema;
use crate::utils::error::{AdvisorError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_GEOCODER_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_WEATHER_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_SOIL_ENDPOINT: &str = "https://rest.isric.org/soilgrids/v2.0/properties/query";
pub const DEFAULT_CLIMATE_ENDPOINT: &str = "https://power.larc.nasa.gov/api/temporal/daily/point";
pub const DEFAULT_MODEL_PATH: &str = "model/RandomForest.json";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub geocoder: GeocoderConfig,
    pub weather: WeatherConfig,
    pub soil: SoilConfig,
    pub climate: ClimateConfig,
    pub model: ModelConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub endpoint: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEOCODER_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub endpoint: String,
    pub api_key: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_WEATHER_ENDPOINT.to_string(),
            api_key: "${OPENWEATHER_API_KEY}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilConfig {
    pub endpoint: String,
    pub depth: String,
}

impl Default for SoilConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SOIL_ENDPOINT.to_string(),
            depth: "0-5cm".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateConfig {
    pub endpoint: String,
    pub history_days: i64,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_CLIMATE_ENDPOINT.to_string(),
            history_days: 365,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: String,
    pub schema: FeatureSchema,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_MODEL_PATH.to_string(),
            schema: FeatureSchema::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user_agent: format!("crop-advisor/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl AdvisorConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AdvisorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 檔案不存在時使用預設值（仍會替換環境變數）
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(
                "Config file {} not found, using defaults",
                path.as_ref().display()
            );
            let mut config = Self::default();
            config.weather.api_key = Self::substitute_env_vars(&config.weather.api_key)?;
            Ok(config)
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AdvisorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENWEATHER_API_KEY})；未設定的變數原樣保留
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AdvisorError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("geocoder.endpoint", &self.geocoder.endpoint)?;
        validation::validate_url("weather.endpoint", &self.weather.endpoint)?;
        validation::validate_url("soil.endpoint", &self.soil.endpoint)?;
        validation::validate_url("climate.endpoint", &self.climate.endpoint)?;

        validation::validate_resolved("weather.api_key", &self.weather.api_key)?;
        validation::validate_non_empty_string("soil.depth", &self.soil.depth)?;
        validation::validate_range("climate.history_days", self.climate.history_days, 1, 3650)?;

        validation::validate_path("model.path", &self.model.path)?;
        validation::validate_file_extension("model.path", &self.model.path, &["json"])?;

        validation::validate_range("http.timeout_seconds", self.http.timeout_seconds, 1, 60)?;
        validation::validate_non_empty_string("http.user_agent", &self.http.user_agent)?;

        Ok(())
    }
}

impl Validate for AdvisorConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
