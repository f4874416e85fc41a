use crate::config::toml_config::AdvisorConfig;
use crate::domain::model::FeatureSchema;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "crop-advisor")]
#[command(about = "Recommend a crop from a location's current weather and soil")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "crop-advisor.toml")]
    pub config: String,

    /// Override the feature schema the model was trained on
    #[arg(long)]
    pub schema: Option<FeatureSchema>,

    /// Override the model artifact path
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the full pipeline and print the recommended crop
    Predict { address: String },
    /// Fetch and print the environment data without predicting
    Inspect { address: String },
    /// Print daily climate history for a location
    History {
        address: String,
        /// Number of days back from today
        #[arg(long)]
        days: Option<i64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl CliConfig {
    /// 命令列參數覆蓋 TOML 設定
    pub fn apply_overrides(&self, config: &mut AdvisorConfig) {
        if let Some(schema) = self.schema {
            tracing::info!("🔧 Feature schema overridden to: {}", schema);
            config.model.schema = schema;
        }
        if let Some(model) = &self.model {
            tracing::info!("🔧 Model path overridden to: {}", model);
            config.model.path = model.clone();
        }
        if let Some(Command::History { days: Some(days), .. }) = &self.command {
            config.climate.history_days = *days;
        }
    }
}
