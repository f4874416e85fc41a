use chrono::{Duration, Local};
use clap::Parser;
use crop_advisor::adapters::{http, NasaPowerClimate};
use crop_advisor::config::{Command, OutputFormat};
use crop_advisor::domain::model::{
    ClimateSummary, DataSource, EnvironmentReport, PipelineStage, Recommendation,
};
use crop_advisor::domain::ports::ClimateSource;
use crop_advisor::utils::error::{ErrorSeverity, PipelineError, SourceFailure};
use crop_advisor::utils::{logger, validation::Validate};
use crop_advisor::{AdvisorConfig, CliConfig, HttpCropPipeline, PipelineFailure, PredictionEngine};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const EXIT_PIPELINE_FAILURE: i32 = 2;

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting crop-advisor");
    tracing::debug!("CLI args: {:?}", cli);

    let mut config = match AdvisorConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(e.severity()));
        }
    };
    cli.apply_overrides(&mut config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(exit_code(e.severity()));
    }

    // 模型只載入一次；失敗時進入降級模式
    let engine = Arc::new(PredictionEngine::load(&config.model.path));
    if !engine.is_available() {
        tracing::warn!("⚠️ Running without a model: lookups work, predictions are refused");
    }

    let pipeline = match HttpCropPipeline::from_config(&config, engine) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(e.severity()));
        }
    };

    let ok = match &cli.command {
        Some(Command::Predict { address }) => predict(&pipeline, address, cli.output).await,
        Some(Command::Inspect { address }) => inspect(&pipeline, address, cli.output).await,
        Some(Command::History { address, .. }) => history(&pipeline, &config, address, cli.output).await?,
        None => {
            interactive(&pipeline, cli.output).await?;
            true
        }
    };

    if !ok {
        std::process::exit(EXIT_PIPELINE_FAILURE);
    }
    Ok(())
}

async fn predict(pipeline: &HttpCropPipeline, address: &str, output: OutputFormat) -> bool {
    match pipeline.run(address).await {
        Ok(recommendation) => {
            render_recommendation(&recommendation, output);
            true
        }
        Err(failure) => {
            render_failure(&failure, output);
            false
        }
    }
}

async fn inspect(pipeline: &HttpCropPipeline, address: &str, output: OutputFormat) -> bool {
    match pipeline.survey(address).await {
        Ok(report) => {
            render_report(&report, output);
            true
        }
        Err(failure) => {
            render_failure(&failure, output);
            false
        }
    }
}

async fn history(
    pipeline: &HttpCropPipeline,
    config: &AdvisorConfig,
    address: &str,
    output: OutputFormat,
) -> Result<bool, Box<dyn std::error::Error>> {
    let coords = match pipeline.locate(address).await {
        Ok(coords) => coords,
        Err(failure) => {
            render_failure(&failure, output);
            return Ok(false);
        }
    };

    let end = Local::now().date_naive();
    let start = end - Duration::days(config.climate.history_days);
    let climate = NasaPowerClimate::new(
        http::build_client(&config.http)?,
        config.climate.endpoint.clone(),
    );

    match climate.fetch_history(coords, start, end).await {
        Ok(history) => {
            render_climate(&history.summarize(coords, start, end), output);
            Ok(true)
        }
        Err(e) => {
            tracing::error!("Error fetching historical weather data: {}", e);
            let failure = PipelineFailure {
                stage: PipelineStage::FetchingEnvironment,
                error: PipelineError::EnvironmentDataUnavailable {
                    failures: vec![SourceFailure {
                        source: DataSource::Climate,
                        cause: e.to_string(),
                    }],
                },
            };
            render_failure(&failure, output);
            Ok(false)
        }
    }
}

async fn interactive(
    pipeline: &HttpCropPipeline,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🌾 Real-time Crop Predictor");
    if let Some(reason) = pipeline.engine().unavailable_reason() {
        println!("⚠️ Model not loaded ({}). Predictions are disabled.", reason);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("Enter location (e.g., Ibadan, Nigeria): ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let address = line.trim();
        if address.is_empty() {
            continue;
        }
        if matches!(address, "quit" | "exit") {
            break;
        }

        predict(pipeline, address, output).await;
    }
    Ok(())
}

fn render_report_text(report: &EnvironmentReport) {
    println!("📍 Coordinates: {}", report.coordinates);
    println!("📊 Fetched Data");
    println!("- Temperature (°C): {}", report.weather.temperature);
    println!("- Humidity (%): {}", report.weather.humidity);
    println!("- Rainfall (mm): {}", report.weather.rainfall);
    if let Some(soil) = &report.soil {
        println!("- Soil pH: {}", soil.ph);
    }
}

fn render_report(report: &EnvironmentReport, output: OutputFormat) {
    match output {
        OutputFormat::Text => render_report_text(report),
        OutputFormat::Json => print_json(report),
    }
}

fn render_recommendation(recommendation: &Recommendation, output: OutputFormat) {
    match output {
        OutputFormat::Text => {
            render_report_text(&recommendation.report);
            println!("🤖 Predicted Crop: {}", recommendation.prediction.label);
        }
        OutputFormat::Json => print_json(recommendation),
    }
}

fn render_climate(summary: &ClimateSummary, output: OutputFormat) {
    match output {
        OutputFormat::Text => {
            println!("📍 Coordinates: {}", summary.coordinates);
            println!(
                "📜 Historical weather ({} to {}, {} days)",
                summary.start, summary.end, summary.days
            );
            if let Some(mean) = summary.mean_temperature {
                println!("- Mean temperature (°C): {:.1}", mean);
            }
            if let Some(total) = summary.total_rainfall {
                println!("- Total rainfall (mm): {:.1}", total);
            }
        }
        OutputFormat::Json => print_json(summary),
    }
}

fn render_failure(failure: &PipelineFailure, output: OutputFormat) {
    match output {
        OutputFormat::Text => eprintln!("❌ {}", failure.user_friendly_message()),
        OutputFormat::Json => print_json(&serde_json::json!({
            "error": failure.error.to_string(),
            "stage": failure.stage,
        })),
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Could not serialize output: {}", e),
    }
}
