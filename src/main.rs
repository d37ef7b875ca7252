use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use stock_price_predictor::analytics::summarize;
use stock_price_predictor::ml::{RegressionPipeline, SharedPipeline, TrainingSet};
use stock_price_predictor::{BarSeries, Frame, PipelineConfig};

#[derive(Parser)]
#[command(name = "stock-price-predictor")]
#[command(version = "0.1.0")]
#[command(about = "Indicator features and boosted-tree price regression over OHLCV bars", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pipeline configuration file (TOML); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on a bar file and report in-sample and hold-out metrics
    Train {
        /// JSON object of columns: Open, High, Low, Close, Volume
        #[arg(short, long)]
        data: PathBuf,
    },
    /// Train on one bar file, then predict for every bar of another
    Predict {
        /// Bars used for training
        #[arg(short, long)]
        train: PathBuf,
        /// Bars to predict for
        #[arg(short, long)]
        bars: PathBuf,
    },
    /// Print the model description as JSON
    Describe,
    /// Return, volatility and trend statistics for a bar file
    Summary {
        #[arg(short, long)]
        data: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_directive(cli.verbose)));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Train { data } => {
            run_train(config, &data).await?;
        }
        Commands::Predict { train, bars } => {
            run_predict(config, &train, &bars).await?;
        }
        Commands::Describe => {
            let pipeline = RegressionPipeline::new(config)?;
            println!("{}", serde_json::to_string_pretty(&pipeline.describe())?);
        }
        Commands::Summary { data } => {
            let series = load_series(&data)?;
            println!("{}", serde_json::to_string_pretty(&summarize(&series))?);
        }
    }

    Ok(())
}

fn default_log_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn load_series(path: &Path) -> Result<BarSeries> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let frame: Frame = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    let series = BarSeries::from_frame(&frame)?;
    info!("Loaded {} bars from {}", series.len(), path.display());
    Ok(series)
}

fn training_set(config: &PipelineConfig, series: &BarSeries) -> Result<TrainingSet> {
    let mut set = TrainingSet::from_series(series, config.training.target_horizon)?;
    if config.training.drop_warmup {
        let trimmed = set.without_warmup();
        if trimmed.is_empty() {
            warn!("Series too short to drop warm-up rows; training on all {} rows", set.len());
        } else {
            set = trimmed;
        }
    }
    Ok(set)
}

async fn run_train(config: PipelineConfig, data: &Path) -> Result<()> {
    let series = load_series(data)?;
    let set = training_set(&config, &series)?;
    let (train, test) = set.chronological_split(config.training.test_fraction)?;

    let shared = SharedPipeline::new(RegressionPipeline::new(config)?);
    let metrics = shared.train(train.features, train.target).await?;

    println!("\n=== Training ===");
    println!("Samples:  {}", metrics.sample_count);
    println!("Features: {}", metrics.feature_count);
    println!("R2:       {:.4}", metrics.r2);
    println!("RMSE:     {:.4}", metrics.rmse);
    println!("MAE:      {:.4}", metrics.mae);
    for warning in &metrics.warnings {
        println!("Warning:  {}", warning);
    }

    if test.is_empty() {
        warn!("No hold-out rows; skipping evaluation");
    } else {
        let eval = shared.evaluate(test.features, test.target).await?;
        println!("\n=== Hold-out ===");
        println!("RMSE:     {:.4}", eval.rmse);
        println!("MAE:      {:.4}", eval.mae);
        println!("R2:       {:.4}", eval.r2);
        if let Some(mape) = eval.mape {
            println!("MAPE:     {:.2}%", mape * 100.0);
        }
    }

    println!("\n=== Feature importance ===");
    for (name, score) in shared.feature_importance().await? {
        println!("{:<16} {:.4}", name, score);
    }

    Ok(())
}

async fn run_predict(config: PipelineConfig, train: &Path, bars: &Path) -> Result<()> {
    let series = load_series(train)?;
    let set = training_set(&config, &series)?;

    let shared = SharedPipeline::new(RegressionPipeline::new(config)?);
    shared.train(set.features, set.target).await?;

    let target = load_series(bars)?;
    let predictions = shared.predict(target.to_frame()).await?;
    println!("{}", serde_json::to_string_pretty(&predictions)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_switches_log_directive() {
        assert_eq!(default_log_directive(false), "info");
        assert_eq!(default_log_directive(true), "debug");
        // both directives must parse as filters
        for verbose in [false, true] {
            assert!(EnvFilter::try_new(default_log_directive(verbose)).is_ok());
        }
    }

    #[test]
    fn test_cli_parses_train_command() {
        let cli = Cli::try_parse_from(["stock-price-predictor", "-v", "train", "--data", "bars.json"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Train { data } if data == PathBuf::from("bars.json")));
    }
}
