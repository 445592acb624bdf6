//! Score a transactions CSV with the trained fraud pipeline.
//!
//! Appends `fraud_proba` and `fraud_flag` columns and writes the scored table
//! as CSV.

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};
use fraud_detection_pipeline::{
    config::AppConfig,
    dataset, logging, scoring, FraudError, FraudModel,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "score", about = "Flag likely fraudulent transactions in a CSV file")]
#[command(group(ArgGroup::new("source").required(true).args(["input", "default_dataset"])))]
struct Args {
    /// Configuration file; defaults to `config/config.toml` when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV to score (comma- or whitespace-separated)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Score the configured training dataset instead of an upload
    #[arg(long)]
    default_dataset: bool,

    /// Decision threshold in [0, 1]; defaults to the configured value
    #[arg(long, value_parser = parse_threshold)]
    threshold: Option<f64>,

    /// Destination of the scored CSV
    #[arg(long)]
    output: Option<PathBuf>,

    /// Rows to show in the preview; defaults to the configured value
    #[arg(long)]
    preview: Option<usize>,
}

fn parse_threshold(raw: &str) -> std::result::Result<f64, String> {
    let threshold: f64 = raw
        .parse()
        .map_err(|_| format!("`{}` is not a number", raw))?;
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(format!("threshold must be within [0, 1], got {}", threshold))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load_or_default(args.config.as_deref())?;
    logging::init(&config.logging, "score")?;

    let threshold = args.threshold.unwrap_or(config.serving.threshold);
    let preview_rows = args.preview.unwrap_or(config.serving.preview_rows);
    let model_path = &config.artifacts.model_path;

    let model = match FraudModel::load(model_path) {
        Ok(model) => model,
        Err(FraudError::NotFound { .. }) => bail!(
            "Model not found at {}. Train first with `cargo run --bin fraud-detection-pipeline`",
            model_path.display()
        ),
        Err(e) => return Err(e).context("Failed to load model"),
    };
    info!(
        run_id = %model.metadata().run_id,
        trained_at = %model.metadata().trained_at,
        "Model loaded"
    );

    let (table, default_output) = match &args.input {
        Some(input) => (
            scoring::read_upload(input)
                .with_context(|| format!("Failed to read {}", input.display()))?,
            "predictions.csv",
        ),
        None => (
            dataset::load_dataset(&config.data.dataset_path).with_context(|| {
                format!(
                    "Failed to load dataset from {}",
                    config.data.dataset_path.display()
                )
            })?,
            "predictions_default.csv",
        ),
    };

    let scored = scoring::score_table(&model, table, threshold).context("Scoring failed")?;
    let flagged = scored
        .column(scoring::FLAG_COLUMN)?
        .iter()
        .filter(|v| v.as_number() == Some(1.0))
        .count();

    println!("{}", scoring::preview(&scored, preview_rows));
    println!();
    println!(
        "Flagged {} of {} transactions at threshold {:.2}",
        flagged,
        scored.len(),
        threshold
    );

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(default_output));
    dataset::save_csv(&scored, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Predictions saved → {}", output.display());

    Ok(())
}
