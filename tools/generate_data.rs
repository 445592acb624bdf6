//! Synthetic Dataset Generator
//!
//! Writes an imbalanced credit-card transactions CSV for local training runs.
//!
//! Usage: generate_data [output_path] [rows] [fraud_ratio] [seed]

use anyhow::{Context, Result};
use fraud_detection_pipeline::{
    config::AppConfig,
    dataset, logging,
    synthetic::{self, SyntheticConfig},
};
use std::path::PathBuf;
use tracing::info;

fn main() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.logging, "generate_data")?;

    info!("Starting synthetic dataset generation");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let defaults = SyntheticConfig::default();
    let output = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.data.dataset_path.clone());
    let generator = SyntheticConfig {
        rows: args.get(2).and_then(|s| s.parse().ok()).unwrap_or(defaults.rows),
        fraud_ratio: args
            .get(3)
            .and_then(|s| s.parse().ok())
            .filter(|r: &f64| (0.0..=1.0).contains(r))
            .unwrap_or(defaults.fraud_ratio),
        seed: args.get(4).and_then(|s| s.parse().ok()).unwrap_or(defaults.seed),
    };

    info!(
        output = %output.display(),
        rows = generator.rows,
        fraud_ratio = generator.fraud_ratio,
        seed = generator.seed,
        "Configuration loaded"
    );

    let table = synthetic::generate_transactions(&generator)?;
    let fraud_cases = table
        .labels(synthetic::LABEL_COLUMN)?
        .iter()
        .filter(|&&y| y == 1)
        .count();

    dataset::save_csv(&table, &output)
        .with_context(|| format!("Failed to write dataset to {}", output.display()))?;

    println!("Dataset saved at {}", output.display());
    println!("Shape: ({}, {})", table.len(), table.columns().len());
    println!("Fraud cases: {}", fraud_cases);
    println!("Columns: {:?}", table.columns());

    Ok(())
}
