//! Fraud Detection Pipeline - Training Entry Point
//!
//! Loads the configured dataset, cross-validates and fits the pipeline,
//! persists the artifact, then evaluates the persisted artifact.

use anyhow::{Context, Result};
use fraud_detection_pipeline::{
    config::AppConfig, dataset, logging, training, CvReport, EvaluationReport,
};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Metrics written next to the artifact
#[derive(Serialize)]
struct MetricsFile<'a> {
    run_id: String,
    cross_validation: &'a CvReport,
    evaluation: &'a EvaluationReport,
}

fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    logging::init(&config.logging, "fraud_detection_pipeline")?;
    info!("Starting Fraud Detection Pipeline training");

    let label = config.data.label_column.as_str();
    let model_path = config.artifacts.model_path.as_path();

    let table = dataset::load_dataset(&config.data.dataset_path).with_context(|| {
        format!(
            "Failed to load dataset from {}",
            config.data.dataset_path.display()
        )
    })?;

    let outcome = training::train_cv(&table, label, &config.training, model_path)
        .context("Cross-validated training failed")?;
    print!("{}", outcome.report);
    println!("Model saved → {}", outcome.artifact_path.display());

    let evaluation =
        training::evaluate(&table, label, model_path).context("Evaluation failed")?;
    print!("{}", evaluation);

    if let Some(metrics_path) = &config.artifacts.metrics_path {
        let metrics = MetricsFile {
            run_id: outcome.pipeline.metadata().run_id.to_string(),
            cross_validation: &outcome.report,
            evaluation: &evaluation,
        };
        write_metrics(metrics_path, &metrics)?;
        info!(path = %metrics_path.display(), "Metrics written");
    }

    Ok(())
}

fn write_metrics(path: &Path, metrics: &MetricsFile<'_>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(metrics)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write metrics to {}", path.display()))
}
