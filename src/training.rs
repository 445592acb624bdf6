//! Cross-validated training and evaluation of the fraud pipeline.
//!
//! Fold assignment uses a fixed seed so that identical input tables give
//! identical folds and metrics. Reported metrics always use a 0.5 threshold;
//! serving thresholds are chosen by the caller of
//! [`FraudModel::predict_flag`](crate::models::FraudModel::predict_flag).

use crate::config::TrainingConfig;
use crate::cross_validation::StratifiedKFold;
use crate::error::Result;
use crate::metrics::{self, ClassificationReport};
use crate::models::{loader, CvSummary, FraudPipeline, PipelineSpec};
use crate::types::Table;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span};

/// Number of cross-validation folds
pub const CV_FOLDS: usize = 5;
/// Fold shuffling seed
pub const CV_SEED: u64 = 42;
/// Probability threshold for F1 and the classification report
pub const REPORT_THRESHOLD: f64 = 0.5;

/// Validation metrics of one fold, or their mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FoldMetrics {
    pub pr_auc: f64,
    pub roc_auc: f64,
    pub f1: f64,
}

impl FoldMetrics {
    fn score(labels: &[u8], probabilities: &[f64]) -> Result<Self> {
        let predictions = metrics::apply_threshold(probabilities, REPORT_THRESHOLD);
        Ok(Self {
            pr_auc: metrics::average_precision(labels, probabilities)?,
            roc_auc: metrics::roc_auc(labels, probabilities)?,
            f1: metrics::f1_score(labels, &predictions),
        })
    }

    fn mean(folds: &[FoldMetrics]) -> Self {
        let n = folds.len() as f64;
        Self {
            pr_auc: folds.iter().map(|m| m.pr_auc).sum::<f64>() / n,
            roc_auc: folds.iter().map(|m| m.roc_auc).sum::<f64>() / n,
            f1: folds.iter().map(|m| m.f1).sum::<f64>() / n,
        }
    }
}

/// Per-fold and mean cross-validation metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CvReport {
    pub folds: Vec<FoldMetrics>,
    pub mean: FoldMetrics,
    /// Validation row indices of each fold
    #[serde(skip)]
    pub fold_indices: Vec<Vec<usize>>,
}

impl CvReport {
    pub fn summary(&self) -> CvSummary {
        CvSummary {
            folds: self.folds.len(),
            pr_auc: self.mean.pr_auc,
            roc_auc: self.mean.roc_auc,
            f1: self.mean.f1,
        }
    }
}

impl fmt::Display for CvReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PR-AUC: {:.3}", self.mean.pr_auc)?;
        writeln!(f, "ROC-AUC: {:.3}", self.mean.roc_auc)?;
        writeln!(f, "F1: {:.3}", self.mean.f1)
    }
}

/// Result of a full training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub report: CvReport,
    pub pipeline: FraudPipeline,
    pub artifact_path: PathBuf,
}

/// Stratified k-fold estimate of generalization metrics.
///
/// Each fold fits preprocessing and classifier on its training rows only.
pub fn cross_validate(table: &Table, label: &str, config: &TrainingConfig) -> Result<CvReport> {
    let labels = table.labels(label)?;
    let spec = PipelineSpec::from_table(table, label, config.classifier())?;
    let splits = StratifiedKFold::new(CV_FOLDS, CV_SEED).split(&labels)?;

    let mut folds = Vec::with_capacity(splits.len());
    let mut fold_indices = Vec::with_capacity(splits.len());

    for (fold, split) in splits.into_iter().enumerate() {
        let _span = info_span!("fold", fold = fold + 1).entered();

        let train = table.select_rows(&split.train_indices);
        let train_labels: Vec<u8> = split.train_indices.iter().map(|&i| labels[i]).collect();
        let validation = table.select_rows(&split.test_indices);
        let validation_labels: Vec<u8> = split.test_indices.iter().map(|&i| labels[i]).collect();

        let pipeline = spec.fit(&train, &train_labels)?;
        let probabilities = pipeline.predict_proba(&validation)?;
        let fold_metrics = FoldMetrics::score(&validation_labels, &probabilities)?;

        debug!(
            train_rows = train.len(),
            validation_rows = validation.len(),
            pr_auc = fold_metrics.pr_auc,
            roc_auc = fold_metrics.roc_auc,
            f1 = fold_metrics.f1,
            "Fold scored"
        );

        folds.push(fold_metrics);
        fold_indices.push(split.test_indices);
    }

    let mean = FoldMetrics::mean(&folds);
    info!(
        folds = folds.len(),
        pr_auc = mean.pr_auc,
        roc_auc = mean.roc_auc,
        f1 = mean.f1,
        "Cross-validation complete"
    );

    Ok(CvReport {
        folds,
        mean,
        fold_indices,
    })
}

/// Cross-validate, refit on every row, and persist the pipeline to `artifact_path`.
///
/// The cross-validation metrics are diagnostic only; the persisted pipeline is
/// always fit on the whole table.
pub fn train_cv(
    table: &Table,
    label: &str,
    config: &TrainingConfig,
    artifact_path: &Path,
) -> Result<TrainingOutcome> {
    info!(rows = table.len(), label, "Starting cross-validated training");

    let report = cross_validate(table, label, config)?;

    let labels = table.labels(label)?;
    let spec = PipelineSpec::from_table(table, label, config.classifier())?;
    let pipeline = spec
        .fit(table, &labels)?
        .with_cv_summary(report.summary());

    info!(
        features = pipeline.extractor().feature_count(),
        iterations = pipeline.classifier().iterations,
        converged = pipeline.classifier().converged,
        "Final pipeline fit on all rows"
    );

    loader::save(&pipeline, artifact_path)?;

    Ok(TrainingOutcome {
        report,
        pipeline,
        artifact_path: artifact_path.to_path_buf(),
    })
}

/// Metrics of a persisted pipeline on a labelled table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub roc_auc: f64,
    pub pr_auc: f64,
    pub report: ClassificationReport,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ROC-AUC: {}", self.roc_auc)?;
        writeln!(f, "PR-AUC: {}", self.pr_auc)?;
        write!(f, "{}", self.report)
    }
}

/// Load the pipeline at `artifact_path` and score it on `table`.
pub fn evaluate(table: &Table, label: &str, artifact_path: &Path) -> Result<EvaluationReport> {
    let pipeline = loader::load(artifact_path)?;
    let labels = table.labels(label)?;
    let probabilities = pipeline.predict_proba(table)?;
    let predictions = metrics::apply_threshold(&probabilities, REPORT_THRESHOLD);

    let report = EvaluationReport {
        roc_auc: metrics::roc_auc(&labels, &probabilities)?,
        pr_auc: metrics::average_precision(&labels, &probabilities)?,
        report: ClassificationReport::new(&labels, &predictions),
    };

    info!(
        rows = table.len(),
        roc_auc = report.roc_auc,
        pr_auc = report.pr_auc,
        accuracy = report.report.accuracy,
        "Evaluation complete"
    );
    Ok(report)
}
