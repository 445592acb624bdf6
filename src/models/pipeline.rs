//! Preprocessing plan and classifier composed into one fit/predict unit

use crate::error::Result;
use crate::feature_extractor::{FeatureExtractor, FeatureSchema, FittedExtractor};
use crate::models::logistic::{FittedLogistic, LogisticConfig, LogisticRegression};
use crate::types::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unfitted pipeline: a preprocessing plan paired with a classifier
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    extractor: FeatureExtractor,
    classifier: LogisticRegression,
}

impl PipelineSpec {
    pub fn new(extractor: FeatureExtractor, classifier: LogisticRegression) -> Self {
        Self {
            extractor,
            classifier,
        }
    }

    /// Build the plan from `table`'s columns and pair it with a classifier.
    pub fn from_table(table: &Table, label: &str, config: LogisticConfig) -> Result<Self> {
        Ok(Self::new(
            FeatureExtractor::from_table(table, label)?,
            LogisticRegression::new(config),
        ))
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.extractor.schema()
    }

    /// Fit preprocessing statistics and the classifier on `table` only.
    pub fn fit(&self, table: &Table, labels: &[u8]) -> Result<FraudPipeline> {
        let extractor = self.extractor.fit(table)?;
        let features = extractor.transform(table)?;
        let classifier = self.classifier.fit(features.view(), labels)?;

        Ok(FraudPipeline {
            extractor,
            classifier,
            metadata: PipelineMetadata::new(labels),
        })
    }
}

/// Summary of cross-validation recorded alongside a fitted pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CvSummary {
    pub folds: usize,
    pub pr_auc: f64,
    pub roc_auc: f64,
    pub f1: f64,
}

/// Provenance of a fitted pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineMetadata {
    /// Unique training run identifier
    pub run_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub rows: usize,
    pub positives: usize,
    pub cv: Option<CvSummary>,
}

impl PipelineMetadata {
    fn new(labels: &[u8]) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            rows: labels.len(),
            positives: labels.iter().filter(|&&y| y == 1).count(),
            cv: None,
        }
    }
}

/// Frozen preprocessing plan plus trained classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudPipeline {
    extractor: FittedExtractor,
    classifier: FittedLogistic,
    metadata: PipelineMetadata,
}

impl FraudPipeline {
    /// Positive-class probability for every row of `table`, in row order.
    pub fn predict_proba(&self, table: &Table) -> Result<Vec<f64>> {
        let features = self.extractor.transform(table)?;
        Ok(self.classifier.predict_proba(features.view()).to_vec())
    }

    /// Attach a cross-validation summary before persisting.
    pub fn with_cv_summary(mut self, summary: CvSummary) -> Self {
        self.metadata.cv = Some(summary);
        self
    }

    pub fn extractor(&self) -> &FittedExtractor {
        &self.extractor
    }

    pub fn classifier(&self) -> &FittedLogistic {
        &self.classifier
    }

    pub fn metadata(&self) -> &PipelineMetadata {
        &self.metadata
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.extractor.schema()
    }
}
