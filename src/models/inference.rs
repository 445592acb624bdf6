//! Read-only inference over a persisted fraud pipeline

use crate::error::Result;
use crate::models::loader;
use crate::models::pipeline::{FraudPipeline, PipelineMetadata};
use crate::types::{FlagPrediction, Table};
use std::path::Path;
use tracing::debug;

/// Fraud scorer backed by a fitted pipeline loaded from storage
pub struct FraudModel {
    pipeline: FraudPipeline,
}

impl FraudModel {
    /// Load the pipeline at `path`; fails if the file is absent or invalid.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            pipeline: loader::load(path)?,
        })
    }

    /// Wrap an in-memory pipeline
    pub fn from_pipeline(pipeline: FraudPipeline) -> Self {
        Self { pipeline }
    }

    pub fn metadata(&self) -> &PipelineMetadata {
        self.pipeline.metadata()
    }

    /// Positive-class probability per row, in row order
    pub fn predict_proba(&self, table: &Table) -> Result<Vec<f64>> {
        let probabilities = self.pipeline.predict_proba(table)?;
        debug!(rows = probabilities.len(), "Scored table");
        Ok(probabilities)
    }

    /// Flag rows whose probability is `>= threshold`.
    ///
    /// The threshold is not range-checked: out-of-range values flag all or nothing.
    pub fn predict_flag(&self, table: &Table, threshold: f64) -> Result<FlagPrediction> {
        let probabilities = self.predict_proba(table)?;
        let prediction = FlagPrediction::from_probabilities(probabilities, threshold);
        debug!(
            rows = prediction.len(),
            flagged = prediction.flagged(),
            threshold,
            "Flagged table"
        );
        Ok(prediction)
    }
}
