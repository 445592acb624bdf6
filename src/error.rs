//! Error types for the fraud detection pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, FraudError>;

/// Errors raised by loading, training, evaluation and scoring.
#[derive(Error, Debug)]
pub enum FraudError {
    /// Dataset or artifact missing at the expected path
    #[error("{what} not found: {}", path.display())]
    NotFound { what: &'static str, path: PathBuf },

    /// Input table has unusable content
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Every parser attempt failed on an uploaded table
    #[error("could not parse table ({})", attempts.join("; "))]
    ParseFailed { attempts: Vec<String> },

    /// A column the operation needs is absent
    #[error("missing column `{0}`")]
    MissingColumn(String),

    /// Stratified folds cannot be formed
    #[error("class {class} has {count} rows, fewer than the {folds} folds required for stratification")]
    InsufficientClassRepresentation {
        class: u8,
        count: usize,
        folds: usize,
    },

    /// Metric cannot be computed for the given labels
    #[error("{metric} is undefined: {reason}")]
    UndefinedMetric {
        metric: &'static str,
        reason: String,
    },

    /// Classifier fit failed numerically
    #[error("training failed: {0}")]
    Training(String),

    /// Artifact exists but does not hold a fitted pipeline
    #[error("invalid artifact {}: {source}", path.display())]
    InvalidArtifact {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl FraudError {
    /// Shorthand for a missing dataset file
    pub fn dataset_not_found(path: impl Into<PathBuf>) -> Self {
        FraudError::NotFound {
            what: "dataset",
            path: path.into(),
        }
    }

    /// Shorthand for a missing model artifact
    pub fn artifact_not_found(path: impl Into<PathBuf>) -> Self {
        FraudError::NotFound {
            what: "model artifact",
            path: path.into(),
        }
    }

    /// Whether this is a missing-file error
    pub fn is_not_found(&self) -> bool {
        matches!(self, FraudError::NotFound { .. })
    }
}
