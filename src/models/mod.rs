//! Classifier, fitted pipeline, artifact persistence and inference

pub mod inference;
pub mod loader;
pub mod logistic;
pub mod pipeline;

pub use inference::FraudModel;
pub use logistic::{FittedLogistic, LogisticConfig, LogisticRegression};
pub use pipeline::{CvSummary, FraudPipeline, PipelineMetadata, PipelineSpec};
