//! Fraud Detection Pipeline Library
//!
//! Trains a class-balanced logistic regression on tabular transaction data
//! with stratified cross-validation, persists the fitted preprocessing and
//! classifier as one artifact, and scores new tables with it.

pub mod config;
pub mod cross_validation;
pub mod dataset;
pub mod error;
pub mod feature_extractor;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod scoring;
pub mod synthetic;
pub mod training;
pub mod types;

pub use config::AppConfig;
pub use error::{FraudError, Result};
pub use feature_extractor::{FeatureExtractor, FeatureSchema};
pub use models::{FraudModel, FraudPipeline};
pub use training::{evaluate, train_cv, CvReport, EvaluationReport};
pub use types::{FlagPrediction, Table, Value};
