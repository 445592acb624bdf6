//! Configuration management for the fraud detection pipeline

use crate::models::LogisticConfig;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    pub data: DataConfig,
    pub artifacts: ArtifactConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub serving: ServingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dataset location
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DataConfig {
    /// CSV used for training and the "score default dataset" action
    pub dataset_path: PathBuf,
    /// Binary label column
    #[serde(default = "default_label_column")]
    pub label_column: String,
}

fn default_label_column() -> String {
    "Class".to_string()
}

/// Persisted outputs of a training run
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ArtifactConfig {
    /// Fitted pipeline file
    pub model_path: PathBuf,
    /// JSON copy of the cross-validation and evaluation metrics
    #[serde(default)]
    pub metrics_path: Option<PathBuf>,
}

/// Classifier settings; fold count and seed are fixed in [`crate::training`]
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
    /// Maximum optimizer iterations
    pub max_iter: usize,
    /// Gradient tolerance for convergence
    pub tolerance: f64,
    /// Inverse L2 regularization strength
    pub regularization: f64,
}

impl TrainingConfig {
    /// Balanced logistic regression settings
    pub fn classifier(&self) -> LogisticConfig {
        LogisticConfig {
            max_iter: self.max_iter,
            tolerance: self.tolerance,
            regularization: self.regularization,
            balanced: true,
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let classifier = LogisticConfig::default();
        Self {
            max_iter: classifier.max_iter,
            tolerance: classifier.tolerance,
            regularization: classifier.regularization,
        }
    }
}

/// Scoring settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServingConfig {
    /// Default decision threshold in [0, 1]
    pub threshold: f64,
    /// Rows shown in the scoring preview
    pub preview_rows: usize,
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            preview_rows: 20,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path, or defaults if it is absent
    pub fn load() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        if path.exists() {
            Self::load_from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load `explicit` if given, failing when it is absent; otherwise [`AppConfig::load`]
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display())),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                dataset_path: PathBuf::from("data/creditcard.csv"),
                label_column: default_label_column(),
            },
            artifacts: ArtifactConfig {
                model_path: PathBuf::from("artifacts/model.bin"),
                metrics_path: Some(PathBuf::from("artifacts/metrics.json")),
            },
            training: TrainingConfig::default(),
            serving: ServingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
