//! Fitted pipeline artifact persistence

use crate::error::{FraudError, Result};
use crate::models::pipeline::FraudPipeline;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Serialize `pipeline` to `path`, creating parent directories.
///
/// An existing artifact is overwritten; concurrent writers are not coordinated.
pub fn save<P: AsRef<Path>>(pipeline: &FraudPipeline, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, pipeline).map_err(|source| {
        FraudError::InvalidArtifact {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush()?;

    info!(
        path = %path.display(),
        run_id = %pipeline.metadata().run_id,
        features = pipeline.extractor().feature_count(),
        "Model saved"
    );
    Ok(())
}

/// Load a fitted pipeline from `path`.
pub fn load<P: AsRef<Path>>(path: P) -> Result<FraudPipeline> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(FraudError::artifact_not_found(path));
    }

    let bytes = fs::read(path)?;
    let pipeline: FraudPipeline =
        bincode::deserialize(&bytes).map_err(|source| FraudError::InvalidArtifact {
            path: path.to_path_buf(),
            source,
        })?;

    info!(
        path = %path.display(),
        run_id = %pipeline.metadata().run_id,
        trained_at = %pipeline.metadata().trained_at,
        "Model loaded"
    );
    Ok(pipeline)
}
