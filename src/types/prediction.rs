//! Thresholded fraud predictions

use serde::{Deserialize, Serialize};

/// Per-row fraud flags alongside the raw positive-class probabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagPrediction {
    /// 1 when the probability reaches the threshold, else 0
    pub flags: Vec<u8>,
    /// Positive-class probability per row, in row order
    pub probabilities: Vec<f64>,
}

impl FlagPrediction {
    /// Flag every probability `>= threshold`.
    ///
    /// The threshold is not validated: values above 1 flag nothing and
    /// values at or below 0 flag everything.
    pub fn from_probabilities(probabilities: Vec<f64>, threshold: f64) -> Self {
        let flags = probabilities
            .iter()
            .map(|&p| u8::from(p >= threshold))
            .collect();
        Self {
            flags,
            probabilities,
        }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Number of flagged rows
    pub fn flagged(&self) -> usize {
        self.flags.iter().filter(|&&f| f == 1).count()
    }
}
