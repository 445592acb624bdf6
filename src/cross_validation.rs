//! Stratified k-fold cross-validation splits

use crate::error::{FraudError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// One train/validation partition of row indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Seeded stratified k-fold splitter for binary labels
#[derive(Debug, Clone, Copy)]
pub struct StratifiedKFold {
    n_splits: usize,
    seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self { n_splits, seed }
    }

    /// Partition row indices into `n_splits` folds preserving the class ratio.
    ///
    /// Rows are shuffled with the fixed seed, then each class is dealt
    /// round-robin across the folds. Both classes need at least `n_splits`
    /// rows.
    pub fn split(&self, labels: &[u8]) -> Result<Vec<CvSplit>> {
        if self.n_splits < 2 {
            return Err(FraudError::MalformedInput(format!(
                "need at least 2 folds, got {}",
                self.n_splits
            )));
        }

        if let Some(bad) = labels.iter().find(|&&y| y > 1) {
            return Err(FraudError::MalformedInput(format!(
                "labels must be 0 or 1, got {}",
                bad
            )));
        }

        for class in [0u8, 1] {
            let count = labels.iter().filter(|&&y| y == class).count();
            if count < self.n_splits {
                return Err(FraudError::InsufficientClassRepresentation {
                    class,
                    count,
                    folds: self.n_splits,
                });
            }
        }

        let mut order: Vec<usize> = (0..labels.len()).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        order.shuffle(&mut rng);

        let mut fold_of = vec![0usize; labels.len()];
        let mut dealt = [0usize; 2];
        for &row in &order {
            let class = usize::from(labels[row]);
            fold_of[row] = dealt[class] % self.n_splits;
            dealt[class] += 1;
        }

        let splits = (0..self.n_splits)
            .map(|fold| {
                let (test_indices, train_indices): (Vec<usize>, Vec<usize>) =
                    (0..labels.len()).partition(|&row| fold_of[row] == fold);
                CvSplit {
                    train_indices,
                    test_indices,
                }
            })
            .collect();

        Ok(splits)
    }
}
