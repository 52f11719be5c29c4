//! K-fold cross-validation

use crate::error::{CoolsenseError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// One train/validation fold.
#[derive(Debug, Clone)]
pub struct Fold {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Seeded, shuffled k-fold splitter.
#[derive(Debug, Clone)]
pub struct KFold {
    pub n_splits: usize,
    pub seed: u64,
}

impl KFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self { n_splits, seed }
    }

    /// Partition `0..n_samples` into `n_splits` folds. Every index appears in
    /// exactly one test set; fold sizes differ by at most one.
    pub fn split(&self, n_samples: usize) -> Result<Vec<Fold>> {
        if self.n_splits < 2 {
            return Err(CoolsenseError::ValidationError(
                "k-fold needs at least 2 splits".to_string(),
            ));
        }
        if n_samples < self.n_splits {
            return Err(CoolsenseError::ValidationError(format!(
                "{} samples cannot fill {} folds",
                n_samples, self.n_splits
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let base = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut cursor = 0;
        for fold_idx in 0..self.n_splits {
            let size = base + usize::from(fold_idx < remainder);
            let test_indices = indices[cursor..cursor + size].to_vec();
            let train_indices = indices[..cursor]
                .iter()
                .chain(indices[cursor + size..].iter())
                .copied()
                .collect();
            folds.push(Fold {
                train_indices,
                test_indices,
            });
            cursor += size;
        }
        Ok(folds)
    }
}

/// Aggregated fold scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvScores {
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl CvScores {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        Self {
            scores,
            mean,
            std: variance.sqrt(),
        }
    }
}
