//! Trainer configuration

use serde::{Deserialize, Serialize};

/// Candidate regression algorithms the trainer may fit.
///
/// Declaration order in [`TrainerConfig::candidates`] is the tie-break order:
/// when two candidates score equal test R², the earlier one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateKind {
    LinearRegression,
    RandomForest,
    GradientBoosting,
}

impl CandidateKind {
    pub fn name(&self) -> &'static str {
        match self {
            CandidateKind::LinearRegression => "linear_regression",
            CandidateKind::RandomForest => "random_forest",
            CandidateKind::GradientBoosting => "gradient_boosting",
        }
    }
}

/// Configuration for a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Fraction of rows held out for the test partition
    pub test_fraction: f64,

    /// Seed for the split shuffle and all candidate RNGs
    pub seed: u64,

    /// Number of cross-validation folds
    pub cv_folds: usize,

    /// Candidates to fit, in selection-tie-break order
    pub candidates: Vec<CandidateKind>,

    /// Trees per ensemble candidate
    pub n_estimators: usize,

    /// Depth cap for tree-based candidates (None = unlimited for the forest)
    pub max_depth: Option<usize>,

    /// Shrinkage for the boosting candidate
    pub learning_rate: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            cv_folds: 5,
            candidates: vec![
                CandidateKind::LinearRegression,
                CandidateKind::RandomForest,
                CandidateKind::GradientBoosting,
            ],
            n_estimators: 100,
            max_depth: Some(8),
            learning_rate: 0.1,
        }
    }
}

impl TrainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<CandidateKind>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }
}
