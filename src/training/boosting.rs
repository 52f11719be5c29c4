//! Gradient-boosted regression trees
//!
//! Stagewise residual fitting: start from the target mean, then repeatedly
//! fit a shallow tree to the current residuals and fold it in scaled by the
//! learning rate. Row and column subsampling per round use a Xoshiro RNG so
//! runs with the same seed are identical.

use crate::error::Result;
use crate::training::tree::RegressionTree;
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Boosting hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingConfig {
    /// Number of boosting rounds
    pub n_estimators: usize,
    /// Shrinkage applied to each tree's contribution
    pub learning_rate: f64,
    /// Depth cap per tree
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Row fraction per round
    pub subsample: f64,
    /// Column fraction per round
    pub colsample: f64,
    /// Seed for row/column draws
    pub seed: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 4,
            min_samples_leaf: 1,
            subsample: 0.8,
            colsample: 0.8,
            seed: 42,
        }
    }
}

/// Gradient-boosted tree ensemble for regression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedRegressor {
    config: BoostingConfig,
    base_prediction: f64,
    rounds: Vec<BoostingRound>,
    importances: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BoostingRound {
    tree: RegressionTree,
    /// Columns the round's tree was fitted on, in selection order.
    columns: Vec<usize>,
}

impl GradientBoostedRegressor {
    pub fn new(config: BoostingConfig) -> Self {
        Self {
            config,
            base_prediction: 0.0,
            rounds: Vec::new(),
            importances: Vec::new(),
        }
    }

    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        self.base_prediction = y.mean().unwrap_or(0.0);
        self.importances = vec![0.0; n_features];
        self.rounds = Vec::with_capacity(self.config.n_estimators);

        let mut predictions = Array1::from_elem(n_samples, self.base_prediction);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);

        for _ in 0..self.config.n_estimators {
            let residuals: Array1<f64> = y
                .iter()
                .zip(predictions.iter())
                .map(|(yi, pi)| yi - pi)
                .collect();

            let rows = draw_indices(n_samples, self.config.subsample, &mut rng);
            let columns = draw_indices(n_features, self.config.colsample, &mut rng);

            let x_round = x.select(Axis(0), &rows).select(Axis(1), &columns);
            let r_round: Array1<f64> =
                Array1::from_vec(rows.iter().map(|&i| residuals[i]).collect());

            let mut tree = RegressionTree::new()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf);
            tree.fit(&x_round, &r_round)?;

            // Fold the round into running predictions over the full set.
            let x_full = x.select(Axis(1), &columns);
            let round_pred = tree.predict(&x_full)?;
            for i in 0..n_samples {
                predictions[i] += self.config.learning_rate * round_pred[i];
            }

            if let Some(imp) = tree.feature_importances() {
                for (local, &col) in columns.iter().enumerate() {
                    self.importances[col] += imp[local];
                }
            }

            self.rounds.push(BoostingRound { tree, columns });
        }

        let total: f64 = self.importances.iter().sum();
        if total > 0.0 {
            for imp in &mut self.importances {
                *imp /= total;
            }
        }
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let n = x.nrows();
        let mut predictions = Array1::from_elem(n, self.base_prediction);

        for round in &self.rounds {
            let x_round = x.select(Axis(1), &round.columns);
            let round_pred = round.tree.predict(&x_round)?;
            for i in 0..n {
                predictions[i] += self.config.learning_rate * round_pred[i];
            }
        }
        Ok(predictions)
    }

    /// Accumulated, normalized importances across rounds.
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn n_rounds(&self) -> usize {
        self.rounds.len()
    }
}

/// Draw a sorted sample of `fraction * n` indices without replacement.
fn draw_indices(n: usize, fraction: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
    let k = ((n as f64) * fraction).ceil().max(1.0) as usize;
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(k.min(n));
    indices.sort_unstable();
    indices
}
