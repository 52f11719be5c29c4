//! Random forest regressor
//!
//! Bagged regression trees. Each tree gets its own ChaCha8 RNG seeded from
//! the base seed plus its index, so fitting may run across rayon workers in
//! any order and still produce identical forests; aggregation is a plain mean
//! over trees, which is order-independent.

use crate::error::{CoolsenseError, Result};
use crate::training::tree::RegressionTree;
use ndarray::{Array1, Array2, Axis};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random forest of regression trees with bootstrap sampling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<RegressionTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub seed: u64,
    importances: Option<Array1<f64>>,
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_leaf: 1,
            seed: 42,
            importances: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit all trees; parallel across trees, deterministic per seed.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(CoolsenseError::ShapeError {
                expected: format!("{} targets", n_samples),
                actual: format!("{} targets", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(CoolsenseError::ValidationError(
                "cannot fit a forest on zero samples".to_string(),
            ));
        }

        let trees: Result<Vec<RegressionTree>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(tree_idx as u64));

                // Bootstrap sample with replacement.
                let sample: Vec<usize> = (0..n_samples)
                    .map(|_| (rng.next_u64() % n_samples as u64) as usize)
                    .collect();

                let x_boot = x.select(Axis(0), &sample);
                let y_boot: Array1<f64> =
                    Array1::from_vec(sample.iter().map(|&i| y[i]).collect());

                let mut tree = RegressionTree::new()
                    .with_min_samples_leaf(self.min_samples_leaf);
                if let Some(depth) = self.max_depth {
                    tree = tree.with_max_depth(depth);
                }
                tree.fit(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect();

        self.trees = trees?;
        self.importances = self.average_importances(x.ncols());
        Ok(())
    }

    fn average_importances(&self, n_features: usize) -> Option<Array1<f64>> {
        if self.trees.is_empty() {
            return None;
        }
        let mut totals = Array1::zeros(n_features);
        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                totals = totals + imp;
            }
        }
        let sum = totals.sum();
        if sum > 0.0 {
            totals /= sum;
        }
        Some(totals)
    }

    /// Mean prediction over all trees.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(CoolsenseError::ModelNotFitted);
        }

        let per_tree: Result<Vec<Array1<f64>>> =
            self.trees.par_iter().map(|tree| tree.predict(x)).collect();
        let per_tree = per_tree?;

        let n = x.nrows();
        let predictions: Vec<f64> = (0..n)
            .map(|i| per_tree.iter().map(|p| p[i]).sum::<f64>() / per_tree.len() as f64)
            .collect();
        Ok(Array1::from_vec(predictions))
    }

    /// Importances averaged over trees, normalized to sum to 1.
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.importances.as_ref()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ramp_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((30, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(30, |i| i as f64 * 2.0 + 1.0);
        (x, y)
    }

    #[test]
    fn test_fits_monotone_ramp() {
        let (x, y) = ramp_data();
        let mut forest = RandomForestRegressor::new(20).with_seed(42);
        forest.fit(&x, &y).unwrap();

        let preds = forest.predict(&x).unwrap();
        let mse: f64 = preds
            .iter()
            .zip(y.iter())
            .map(|(p, t)| (p - t).powi(2))
            .sum::<f64>()
            / y.len() as f64;
        assert!(mse < 10.0, "MSE too high: {mse}");
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = ramp_data();
        let probe = array![[7.5], [21.3]];

        let mut a = RandomForestRegressor::new(15).with_seed(7);
        a.fit(&x, &y).unwrap();
        let mut b = RandomForestRegressor::new(15).with_seed(7);
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&probe).unwrap(), b.predict(&probe).unwrap());
    }

    #[test]
    fn test_different_seed_usually_differs() {
        let (x, y) = ramp_data();
        let probe = array![[13.7]];

        let mut a = RandomForestRegressor::new(15).with_seed(1);
        a.fit(&x, &y).unwrap();
        let mut b = RandomForestRegressor::new(15).with_seed(2);
        b.fit(&x, &y).unwrap();

        // Not guaranteed in principle, but bootstrap draws differ.
        assert_ne!(a.predict(&probe).unwrap(), b.predict(&probe).unwrap());
    }

    #[test]
    fn test_predict_before_fit_errors() {
        let forest = RandomForestRegressor::new(5);
        assert!(matches!(
            forest.predict(&array![[1.0]]).unwrap_err(),
            CoolsenseError::ModelNotFitted
        ));
    }

    #[test]
    fn test_importances_normalized() {
        let (x, y) = ramp_data();
        let mut forest = RandomForestRegressor::new(10).with_seed(42);
        forest.fit(&x, &y).unwrap();
        let imp = forest.feature_importances().unwrap();
        assert!((imp.sum() - 1.0).abs() < 1e-9);
    }
}
