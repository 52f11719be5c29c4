//! Regression tree
//!
//! CART-style binary tree minimizing within-node variance. Split scanning
//! keeps running sum / sum-of-squares accumulators per side so each candidate
//! threshold is scored in one pass, and features are scanned in parallel.

use crate::error::{CoolsenseError, Result};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A fitted tree node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
        n_samples: usize,
    },
}

/// Regression tree with variance-reduction splits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    root: Option<Node>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    n_features: usize,
    importances: Option<Array1<f64>>,
}

impl Default for RegressionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RegressionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            n_features: 0,
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

    /// Fit the tree.
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
                "cannot fit a tree on zero samples".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.grow(x, y, &indices, 0, &mut importances));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.importances = Some(Array1::from_vec(importances));
        Ok(())
    }

    fn grow(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
    ) -> Node {
        let n = indices.len();
        let (sum, sq_sum) = moments(y, indices);
        let mean = sum / n as f64;
        let variance = sq_sum / n as f64 - mean * mean;

        let at_depth_limit = self.max_depth.map_or(false, |d| depth >= d);
        if n < self.min_samples_split || at_depth_limit || variance < 1e-12 {
            return Node::Leaf {
                value: mean,
                n_samples: n,
            };
        }

        let Some(split) = self.best_split(x, y, indices, variance) else {
            return Node::Leaf {
                value: mean,
                n_samples: n,
            };
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, split.feature]] <= split.threshold);

        if left_idx.len() < self.min_samples_leaf || right_idx.len() < self.min_samples_leaf {
            return Node::Leaf {
                value: mean,
                n_samples: n,
            };
        }

        importances[split.feature] += n as f64 * split.gain;

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.grow(x, y, &left_idx, depth + 1, importances)),
            right: Box::new(self.grow(x, y, &right_idx, depth + 1, importances)),
            n_samples: n,
        }
    }

    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        parent_variance: f64,
    ) -> Option<SplitCandidate> {
        let n = indices.len() as f64;

        (0..self.n_features)
            .into_par_iter()
            .filter_map(|feature| {
                // Sort sample indices by feature value; thresholds are the
                // midpoints between consecutive distinct values.
                let mut order: Vec<usize> = indices.to_vec();
                order.sort_by(|&a, &b| {
                    x[[a, feature]]
                        .partial_cmp(&x[[b, feature]])
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

                let total_sum: f64 = order.iter().map(|&i| y[i]).sum();
                let total_sq: f64 = order.iter().map(|&i| y[i] * y[i]).sum();

                let mut left_count = 0usize;
                let mut left_sum = 0.0;
                let mut left_sq = 0.0;
                let mut best: Option<SplitCandidate> = None;

                for window in 0..order.len() - 1 {
                    let idx = order[window];
                    let yi = y[idx];
                    left_count += 1;
                    left_sum += yi;
                    left_sq += yi * yi;

                    let here = x[[idx, feature]];
                    let next = x[[order[window + 1], feature]];
                    if here == next {
                        continue;
                    }

                    let right_count = order.len() - left_count;
                    if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                        continue;
                    }

                    let left_var = variance_from(left_count, left_sum, left_sq);
                    let right_var = variance_from(
                        right_count,
                        total_sum - left_sum,
                        total_sq - left_sq,
                    );
                    let weighted =
                        (left_count as f64 * left_var + right_count as f64 * right_var) / n;
                    let gain = parent_variance - weighted;

                    if gain > best.as_ref().map_or(0.0, |b| b.gain) {
                        best = Some(SplitCandidate {
                            feature,
                            threshold: (here + next) / 2.0,
                            gain,
                        });
                    }
                }
                best
            })
            .max_by(|a, b| a.gain.partial_cmp(&b.gain).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Predict one row per input sample.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(CoolsenseError::ModelNotFitted)?;
        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let mut node = root;
                loop {
                    match node {
                        Node::Leaf { value, .. } => return *value,
                        Node::Split {
                            feature,
                            threshold,
                            left,
                            right,
                            ..
                        } => {
                            node = if x[[i, *feature]] <= *threshold {
                                left
                            } else {
                                right
                            };
                        }
                    }
                }
            })
            .collect();
        Ok(Array1::from_vec(predictions))
    }

    /// Normalized variance-reduction importances.
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.importances.as_ref()
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        self.root.as_ref().map_or(0, walk)
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

fn moments(y: &Array1<f64>, indices: &[usize]) -> (f64, f64) {
    indices.iter().fold((0.0, 0.0), |(s, sq), &i| {
        (s + y[i], sq + y[i] * y[i])
    })
}

fn variance_from(count: usize, sum: f64, sq_sum: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    (sq_sum / n - (sum / n).powi(2)).max(0.0)
}
