//! Training engine: fit candidates, score, select
//!
//! Splits the feature set into train/test partitions with a seeded shuffle,
//! fits every configured candidate on the train partition, scores each on the
//! held-out partition by R², and additionally cross-validates each candidate
//! over the full set for a stability read. The highest test R² wins; ties go
//! to the earliest-declared candidate, so reruns on identical input and seed
//! always select the same model.

use crate::artifact::{RegressorKind, TestPartition, TrainedRegressor};
use crate::error::{CoolsenseError, Result};
use crate::features::FeatureSet;
use crate::training::boosting::{BoostingConfig, GradientBoostedRegressor};
use crate::training::config::{CandidateKind, TrainerConfig};
use crate::training::cross_validation::{CvScores, KFold};
use crate::training::forest::RandomForestRegressor;
use crate::training::linear::LinearRegression;
use crate::training::metrics::RegressionMetrics;
use chrono::Utc;
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::info;

/// Scores for one fitted candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateReport {
    pub kind: CandidateKind,
    /// Metrics on the held-out test partition
    pub metrics: RegressionMetrics,
    /// K-fold R² over the full feature set
    pub cv: CvScores,
    pub training_time_secs: f64,
}

/// Every candidate's scores plus which one was selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionReport {
    pub candidates: Vec<CandidateReport>,
    pub selected: CandidateKind,
}

/// Result of a training run: the production model, the exact held-out rows,
/// and the full comparison report.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: TrainedRegressor,
    pub test_set: TestPartition,
    pub report: SelectionReport,
}

impl TrainingOutcome {
    /// Persist both artifacts of the run: the selected model and the exact
    /// test partition, so later evaluation reuses the same held-out rows.
    pub fn persist(
        &self,
        model_path: impl AsRef<std::path::Path>,
        test_set_path: impl AsRef<std::path::Path>,
    ) -> Result<()> {
        self.model.save(model_path)?;
        self.test_set.save(test_set_path)?;
        Ok(())
    }
}

/// Fits candidate regressors and selects the production model.
#[derive(Debug, Clone, Default)]
pub struct ModelTrainer {
    config: TrainerConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Run the full train/evaluate/select pass.
    pub fn train(&self, features: &FeatureSet) -> Result<TrainingOutcome> {
        if self.config.candidates.is_empty() {
            return Err(CoolsenseError::ValidationError(
                "no candidate models configured".to_string(),
            ));
        }

        let (train_idx, test_idx) = self.split_indices(features.n_rows())?;
        let x_train = features.matrix.select(Axis(0), &train_idx);
        let x_test = features.matrix.select(Axis(0), &test_idx);
        let y_train: Array1<f64> =
            Array1::from_vec(train_idx.iter().map(|&i| features.targets[i]).collect());
        let y_test: Array1<f64> =
            Array1::from_vec(test_idx.iter().map(|&i| features.targets[i]).collect());

        // R² is meaningless on a constant target; refuse to score it.
        let distinct = distinct_targets(&y_train);
        if distinct < 2 {
            return Err(CoolsenseError::DegenerateTrainingSet { distinct });
        }

        let mut candidates = Vec::with_capacity(self.config.candidates.len());
        let mut fitted: Vec<RegressorKind> = Vec::with_capacity(self.config.candidates.len());

        for &kind in &self.config.candidates {
            let start = Instant::now();
            let regressor = self.fit_candidate(kind, &x_train, &y_train)?;
            let elapsed = start.elapsed().as_secs_f64();

            let y_pred = regressor.predict(&x_test)?;
            let metrics = RegressionMetrics::compute(&y_test, &y_pred);
            let cv = self.cross_validate(kind, &features.matrix, &features.targets)?;

            info!(
                candidate = kind.name(),
                test_r2 = metrics.r2,
                cv_r2_mean = cv.mean,
                cv_r2_std = cv.std,
                "candidate scored"
            );

            candidates.push(CandidateReport {
                kind,
                metrics,
                cv,
                training_time_secs: elapsed,
            });
            fitted.push(regressor);
        }

        // Strict greater-than keeps the earliest candidate on ties.
        let mut best = 0;
        for (i, report) in candidates.iter().enumerate().skip(1) {
            if report.metrics.r2 > candidates[best].metrics.r2 {
                best = i;
            }
        }
        let selected = candidates[best].kind;
        info!(selected = selected.name(), test_r2 = candidates[best].metrics.r2, "model selected");

        let model = TrainedRegressor {
            regressor: fitted.swap_remove(best),
            feature_names: features.feature_names.clone(),
            trained_at: Utc::now(),
            metrics: candidates[best].metrics.clone(),
        };
        let test_set = TestPartition {
            matrix: x_test,
            targets: y_test,
            feature_names: features.feature_names.clone(),
        };

        Ok(TrainingOutcome {
            model,
            test_set,
            report: SelectionReport {
                candidates,
                selected,
            },
        })
    }

    /// Seeded shuffle split. Relative order inside each partition follows the
    /// shuffle, which is fully determined by the seed.
    fn split_indices(&self, n_samples: usize) -> Result<(Vec<usize>, Vec<usize>)> {
        let test_size = (n_samples as f64 * self.config.test_fraction).round() as usize;
        let train_size = n_samples - test_size;
        if test_size == 0 || train_size < 2 {
            return Err(CoolsenseError::ValidationError(format!(
                "{} rows cannot support a {:.0}% held-out split",
                n_samples,
                self.config.test_fraction * 100.0
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        indices.shuffle(&mut rng);

        let test_idx = indices.split_off(train_size);
        Ok((indices, test_idx))
    }

    fn fit_candidate(
        &self,
        kind: CandidateKind,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<RegressorKind> {
        match kind {
            CandidateKind::LinearRegression => {
                let mut model = LinearRegression::new();
                model.fit(x, y)?;
                Ok(RegressorKind::Linear(model))
            }
            CandidateKind::RandomForest => {
                let mut model = RandomForestRegressor::new(self.config.n_estimators)
                    .with_seed(self.config.seed);
                if let Some(depth) = self.config.max_depth {
                    model = model.with_max_depth(depth);
                }
                model.fit(x, y)?;
                Ok(RegressorKind::Forest(model))
            }
            CandidateKind::GradientBoosting => {
                let mut model = GradientBoostedRegressor::new(BoostingConfig {
                    n_estimators: self.config.n_estimators,
                    learning_rate: self.config.learning_rate,
                    max_depth: self.config.max_depth.unwrap_or(4),
                    seed: self.config.seed,
                    ..Default::default()
                });
                model.fit(x, y)?;
                Ok(RegressorKind::Boosted(model))
            }
        }
    }

    /// K-fold R² over the full set, fresh model per fold.
    fn cross_validate(
        &self,
        kind: CandidateKind,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<CvScores> {
        let folds = KFold::new(self.config.cv_folds, self.config.seed).split(x.nrows())?;
        let mut scores = Vec::with_capacity(folds.len());

        for fold in &folds {
            let x_train = x.select(Axis(0), &fold.train_indices);
            let x_test = x.select(Axis(0), &fold.test_indices);
            let y_train: Array1<f64> =
                Array1::from_vec(fold.train_indices.iter().map(|&i| y[i]).collect());
            let y_test: Array1<f64> =
                Array1::from_vec(fold.test_indices.iter().map(|&i| y[i]).collect());

            let model = self.fit_candidate(kind, &x_train, &y_train)?;
            let y_pred = model.predict(&x_test)?;
            scores.push(RegressionMetrics::compute(&y_test, &y_pred).r2);
        }
        Ok(CvScores::from_scores(scores))
    }
}

fn distinct_targets(y: &Array1<f64>) -> usize {
    y.iter().map(|v| v.to_bits()).collect::<HashSet<_>>().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::FEATURE_NAMES;

    fn synthetic_features(n: usize) -> FeatureSet {
        // Temperature roughly follows usage plus lag, with a small wiggle so
        // no candidate fits perfectly.
        let matrix = Array2::from_shape_fn((n, FEATURE_NAMES.len()), |(i, j)| match j {
            0 => 30.0 + (i % 50) as f64,          // CPU_Usage
            1 => 3000.0 + (i % 7) as f64 * 100.0, // CPU_Frequency
            2 => 40.0 + (i % 30) as f64,          // Memory_Usage
            3 => 50.0,                            // Disk_Usage
            4 => 150.0 + (i % 20) as f64,         // Process_Count
            5 => 1200.0,                          // Thread_Count
            6 => 40.0 + (i % 10) as f64,          // GPU_Temperature
            7 => 25.0 + ((i as f64) * 0.3).sin(), // Ambient_Temperature
            8 => 12.0,                            // Voltage
            9 => (30.0 + (i % 50) as f64) * 0.1,  // Current_Load
            _ => 45.0 + (i % 50) as f64 * 0.4,    // Prev_CPU_Temperature
        });
        let targets = Array1::from_shape_fn(n, |i| {
            40.0 + (i % 50) as f64 * 0.5 + ((i as f64) * 0.7).sin()
        });
        FeatureSet {
            matrix,
            targets,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_training_selects_and_partitions() {
        let features = synthetic_features(100);
        let trainer = ModelTrainer::new(TrainerConfig::default().with_n_estimators(20));
        let outcome = trainer.train(&features).unwrap();

        assert_eq!(outcome.report.candidates.len(), 3);
        assert_eq!(outcome.test_set.n_rows(), 20);
        assert_eq!(outcome.model.feature_names.len(), 11);

        // The selected candidate carries the best test R².
        let best_r2 = outcome
            .report
            .candidates
            .iter()
            .map(|c| c.metrics.r2)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(outcome.model.metrics.r2, best_r2);
    }

    #[test]
    fn test_rerun_is_deterministic() {
        let features = synthetic_features(80);
        let trainer = ModelTrainer::new(TrainerConfig::default().with_n_estimators(15));

        let a = trainer.train(&features).unwrap();
        let b = trainer.train(&features).unwrap();

        assert_eq!(a.report.selected, b.report.selected);
        for (ca, cb) in a.report.candidates.iter().zip(b.report.candidates.iter()) {
            assert!((ca.metrics.r2 - cb.metrics.r2).abs() < 1e-12);
        }
        assert_eq!(a.test_set.targets, b.test_set.targets);
    }

    #[test]
    fn test_degenerate_targets_rejected() {
        let mut features = synthetic_features(50);
        features.targets.fill(55.0);
        let trainer = ModelTrainer::new(TrainerConfig::default());
        let err = trainer.train(&features).unwrap_err();
        assert!(matches!(
            err,
            CoolsenseError::DegenerateTrainingSet { distinct: 1 }
        ));
    }

    #[test]
    fn test_tiny_dataset_rejected() {
        let features = synthetic_features(3);
        let trainer = ModelTrainer::new(TrainerConfig::default());
        assert!(trainer.train(&features).is_err());
    }

    #[test]
    fn test_candidate_subset_respected() {
        let features = synthetic_features(60);
        let trainer = ModelTrainer::new(
            TrainerConfig::default().with_candidates(vec![CandidateKind::LinearRegression]),
        );
        let outcome = trainer.train(&features).unwrap();
        assert_eq!(outcome.report.selected, CandidateKind::LinearRegression);
        assert!(matches!(outcome.model.regressor, RegressorKind::Linear(_)));
    }
}
