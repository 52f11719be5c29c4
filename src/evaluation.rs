//! Held-out evaluation
//!
//! Scores a trained artifact against the test partition persisted at training
//! time — the same rows, never re-split — so reported numbers are directly
//! comparable across runs of the same dataset.

use crate::artifact::{TestPartition, TrainedRegressor};
use crate::error::{CoolsenseError, Result};
use crate::training::RegressionMetrics;
use serde::{Deserialize, Serialize};
use tracing::info;

/// R² above this marks the model as high-accuracy.
const HIGH_ACCURACY_R2: f64 = 0.90;

/// Evaluation result over the persisted held-out rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    pub n_samples: usize,
    /// Whether the model clears the high-accuracy bar (R² > 0.90).
    pub high_accuracy: bool,
}

/// Evaluate a trained regressor on its held-out test partition.
///
/// The partition must carry the same feature schema the model was trained
/// against; evaluating a model against another run's partition is a
/// [`CoolsenseError::SchemaMismatch`].
pub fn evaluate(model: &TrainedRegressor, test_set: &TestPartition) -> Result<EvaluationReport> {
    if model.feature_names != test_set.feature_names {
        return Err(CoolsenseError::SchemaMismatch {
            expected: model.feature_names.join(", "),
            actual: test_set.feature_names.join(", "),
        });
    }

    let y_pred = model.predict(&test_set.matrix)?;
    let metrics = RegressionMetrics::compute(&test_set.targets, &y_pred);

    let report = EvaluationReport {
        mae: metrics.mae,
        rmse: metrics.rmse,
        r2: metrics.r2,
        n_samples: metrics.n_samples,
        high_accuracy: metrics.r2 > HIGH_ACCURACY_R2,
    };
    info!(
        mae = report.mae,
        rmse = report.rmse,
        r2 = report.r2,
        high_accuracy = report.high_accuracy,
        "held-out evaluation complete"
    );
    Ok(report)
}
