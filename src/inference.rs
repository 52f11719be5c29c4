//! Single-point inference
//!
//! Applies a trained regressor to one feature vector and classifies the
//! resulting estimate. The loaded artifact is immutable and Arc-shared, so
//! one predictor can serve concurrent read-only callers; a schema failure
//! aborts only the offending call and leaves the artifact usable.

use crate::artifact::TrainedRegressor;
use crate::error::{CoolsenseError, Result};
use crate::features::{FeatureConfig, FeatureEngineer};
use crate::risk::{classify, RiskTier, Thresholds};
use crate::telemetry::{FeatureVector, InferenceInput};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Everything a dashboard or CLI collaborator renders for one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalAssessment {
    /// Predicted CPU temperature (°C); unbounded, reported as-is even when
    /// the model extrapolates outside the physical training range.
    pub estimate: f64,
    pub tier: RiskTier,
    pub recommendation: String,
    pub demand_score: u8,
}

/// Read-only predictor over a trained artifact.
#[derive(Debug, Clone)]
pub struct ThermalPredictor {
    model: Arc<TrainedRegressor>,
    engineer: FeatureEngineer,
    thresholds: Thresholds,
}

impl ThermalPredictor {
    pub fn new(model: Arc<TrainedRegressor>) -> Self {
        Self {
            model,
            engineer: FeatureEngineer::default(),
            thresholds: Thresholds::STANDARD,
        }
    }

    /// Load the artifact from disk and wrap it.
    pub fn from_artifact(path: impl AsRef<Path>) -> Result<Self> {
        let model = TrainedRegressor::load(path)?;
        Ok(Self::new(Arc::new(model)))
    }

    pub fn with_feature_config(mut self, config: FeatureConfig) -> Self {
        self.engineer = FeatureEngineer::new(config);
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn model(&self) -> &TrainedRegressor {
        &self.model
    }

    /// Predict one temperature estimate from a feature vector.
    ///
    /// The vector's schema must match the artifact's stored schema exactly;
    /// a mismatch (a model trained against different fields) fails this call
    /// without invalidating the artifact for later, correct calls.
    pub fn predict(&self, features: &FeatureVector) -> Result<f64> {
        self.check_schema()?;

        let values = features.to_array();
        let row = Array2::from_shape_vec((1, values.len()), values.to_vec())?;
        let predictions = self.model.predict(&row)?;
        let estimate = predictions[0];
        debug!(estimate, model = self.model.regressor.name(), "temperature predicted");
        Ok(estimate)
    }

    /// The full collaborator surface: derive features from raw inputs,
    /// predict, and classify in one call.
    pub fn assess(&self, input: &InferenceInput) -> Result<ThermalAssessment> {
        let features = self.engineer.engineer_single(input);
        let estimate = self.predict(&features)?;
        let risk = classify(estimate, &self.thresholds);
        Ok(ThermalAssessment {
            estimate,
            tier: risk.tier,
            recommendation: risk.recommendation,
            demand_score: risk.demand_score,
        })
    }

    fn check_schema(&self) -> Result<()> {
        let expected: Vec<&str> = self
            .model
            .feature_names
            .iter()
            .map(String::as_str)
            .collect();
        let actual = FeatureVector::names();
        if expected != actual {
            return Err(CoolsenseError::SchemaMismatch {
                expected: expected.join(", "),
                actual: actual.join(", "),
            });
        }
        Ok(())
    }
}
