//! Persisted training artifacts
//!
//! Two artifacts leave a training run: the selected regressor (an opaque JSON
//! blob — the only compatibility contract is that the feature schema at load
//! time equals the schema at save time) and the exact held-out test partition
//! (CSV, feature columns plus the target), so later evaluation reuses the
//! same rows instead of re-splitting.
//!
//! A `TrainedRegressor` is never mutated after training; consumers share it
//! read-only, and a new training run produces a replacement artifact.

use crate::error::{CoolsenseError, Result};
use crate::telemetry::TARGET_COLUMN;
use crate::training::boosting::GradientBoostedRegressor;
use crate::training::forest::RandomForestRegressor;
use crate::training::linear::LinearRegression;
use crate::training::metrics::RegressionMetrics;
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::info;

/// The fitted regressor variants a training run can select.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegressorKind {
    Linear(LinearRegression),
    Forest(RandomForestRegressor),
    Boosted(GradientBoostedRegressor),
}

impl RegressorKind {
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            RegressorKind::Linear(model) => model.predict(x),
            RegressorKind::Forest(model) => model.predict(x),
            RegressorKind::Boosted(model) => model.predict(x),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RegressorKind::Linear(_) => "linear_regression",
            RegressorKind::Forest(_) => "random_forest",
            RegressorKind::Boosted(_) => "gradient_boosting",
        }
    }
}

/// The selected model plus the schema and metrics it was trained against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedRegressor {
    pub regressor: RegressorKind,
    /// Feature schema at fit time; inference inputs must match it exactly.
    pub feature_names: Vec<String>,
    pub trained_at: DateTime<Utc>,
    /// Metrics on the held-out test partition at training time.
    pub metrics: RegressionMetrics,
}

impl TrainedRegressor {
    /// Predict a batch whose columns follow `feature_names` order.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.feature_names.len() {
            return Err(CoolsenseError::ShapeError {
                expected: format!("{} feature columns", self.feature_names.len()),
                actual: format!("{} feature columns", x.ncols()),
            });
        }
        self.regressor.predict(x)
    }

    /// Persist as an opaque JSON blob.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), model = self.regressor.name(), "model artifact saved");
        Ok(())
    }

    /// Load a previously saved artifact.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoolsenseError::MissingArtifact {
                path: path.to_path_buf(),
                hint: "no model artifact found; run a training pass first".to_string(),
            });
        }
        let json = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&json)?;
        Ok(model)
    }
}

/// The held-out test partition reserved at training time. Schema-identical to
/// the training feature set, never seen by the fitted model.
#[derive(Debug, Clone)]
pub struct TestPartition {
    pub matrix: Array2<f64>,
    pub targets: Array1<f64>,
    pub feature_names: Vec<String>,
}

impl TestPartition {
    pub fn n_rows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Persist as CSV: one column per feature plus the target column.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut columns: Vec<Column> = self
            .feature_names
            .iter()
            .enumerate()
            .map(|(col, name)| {
                let values: Vec<f64> = self.matrix.column(col).to_vec();
                Column::new(name.as_str().into(), values)
            })
            .collect();
        columns.push(Column::new(TARGET_COLUMN.into(), self.targets.to_vec()));

        let mut df = DataFrame::new(columns)?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file).finish(&mut df)?;
        info!(path = %path.display(), rows = self.n_rows(), "test partition saved");
        Ok(())
    }

    /// Load a persisted partition, expecting exactly the given schema.
    pub fn load(path: impl AsRef<Path>, feature_names: &[String]) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoolsenseError::MissingArtifact {
                path: path.to_path_buf(),
                hint: "no test partition found; run a training pass first".to_string(),
            });
        }

        let file = File::open(path)?;
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .into_reader_with_file_handle(file)
            .finish()?;

        let n_rows = df.height();
        let mut matrix = Array2::zeros((n_rows, feature_names.len()));
        for (col, name) in feature_names.iter().enumerate() {
            let values = numeric_column(&df, name)?;
            for (row, value) in values.into_iter().enumerate() {
                matrix[[row, col]] = value;
            }
        }
        let targets = Array1::from_vec(numeric_column(&df, TARGET_COLUMN)?);

        Ok(Self {
            matrix,
            targets,
            feature_names: feature_names.to_vec(),
        })
    }
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| CoolsenseError::ColumnNotFound(name.to_string()))?;
    let as_f64 = column.cast(&DataType::Float64)?;
    as_f64
        .f64()
        .map_err(|e| CoolsenseError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| {
            v.ok_or_else(|| {
                CoolsenseError::DataError(format!("null value in persisted column {name}"))
            })
        })
        .collect()
}
