//! Model training
//!
//! Candidate regressors (linear, random forest, gradient boosting), k-fold
//! cross-validation, and the selection engine that turns a feature set into a
//! production model plus a held-out test partition.

pub mod boosting;
pub mod config;
pub mod cross_validation;
pub mod forest;
pub mod linear;
pub mod metrics;
pub mod tree;
mod trainer;

pub use boosting::{BoostingConfig, GradientBoostedRegressor};
pub use config::{CandidateKind, TrainerConfig};
pub use cross_validation::{CvScores, Fold, KFold};
pub use forest::RandomForestRegressor;
pub use linear::LinearRegression;
pub use metrics::RegressionMetrics;
pub use trainer::{CandidateReport, ModelTrainer, SelectionReport, TrainingOutcome};
pub use tree::RegressionTree;
