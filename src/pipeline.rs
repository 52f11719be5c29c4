//! End-to-end training pipeline
//!
//! Composes the offline stages in their fixed order: clean → engineer →
//! train/select. Any stage failure aborts the run before artifacts are
//! persisted, so a failed run never leaves a partial model behind.

use crate::cleaning::{CleaningReport, DatasetCleaner};
use crate::error::Result;
use crate::features::{FeatureConfig, FeatureEngineer};
use crate::telemetry::RawTelemetry;
use crate::training::{ModelTrainer, TrainerConfig, TrainingOutcome};
use tracing::info;

/// Run the full offline pass over raw telemetry.
pub fn train_from_records(
    raw: &[RawTelemetry],
    feature_config: FeatureConfig,
    trainer_config: TrainerConfig,
) -> Result<(TrainingOutcome, CleaningReport)> {
    let (records, cleaning) = DatasetCleaner::new().clean(raw)?;
    let features = FeatureEngineer::new(feature_config).engineer(&records)?;
    let outcome = ModelTrainer::new(trainer_config).train(&features)?;
    info!(
        selected = outcome.report.selected.name(),
        test_rows = outcome.test_set.n_rows(),
        "training pipeline complete"
    );
    Ok((outcome, cleaning))
}
