//! Feature engineering
//!
//! Expands cleaned telemetry into the 11-field feature schema the regressor
//! expects. Three of those fields are not sensed and are derived here:
//!
//! - `Ambient_Temperature`: in batch mode, a position-indexed sinusoid over
//!   the dataset (one full cycle across the sequence). This is a modeling
//!   assumption, not a measurement — it will not generalize to live
//!   telemetry, and single-point inference uses a configured constant instead.
//! - `Voltage`: a configured constant (supply rail is not instrumented).
//! - `Current_Load`: a linear proxy for electrical draw, always computed from
//!   CPU usage and never caller-supplied.
//!
//! `Prev_CPU_Temperature` is the lag-1 target in batch mode, which costs the
//! first row of every sequence; at inference time the caller supplies it.

use crate::error::{CoolsenseError, Result};
use crate::telemetry::{FeatureVector, InferenceInput, TelemetryRecord, FEATURE_NAMES};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Scale factor from CPU usage (percent) to the current-load proxy (amps).
pub const LOAD_PER_USAGE: f64 = 0.1;

/// Environmental constants injected into feature derivation.
///
/// These are process-wide constants in spirit, but held as configuration so
/// tests and deployments with real environmental sensing can vary them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Mean ambient temperature (°C); also the single-point default.
    pub ambient_baseline: f64,
    /// Peak deviation of the synthetic ambient sinusoid (°C).
    pub ambient_amplitude: f64,
    /// Assumed supply voltage (V).
    pub voltage: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            ambient_baseline: 25.0,
            ambient_amplitude: 3.0,
            voltage: 12.0,
        }
    }
}

/// Feature matrix plus aligned targets, ready for training.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    /// Row-major matrix, one column per [`FEATURE_NAMES`] entry.
    pub matrix: Array2<f64>,
    /// Target temperature per row.
    pub targets: Array1<f64>,
    /// Schema the matrix columns follow.
    pub feature_names: Vec<String>,
}

impl FeatureSet {
    pub fn n_rows(&self) -> usize {
        self.matrix.nrows()
    }
}

/// Derives the model's feature schema from telemetry.
#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer {
    config: FeatureConfig,
}

impl FeatureEngineer {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Batch mode: expand a cleaned sequence into feature rows.
    ///
    /// The ambient sinusoid is indexed by position over the *input* length N,
    /// so the derivation is bit-for-bit reproducible given the same record
    /// count and ordering. The first record has no lag and is dropped after
    /// derivation: N input records yield exactly N−1 feature rows.
    pub fn engineer(&self, records: &[TelemetryRecord]) -> Result<FeatureSet> {
        if records.len() < 2 {
            return Err(CoolsenseError::ValidationError(format!(
                "need at least 2 records to derive the lag feature, got {}",
                records.len()
            )));
        }

        let n = records.len();
        let n_rows = n - 1;
        let mut matrix = Array2::zeros((n_rows, FEATURE_NAMES.len()));
        let mut targets = Array1::zeros(n_rows);

        for (row, i) in (1..n).enumerate() {
            let rec = &records[i];
            let ambient = self.ambient_at(i, n);
            let prev_temp = records[i - 1].cpu_temperature;
            let features = [
                rec.cpu_usage,
                rec.cpu_frequency,
                rec.memory_usage,
                rec.disk_usage,
                rec.process_count,
                rec.thread_count,
                rec.gpu_temperature,
                ambient,
                self.config.voltage,
                rec.cpu_usage * LOAD_PER_USAGE,
                prev_temp,
            ];
            for (col, value) in features.into_iter().enumerate() {
                matrix[[row, col]] = value;
            }
            targets[row] = rec.cpu_temperature;
        }

        debug!(rows_in = n, rows_out = n_rows, "feature matrix derived");

        Ok(FeatureSet {
            matrix,
            targets,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Single-row mode for inference: no sequence context exists, so the lag
    /// is caller-supplied and ambient/voltage fall back to config defaults.
    pub fn engineer_single(&self, input: &InferenceInput) -> FeatureVector {
        FeatureVector {
            cpu_usage: input.cpu_usage,
            cpu_frequency: input.cpu_frequency,
            memory_usage: input.memory_usage,
            disk_usage: input.disk_usage,
            process_count: input.process_count,
            thread_count: input.thread_count,
            gpu_temperature: input.gpu_temperature,
            ambient_temperature: input
                .ambient_temperature
                .unwrap_or(self.config.ambient_baseline),
            voltage: input.voltage.unwrap_or(self.config.voltage),
            current_load: input.cpu_usage * LOAD_PER_USAGE,
            prev_cpu_temperature: input.prev_cpu_temperature,
        }
    }

    /// Synthetic ambient temperature at position `i` of an `n`-record
    /// sequence: one full sinusoid cycle across the dataset.
    fn ambient_at(&self, i: usize, n: usize) -> f64 {
        let phase = 2.0 * PI * (i as f64) / (n as f64);
        self.config.ambient_baseline + self.config.ambient_amplitude * phase.sin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<TelemetryRecord> {
        (0..n)
            .map(|i| TelemetryRecord {
                cpu_usage: 10.0 + i as f64,
                cpu_frequency: 3000.0,
                memory_usage: 40.0,
                disk_usage: 50.0,
                process_count: 150.0,
                thread_count: 1200.0,
                gpu_temperature: 45.0,
                cpu_temperature: 50.0 + i as f64,
            })
            .collect()
    }

    #[test]
    fn test_batch_drops_first_row() {
        let set = FeatureEngineer::default().engineer(&records(10)).unwrap();
        assert_eq!(set.n_rows(), 9);
        assert_eq!(set.targets.len(), 9);
        assert_eq!(set.matrix.ncols(), 11);
    }

    #[test]
    fn test_lag_is_previous_target() {
        let recs = records(5);
        let set = FeatureEngineer::default().engineer(&recs).unwrap();
        // Row 0 corresponds to input record 1; its lag is record 0's target.
        let lag_col = FEATURE_NAMES.len() - 1;
        for row in 0..set.n_rows() {
            assert_eq!(set.matrix[[row, lag_col]], recs[row].cpu_temperature);
        }
    }

    #[test]
    fn test_current_load_exact() {
        let recs = records(4);
        let set = FeatureEngineer::default().engineer(&recs).unwrap();
        let load_col = 9;
        for row in 0..set.n_rows() {
            let usage = set.matrix[[row, 0]];
            assert!((set.matrix[[row, load_col]] - usage * 0.1).abs() < 1e-9);
        }
    }

    #[test]
    fn test_ambient_sinusoid_reproducible_and_bounded() {
        let engineer = FeatureEngineer::default();
        let recs = records(50);
        let a = engineer.engineer(&recs).unwrap();
        let b = engineer.engineer(&recs).unwrap();
        assert_eq!(a.matrix, b.matrix);

        let ambient_col = 7;
        for row in 0..a.n_rows() {
            let v = a.matrix[[row, ambient_col]];
            assert!((22.0..=28.0).contains(&v), "ambient out of band: {v}");
        }
        // One full cycle: position n/4 of the sequence sits near the +3 peak.
        let quarter = 50 / 4 - 1; // row index = record index - 1
        assert!(a.matrix[[quarter, ambient_col]] > 27.5);
    }

    #[test]
    fn test_single_point_defaults() {
        let engineer = FeatureEngineer::default();
        let input = InferenceInput {
            cpu_usage: 90.0,
            cpu_frequency: 3500.0,
            memory_usage: 85.0,
            disk_usage: 70.0,
            process_count: 250.0,
            thread_count: 2800.0,
            gpu_temperature: 55.0,
            prev_cpu_temperature: 65.0,
            ambient_temperature: None,
            voltage: None,
        };
        let fv = engineer.engineer_single(&input);
        assert_eq!(fv.ambient_temperature, 25.0);
        assert_eq!(fv.voltage, 12.0);
        assert!((fv.current_load - 9.0).abs() < 1e-9);
        assert_eq!(fv.prev_cpu_temperature, 65.0);
    }

    #[test]
    fn test_single_point_caller_overrides() {
        let engineer = FeatureEngineer::new(FeatureConfig {
            ambient_baseline: 22.0,
            ambient_amplitude: 1.0,
            voltage: 11.5,
        });
        let input = InferenceInput {
            cpu_usage: 10.0,
            cpu_frequency: 2000.0,
            memory_usage: 20.0,
            disk_usage: 30.0,
            process_count: 80.0,
            thread_count: 400.0,
            gpu_temperature: 35.0,
            prev_cpu_temperature: 42.0,
            ambient_temperature: Some(30.0),
            voltage: None,
        };
        let fv = engineer.engineer_single(&input);
        assert_eq!(fv.ambient_temperature, 30.0); // caller wins
        assert_eq!(fv.voltage, 11.5); // config default
    }

    #[test]
    fn test_too_short_sequence_rejected() {
        let err = FeatureEngineer::default().engineer(&records(1)).unwrap_err();
        assert!(matches!(err, CoolsenseError::ValidationError(_)));
    }
}
