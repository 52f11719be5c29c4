//! Telemetry data model
//!
//! Defines the raw observation as read from the input table, the cleaned
//! record the pipeline operates on, and the fixed 11-field feature vector the
//! regression model consumes. The feature schema (names and order) is part of
//! the trained model's contract: a persisted model is only valid against the
//! exact schema it was fitted with.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Target column name in the input table and persisted test set.
pub const TARGET_COLUMN: &str = "CPU_Temperature";

/// Physically plausible CPU temperature range; targets outside are discarded.
pub const TARGET_RANGE: (f64, f64) = (20.0, 100.0);

/// Sensor columns required in the raw input table, case-sensitive.
pub const SENSOR_COLUMNS: [&str; 7] = [
    "CPU_Usage",
    "CPU_Frequency",
    "Memory_Usage",
    "Disk_Usage",
    "Process_Count",
    "Thread_Count",
    "GPU_Temperature",
];

/// The 11 model input features, in the exact order the regressor is trained
/// against. Order and names are load-bearing.
pub const FEATURE_NAMES: [&str; 11] = [
    "CPU_Usage",
    "CPU_Frequency",
    "Memory_Usage",
    "Disk_Usage",
    "Process_Count",
    "Thread_Count",
    "GPU_Temperature",
    "Ambient_Temperature",
    "Voltage",
    "Current_Load",
    "Prev_CPU_Temperature",
];

/// One observation as read from the input table. Fields are optional because
/// raw exports are heterogeneous in completeness; the cleaner drops any record
/// with a missing required field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTelemetry {
    pub cpu_usage: Option<f64>,
    pub cpu_frequency: Option<f64>,
    pub memory_usage: Option<f64>,
    pub disk_usage: Option<f64>,
    pub process_count: Option<f64>,
    pub thread_count: Option<f64>,
    pub gpu_temperature: Option<f64>,
    /// Training target; absent at inference time.
    pub cpu_temperature: Option<f64>,
}

impl RawTelemetry {
    /// Bitwise identity key for exact-duplicate removal. NaN-safe: two records
    /// with identical bit patterns (including identical NaNs) compare equal.
    pub(crate) fn identity_key(&self) -> [Option<u64>; 8] {
        [
            self.cpu_usage.map(f64::to_bits),
            self.cpu_frequency.map(f64::to_bits),
            self.memory_usage.map(f64::to_bits),
            self.disk_usage.map(f64::to_bits),
            self.process_count.map(f64::to_bits),
            self.thread_count.map(f64::to_bits),
            self.gpu_temperature.map(f64::to_bits),
            self.cpu_temperature.map(f64::to_bits),
        ]
    }

    /// Promote to a complete record if every required field is present.
    pub(crate) fn complete(&self) -> Option<TelemetryRecord> {
        Some(TelemetryRecord {
            cpu_usage: self.cpu_usage?,
            cpu_frequency: self.cpu_frequency?,
            memory_usage: self.memory_usage?,
            disk_usage: self.disk_usage?,
            process_count: self.process_count?,
            thread_count: self.thread_count?,
            gpu_temperature: self.gpu_temperature?,
            cpu_temperature: self.cpu_temperature?,
        })
    }
}

/// A fully populated observation. Produced only by the cleaner; every field is
/// present and the target lies inside [`TARGET_RANGE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub cpu_usage: f64,
    pub cpu_frequency: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    pub process_count: f64,
    pub thread_count: f64,
    pub gpu_temperature: f64,
    pub cpu_temperature: f64,
}

/// The fixed 11-field input the regressor consumes. Field order mirrors
/// [`FEATURE_NAMES`]; every field is present by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub cpu_usage: f64,
    pub cpu_frequency: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    pub process_count: f64,
    pub thread_count: f64,
    pub gpu_temperature: f64,
    pub ambient_temperature: f64,
    pub voltage: f64,
    pub current_load: f64,
    pub prev_cpu_temperature: f64,
}

impl FeatureVector {
    /// Values in schema order, ready for a 1×11 model input.
    pub fn to_array(&self) -> Array1<f64> {
        Array1::from_vec(vec![
            self.cpu_usage,
            self.cpu_frequency,
            self.memory_usage,
            self.disk_usage,
            self.process_count,
            self.thread_count,
            self.gpu_temperature,
            self.ambient_temperature,
            self.voltage,
            self.current_load,
            self.prev_cpu_temperature,
        ])
    }

    /// The schema this vector conforms to.
    pub fn names() -> &'static [&'static str] {
        &FEATURE_NAMES
    }
}

/// Raw inputs a dashboard or CLI collaborator supplies for one prediction.
///
/// `prev_cpu_temperature` must be given explicitly: no sequence context exists
/// at inference time, so the lag cannot be derived. Ambient temperature and
/// voltage fall back to the feature-engineering defaults when left `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceInput {
    pub cpu_usage: f64,
    pub cpu_frequency: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    pub process_count: f64,
    pub thread_count: f64,
    pub gpu_temperature: f64,
    pub prev_cpu_temperature: f64,
    pub ambient_temperature: Option<f64>,
    pub voltage: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_names_count_and_order() {
        assert_eq!(FEATURE_NAMES.len(), 11);
        assert_eq!(FEATURE_NAMES[0], "CPU_Usage");
        assert_eq!(FEATURE_NAMES[10], "Prev_CPU_Temperature");
    }

    #[test]
    fn test_feature_vector_array_matches_schema_order() {
        let fv = FeatureVector {
            cpu_usage: 1.0,
            cpu_frequency: 2.0,
            memory_usage: 3.0,
            disk_usage: 4.0,
            process_count: 5.0,
            thread_count: 6.0,
            gpu_temperature: 7.0,
            ambient_temperature: 8.0,
            voltage: 9.0,
            current_load: 10.0,
            prev_cpu_temperature: 11.0,
        };
        let arr = fv.to_array();
        assert_eq!(arr.len(), FEATURE_NAMES.len());
        assert_eq!(arr[0], 1.0);
        assert_eq!(arr[9], 10.0);
        assert_eq!(arr[10], 11.0);
    }

    #[test]
    fn test_complete_requires_every_field() {
        let mut raw = RawTelemetry {
            cpu_usage: Some(50.0),
            cpu_frequency: Some(3000.0),
            memory_usage: Some(40.0),
            disk_usage: Some(30.0),
            process_count: Some(120.0),
            thread_count: Some(900.0),
            gpu_temperature: Some(45.0),
            cpu_temperature: Some(60.0),
        };
        assert!(raw.complete().is_some());
        raw.memory_usage = None;
        assert!(raw.complete().is_none());
    }

    #[test]
    fn test_identity_key_distinguishes_missing_from_zero() {
        let a = RawTelemetry {
            cpu_usage: Some(0.0),
            cpu_frequency: None,
            memory_usage: None,
            disk_usage: None,
            process_count: None,
            thread_count: None,
            gpu_temperature: None,
            cpu_temperature: None,
        };
        let mut b = a.clone();
        b.cpu_usage = None;
        assert_ne!(a.identity_key(), b.identity_key());
    }
}
