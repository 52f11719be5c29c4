//! Integration test: table ingestion → cleaning → feature derivation

use coolsense::cleaning::DatasetCleaner;
use coolsense::dataset::telemetry_from_dataframe;
use coolsense::error::CoolsenseError;
use coolsense::features::{FeatureConfig, FeatureEngineer};
use coolsense::telemetry::FEATURE_NAMES;
use polars::prelude::*;

fn telemetry_df() -> DataFrame {
    // Ten rows: one exact duplicate of row 0, one with a missing sensor, one
    // with an impossible target, seven usable.
    df!(
        "CPU_Usage" => &[Some(50.0), Some(50.0), None,      Some(70.0), Some(30.0), Some(90.0), Some(20.0), Some(60.0), Some(80.0), Some(40.0)],
        "CPU_Frequency" => &[3200.0, 3200.0, 3400.0, 3600.0, 3000.0, 3800.0, 2800.0, 3300.0, 3700.0, 3100.0],
        "Memory_Usage" => &[40.0, 40.0, 45.0, 60.0, 35.0, 85.0, 25.0, 55.0, 75.0, 45.0],
        "Disk_Usage" => &[55.0, 55.0, 60.0, 65.0, 50.0, 70.0, 45.0, 58.0, 68.0, 52.0],
        "Process_Count" => &[180.0, 180.0, 190.0, 210.0, 150.0, 250.0, 120.0, 200.0, 240.0, 170.0],
        "Thread_Count" => &[1400.0, 1400.0, 1500.0, 1800.0, 1100.0, 2800.0, 900.0, 1600.0, 2400.0, 1300.0],
        "GPU_Temperature" => &[48.0, 48.0, 50.0, 52.0, 42.0, 58.0, 38.0, 49.0, 56.0, 45.0],
        "CPU_Temperature" => &[58.0, 58.0, 60.0, 66.0, 48.0, 150.0, 40.0, 62.0, 74.0, 52.0],
    )
    .unwrap()
}

#[test]
fn test_table_to_cleaned_records() {
    let records = telemetry_from_dataframe(&telemetry_df()).unwrap();
    assert_eq!(records.len(), 10);

    let (cleaned, report) = DatasetCleaner::new().clean(&records).unwrap();
    assert_eq!(report.rows_in, 10);
    assert_eq!(report.duplicates_removed, 1);
    assert_eq!(report.incomplete_removed, 1);
    assert_eq!(report.out_of_range_removed, 1);
    assert_eq!(cleaned.len(), 7);

    for rec in &cleaned {
        assert!(rec.cpu_temperature >= 20.0 && rec.cpu_temperature <= 100.0);
    }
}

#[test]
fn test_cleaned_records_to_features() {
    let records = telemetry_from_dataframe(&telemetry_df()).unwrap();
    let (cleaned, _) = DatasetCleaner::new().clean(&records).unwrap();

    let features = FeatureEngineer::new(FeatureConfig::default())
        .engineer(&cleaned)
        .unwrap();

    // N cleaned records produce exactly N-1 feature rows.
    assert_eq!(features.n_rows(), cleaned.len() - 1);
    assert_eq!(features.matrix.ncols(), 11);
    assert_eq!(features.feature_names, FEATURE_NAMES.to_vec());

    // Every cell is populated: no NaN ever reaches the trainer.
    for value in features.matrix.iter() {
        assert!(value.is_finite());
    }

    // Current_Load is exactly CPU_Usage * 0.1 in every row.
    for row in 0..features.n_rows() {
        assert!((features.matrix[[row, 9]] - features.matrix[[row, 0]] * 0.1).abs() < 1e-9);
    }

    // Lag column reproduces the previous record's target.
    for row in 0..features.n_rows() {
        assert_eq!(features.matrix[[row, 10]], cleaned[row].cpu_temperature);
    }
}

#[test]
fn test_misnamed_column_rejected_up_front() {
    let df = df!(
        "cpu_usage" => &[50.0],   // wrong case
        "CPU_Frequency" => &[3200.0],
        "Memory_Usage" => &[40.0],
        "Disk_Usage" => &[55.0],
        "Process_Count" => &[180.0],
        "Thread_Count" => &[1400.0],
        "GPU_Temperature" => &[48.0],
        "CPU_Temperature" => &[58.0],
    )
    .unwrap();
    assert!(matches!(
        telemetry_from_dataframe(&df).unwrap_err(),
        CoolsenseError::ColumnNotFound(_)
    ));
}
