//! Tabular data boundary
//!
//! Converts between polars `DataFrame`s and the typed telemetry records the
//! pipeline operates on. Column names are case-sensitive and must match the
//! telemetry schema exactly; a missing column is an error, not a default.

use crate::error::{CoolsenseError, Result};
use crate::telemetry::{RawTelemetry, SENSOR_COLUMNS, TARGET_COLUMN};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Extract one column as nullable f64 values, exact name match.
fn column_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| CoolsenseError::ColumnNotFound(name.to_string()))?;
    let as_f64 = column.cast(&DataType::Float64)?;
    Ok(as_f64
        .f64()
        .map_err(|e| CoolsenseError::DataError(e.to_string()))?
        .into_iter()
        .collect())
}

/// Convert a telemetry table into raw records, preserving row order.
///
/// All seven sensor columns and the target column must be present (this is
/// the training-data path; single-point inference never goes through a
/// table). Per-row nulls become `None` and are handled by the cleaner.
pub fn telemetry_from_dataframe(df: &DataFrame) -> Result<Vec<RawTelemetry>> {
    let mut columns = Vec::with_capacity(SENSOR_COLUMNS.len() + 1);
    for name in SENSOR_COLUMNS.iter().copied().chain(std::iter::once(TARGET_COLUMN)) {
        columns.push(column_values(df, name)?);
    }

    let n = df.height();
    let records = (0..n)
        .map(|row| RawTelemetry {
            cpu_usage: columns[0][row],
            cpu_frequency: columns[1][row],
            memory_usage: columns[2][row],
            disk_usage: columns[3][row],
            process_count: columns[4][row],
            thread_count: columns[5][row],
            gpu_temperature: columns[6][row],
            cpu_temperature: columns[7][row],
        })
        .collect();

    debug!(rows = n, "telemetry table converted to records");
    Ok(records)
}

/// Read a telemetry CSV into raw records.
pub fn read_telemetry_csv(path: impl AsRef<Path>) -> Result<Vec<RawTelemetry>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CoolsenseError::DataError(format!(
        "cannot open {}: {e}",
        path.display()
    )))?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file)
        .finish()?;

    telemetry_from_dataframe(&df)
}
