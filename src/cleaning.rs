//! Dataset cleaning
//!
//! Three ordered filters over the raw sequence: exact-duplicate removal,
//! hard-drop of incomplete records, and a physical-plausibility bound on the
//! target. Relative order of surviving records is preserved — the lag-1
//! feature downstream depends on position.

use crate::error::{CoolsenseError, Result};
use crate::telemetry::{RawTelemetry, TelemetryRecord, TARGET_RANGE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

/// Accounting of what each cleaning step dropped.
///
/// Invariant: `rows_in = rows_out + duplicates_removed + incomplete_removed +
/// out_of_range_removed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub rows_in: usize,
    pub duplicates_removed: usize,
    pub incomplete_removed: usize,
    pub out_of_range_removed: usize,
    pub rows_out: usize,
}

/// Removes duplicate, incomplete, and physically implausible records.
#[derive(Debug, Clone, Default)]
pub struct DatasetCleaner;

impl DatasetCleaner {
    pub fn new() -> Self {
        Self
    }

    /// Clean a raw telemetry sequence.
    ///
    /// Steps run in order, each a total filter over the sequence:
    /// 1. remove exact duplicates (first occurrence kept),
    /// 2. drop records with any missing required field,
    /// 3. reject records whose target lies outside [20, 100] °C.
    ///
    /// Fails with [`CoolsenseError::EmptyDataset`] when nothing survives;
    /// callers must not proceed to training on an empty sequence.
    pub fn clean(&self, raw: &[RawTelemetry]) -> Result<(Vec<TelemetryRecord>, CleaningReport)> {
        let rows_in = raw.len();
        let (lo, hi) = TARGET_RANGE;

        // Step 1: exact duplicates, order preserved.
        let mut seen = HashSet::with_capacity(rows_in);
        let mut deduped = Vec::with_capacity(rows_in);
        for record in raw {
            if seen.insert(record.identity_key()) {
                deduped.push(record);
            }
        }
        let duplicates_removed = rows_in - deduped.len();

        // Step 2: hard drop on any missing required field. The superseded
        // variant imputed column means here; the canonical pipeline does not.
        let mut complete = Vec::with_capacity(deduped.len());
        let mut incomplete_removed = 0usize;
        for record in deduped {
            match record.complete() {
                Some(rec) => complete.push(rec),
                None => incomplete_removed += 1,
            }
        }

        // Step 3: physical bounds on the target.
        let before_range = complete.len();
        let cleaned: Vec<TelemetryRecord> = complete
            .into_iter()
            .filter(|rec| rec.cpu_temperature >= lo && rec.cpu_temperature <= hi)
            .collect();
        let out_of_range_removed = before_range - cleaned.len();

        let report = CleaningReport {
            rows_in,
            duplicates_removed,
            incomplete_removed,
            out_of_range_removed,
            rows_out: cleaned.len(),
        };

        if cleaned.is_empty() {
            warn!(rows_in, "all records dropped during cleaning");
            return Err(CoolsenseError::EmptyDataset { rows_in });
        }

        info!(
            rows_in,
            rows_out = report.rows_out,
            duplicates = duplicates_removed,
            incomplete = incomplete_removed,
            out_of_range = out_of_range_removed,
            "dataset cleaned"
        );

        Ok((cleaned, report))
    }
}
