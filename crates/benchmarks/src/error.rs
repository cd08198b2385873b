// Copyright 2025 LLM Calibrate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for device benchmarking.
//!
//! Two families of errors exist:
//!
//! - [`CalibrationError`] is surfaced to callers. Probe failures, unknown
//!   task types and missing benchmarks are never defaulted away.
//! - [`StoreError`] describes persistence problems. The store logs and
//!   swallows these so an in-memory record is still usable.

use std::time::Duration;

use thiserror::Error;

use crate::probe::Probe;

/// Reasons a single benchmark probe can fail.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    /// The probe subprocess could not be prepared or spawned.
    #[error("failed to launch probe process: {0}")]
    Launch(#[from] std::io::Error),

    /// The probe exceeded its timeout ceiling and was killed.
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The probe exited with a non-zero status.
    #[error("exited with status {code}: {message}")]
    NonZeroExit {
        /// Exit code, or -1 when terminated by a signal.
        code: i32,
        /// `BENCHMARK_ERROR:` message if one was emitted, otherwise the stderr tail.
        message: String,
    },

    /// The probe exited cleanly but reported an error line.
    #[error("probe reported error: {0}")]
    Reported(String),

    /// No `BENCHMARK_RESULT:` line was found on stdout.
    #[error("no result line in probe output")]
    MissingResult,

    /// The result line did not carry a usable duration.
    #[error("invalid result value {0:?}")]
    InvalidResult(String),
}

/// Caller-facing errors.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// A probe failed, aborting the whole benchmark batch.
    #[error("benchmark probe `{probe}` failed: {source}")]
    Probe {
        /// Which probe failed.
        probe: Probe,
        /// Why it failed.
        #[source]
        source: ProbeFailure,
    },

    /// The requested task type is not one of the known estimation targets.
    #[error("unknown task type: {0}")]
    UnknownTaskType(String),

    /// No valid benchmark exists and regeneration was not allowed.
    #[error("no benchmark available for device {device_id}; run `calibrate run` first")]
    NoBenchmarkAvailable {
        /// Fingerprint of the current device.
        device_id: String,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Result type for calibration operations.
pub type Result<T> = std::result::Result<T, CalibrationError>;

/// Persistence errors for the benchmark store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the store file failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store file is not valid JSON.
    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The top level of the store document is not an object.
    #[error("store document is not a JSON object")]
    NotAnObject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_error_names_the_probe() {
        let err = CalibrationError::Probe {
            probe: Probe::ClassifierTraining,
            source: ProbeFailure::Timeout(Duration::from_secs(600)),
        };
        let msg = err.to_string();
        assert!(msg.contains("classifier_training"));
        assert!(msg.contains("600s"));
    }

    #[test]
    fn test_unknown_task_type_message() {
        let err = CalibrationError::UnknownTaskType("juggling".to_string());
        assert_eq!(err.to_string(), "unknown task type: juggling");
    }
}
