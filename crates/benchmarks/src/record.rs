// Copyright 2025 LLM Calibrate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark record types.
//!
//! A [`BenchmarkRecord`] holds the per-unit timing coefficients measured on
//! one device. Records are created only by a full probe batch and are never
//! partially updated.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Seconds in one day.
pub const SECONDS_PER_DAY: f64 = 24.0 * 3600.0;

/// A record older than this many days is treated as absent.
pub const STALENESS_WINDOW_DAYS: f64 = 7.0;

/// How far in the future `created_at` may lie before a record is rejected.
pub const CLOCK_SKEW_ALLOWANCE_SECONDS: f64 = 300.0;

/// Kind of compute device the benchmark was measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// No accelerator available.
    #[default]
    Cpu,
    /// NVIDIA GPU through CUDA.
    Cuda,
    /// Apple GPU through Metal Performance Shaders.
    Mps,
}

impl DeviceType {
    /// Stable lowercase name, matching the persisted form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Cuda => "cuda",
            Self::Mps => "mps",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu-cuda" => Ok(Self::Cuda),
            "mps" | "gpu-mps" => Ok(Self::Mps),
            other => Err(format!("unknown device type: {other}")),
        }
    }
}

/// Timing coefficients for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    /// Truncated hash of the device fingerprint.
    pub device_id: String,
    /// Accelerator class the numbers were measured on.
    pub device_type: DeviceType,
    /// Seconds for one full model load.
    pub model_loading_seconds: f64,
    /// Seconds per 100 evaluated examples.
    pub benchmark_eval_seconds_per_100_examples: f64,
    /// Seconds per 100 trained classifiers.
    ///
    /// Extrapolated linearly from a single classifier's wall time.
    #[serde(alias = "classifier_training_seconds_per_100_samples")]
    pub classifier_training_seconds_per_100_classifiers: f64,
    /// Seconds per generated example.
    pub data_generation_seconds_per_example: f64,
    /// Seconds per steered example.
    pub steering_seconds_per_example: f64,
    /// Creation time in seconds since the Unix epoch.
    #[serde(alias = "benchmark_timestamp")]
    pub created_at: f64,
    /// Version string of the runtime that executed the probes.
    #[serde(alias = "python_version")]
    pub runtime_version: String,
    /// Free-text platform description.
    pub platform_info: String,
}

impl BenchmarkRecord {
    /// Age of the record in days relative to `now` (epoch seconds).
    pub fn age_days(&self, now: f64) -> f64 {
        (now - self.created_at) / SECONDS_PER_DAY
    }

    /// Whether the record has left the staleness window at `now`.
    pub fn is_stale_at(&self, now: f64) -> bool {
        self.age_days(now) > STALENESS_WINDOW_DAYS
    }

    /// The five timing coefficients, in probe order.
    pub fn durations(&self) -> [f64; 5] {
        [
            self.model_loading_seconds,
            self.benchmark_eval_seconds_per_100_examples,
            self.classifier_training_seconds_per_100_classifiers,
            self.steering_seconds_per_example,
            self.data_generation_seconds_per_example,
        ]
    }

    /// Whether the record can be trusted for estimates at `now`.
    ///
    /// Every duration must be finite and non-negative, and `created_at` must
    /// not lie in the future beyond [`CLOCK_SKEW_ALLOWANCE_SECONDS`].
    pub fn is_valid_at(&self, now: f64) -> bool {
        self.durations().iter().all(|d| d.is_finite() && *d >= 0.0)
            && self.created_at.is_finite()
            && self.created_at <= now + CLOCK_SKEW_ALLOWANCE_SECONDS
    }

    /// Whether the record is stale right now.
    pub fn is_stale(&self) -> bool {
        self.is_stale_at(now_epoch_seconds())
    }
}

/// Current wall-clock time as fractional seconds since the Unix epoch.
pub fn now_epoch_seconds() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
pub(crate) fn sample_record(device_id: &str, created_at: f64) -> BenchmarkRecord {
    BenchmarkRecord {
        device_id: device_id.to_string(),
        device_type: DeviceType::Cpu,
        model_loading_seconds: 12.5,
        benchmark_eval_seconds_per_100_examples: 50.0,
        classifier_training_seconds_per_100_classifiers: 4200.0,
        data_generation_seconds_per_example: 1.75,
        steering_seconds_per_example: 3.2,
        created_at,
        runtime_version: "Python 3.11.6".to_string(),
        platform_info: "linux-6.5.0-x86_64".to_string(),
    }
}
