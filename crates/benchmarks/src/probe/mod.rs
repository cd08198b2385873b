// Copyright 2025 LLM Calibrate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark probes.
//!
//! A probe is one isolated, timed execution of an external ML operation.
//! Each probe runs in its own subprocess and reports its elapsed time on
//! stdout using the line protocol in [`protocol`].
//!
//! | probe                 | timeout | sample units   | canonical units  |
//! |-----------------------|---------|----------------|------------------|
//! | `model_loading`       | 120 s   | 1 load         | 1 load           |
//! | `benchmark_eval`      | 300 s   | 10 examples    | 100 examples     |
//! | `classifier_training` | 600 s   | 1 classifier   | 100 classifiers  |
//! | `steering`            | 300 s   | 5 examples     | 1 example        |
//! | `data_generation`     | 300 s   | 1 response     | 1 response       |
//!
//! Scaling a single classifier to "per 100 classifiers" is a linear
//! extrapolation, not a measured batch effect.

pub mod protocol;
pub mod scripts;
pub mod subprocess;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ProbeFailure;

pub use subprocess::SubprocessExecutor;

/// The five benchmark probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Probe {
    /// Load the model once.
    ModelLoading,
    /// Evaluate a small benchmark without steering.
    BenchmarkEval,
    /// Synthesize and train one classifier.
    ClassifierTraining,
    /// Evaluate a small benchmark with steering applied.
    Steering,
    /// Generate a small set of contrastive pairs.
    DataGeneration,
}

impl Probe {
    /// All probes in execution order.
    pub const ALL: [Probe; 5] = [
        Probe::ModelLoading,
        Probe::BenchmarkEval,
        Probe::ClassifierTraining,
        Probe::Steering,
        Probe::DataGeneration,
    ];

    /// Snake-case probe name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModelLoading => "model_loading",
            Self::BenchmarkEval => "benchmark_eval",
            Self::ClassifierTraining => "classifier_training",
            Self::Steering => "steering",
            Self::DataGeneration => "data_generation",
        }
    }

    /// Timeout ceiling for the probe subprocess.
    pub fn timeout(&self) -> Duration {
        match self {
            Self::ModelLoading => Duration::from_secs(120),
            Self::BenchmarkEval => Duration::from_secs(300),
            Self::ClassifierTraining => Duration::from_secs(600),
            Self::Steering => Duration::from_secs(300),
            Self::DataGeneration => Duration::from_secs(300),
        }
    }

    /// Number of work units the probe script actually times.
    pub fn sample_units(&self) -> f64 {
        match self {
            Self::ModelLoading => 1.0,
            Self::BenchmarkEval => 10.0,
            Self::ClassifierTraining => 1.0,
            Self::Steering => 5.0,
            // The script divides by the responses it actually produced.
            Self::DataGeneration => 1.0,
        }
    }

    /// Number of work units the record field is expressed in.
    pub fn canonical_units(&self) -> f64 {
        match self {
            Self::BenchmarkEval | Self::ClassifierTraining => 100.0,
            Self::ModelLoading | Self::Steering | Self::DataGeneration => 1.0,
        }
    }

    /// Scale a raw elapsed time to the record's canonical unit.
    pub fn normalize(&self, raw_seconds: f64) -> f64 {
        raw_seconds / self.sample_units() * self.canonical_units()
    }

    /// Unit label used in logs and reports.
    pub fn unit_label(&self) -> &'static str {
        match self {
            Self::ModelLoading => "per load",
            Self::BenchmarkEval => "per 100 examples",
            Self::ClassifierTraining => "per 100 classifiers",
            Self::Steering | Self::DataGeneration => "per example",
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Executes a probe and returns the raw elapsed seconds it reported.
///
/// The runner owns normalization; executors only run the workload and
/// interpret the result protocol.
#[cfg_attr(test, mockall::automock)]
pub trait ProbeExecutor {
    /// Run `probe` to completion, blocking the calling thread.
    fn execute(&self, probe: Probe) -> Result<f64, ProbeFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_table() {
        let secs: Vec<u64> = Probe::ALL.iter().map(|p| p.timeout().as_secs()).collect();
        assert_eq!(secs, vec![120, 300, 600, 300, 300]);
    }

    #[test]
    fn test_normalization() {
        // 10 examples in 5s -> 50s per 100 examples.
        assert_eq!(Probe::BenchmarkEval.normalize(5.0), 50.0);
        // One classifier in 42s -> 4200s per 100 classifiers.
        assert_eq!(Probe::ClassifierTraining.normalize(42.0), 4200.0);
        // 5 steered examples in 16s -> 3.2s per example.
        assert_eq!(Probe::Steering.normalize(16.0), 3.2);
        assert_eq!(Probe::ModelLoading.normalize(12.5), 12.5);
        assert_eq!(Probe::DataGeneration.normalize(1.75), 1.75);
    }

    #[test]
    fn test_execution_order() {
        let names: Vec<&str> = Probe::ALL.iter().map(Probe::name).collect();
        assert_eq!(
            names,
            ["model_loading", "benchmark_eval", "classifier_training", "steering", "data_generation"]
        );
    }
}
