// Copyright 2025 LLM Calibrate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark runner.
//!
//! Runs the five probes in a fixed order and assembles a
//! [`BenchmarkRecord`]. A batch is all-or-nothing: the first failing probe
//! aborts the run and no record is produced.

use tracing::info;

use crate::error::{CalibrationError, Result};
use crate::fingerprint::DeviceFingerprint;
use crate::probe::{Probe, ProbeExecutor, SubprocessExecutor};
use crate::record::{now_epoch_seconds, BenchmarkRecord};

/// Normalized timings from one complete probe batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeTimings {
    /// Seconds per model load.
    pub model_loading: f64,
    /// Seconds per 100 evaluated examples.
    pub benchmark_eval: f64,
    /// Seconds per 100 classifiers.
    pub classifier_training: f64,
    /// Seconds per steered example.
    pub steering: f64,
    /// Seconds per generated example.
    pub data_generation: f64,
}

/// Executes probes and builds benchmark records.
#[derive(Debug, Clone)]
pub struct BenchmarkRunner<E = SubprocessExecutor> {
    executor: E,
}

impl<E: ProbeExecutor> BenchmarkRunner<E> {
    /// Create a runner over `executor`.
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// The underlying probe executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run one probe and return its normalized value.
    pub fn run_probe(&self, probe: Probe) -> Result<f64> {
        info!(probe = %probe, timeout_secs = probe.timeout().as_secs(), "Benchmarking");

        let raw = self
            .executor
            .execute(probe)
            .map_err(|source| CalibrationError::Probe { probe, source })?;
        let value = probe.normalize(raw);

        info!(probe = %probe, seconds = value, unit = probe.unit_label(), "Probe complete");
        Ok(value)
    }

    /// Run every probe in order.
    pub fn run_probes(&self) -> Result<ProbeTimings> {
        Ok(ProbeTimings {
            model_loading: self.run_probe(Probe::ModelLoading)?,
            benchmark_eval: self.run_probe(Probe::BenchmarkEval)?,
            classifier_training: self.run_probe(Probe::ClassifierTraining)?,
            steering: self.run_probe(Probe::Steering)?,
            data_generation: self.run_probe(Probe::DataGeneration)?,
        })
    }

    /// Run every probe and build a fresh record for `fingerprint`.
    pub fn run_all(&self, fingerprint: &DeviceFingerprint) -> Result<BenchmarkRecord> {
        let timings = self.run_probes()?;
        Ok(BenchmarkRecord {
            device_id: fingerprint.compute_id(),
            device_type: fingerprint.compute_type(),
            model_loading_seconds: timings.model_loading,
            benchmark_eval_seconds_per_100_examples: timings.benchmark_eval,
            classifier_training_seconds_per_100_classifiers: timings.classifier_training,
            data_generation_seconds_per_example: timings.data_generation,
            steering_seconds_per_example: timings.steering,
            created_at: now_epoch_seconds(),
            runtime_version: fingerprint.runtime_version.clone(),
            platform_info: fingerprint.platform_info(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ProbeFailure;
    use crate::fingerprint::Accelerator;
    use crate::probe::MockProbeExecutor;
    use crate::record::DeviceType;
    use mockall::predicate::eq;
    use mockall::Sequence;

    pub(crate) fn test_fingerprint() -> DeviceFingerprint {
        DeviceFingerprint {
            arch: "aarch64".to_string(),
            processor: "Apple M2 Pro".to_string(),
            os: "macos".to_string(),
            os_release: "23.4.0".to_string(),
            runtime_version: "Python 3.12.2".to_string(),
            accelerator: Accelerator::Mps,
        }
    }

    /// Raw values that normalize to the sample record's coefficients.
    pub(crate) fn raw_seconds(probe: Probe) -> f64 {
        match probe {
            Probe::ModelLoading => 12.5,
            Probe::BenchmarkEval => 5.0,
            Probe::ClassifierTraining => 42.0,
            Probe::Steering => 16.0,
            Probe::DataGeneration => 1.75,
        }
    }

    #[test]
    fn test_run_all_normalizes_in_order() {
        let mut executor = MockProbeExecutor::new();
        let mut seq = Sequence::new();
        for probe in Probe::ALL {
            executor
                .expect_execute()
                .with(eq(probe))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|p| Ok(raw_seconds(p)));
        }

        let fingerprint = test_fingerprint();
        let record = BenchmarkRunner::new(executor).run_all(&fingerprint).unwrap();

        assert_eq!(record.device_id, fingerprint.compute_id());
        assert_eq!(record.device_type, DeviceType::Mps);
        assert_eq!(record.model_loading_seconds, 12.5);
        assert_eq!(record.benchmark_eval_seconds_per_100_examples, 50.0);
        assert_eq!(record.classifier_training_seconds_per_100_classifiers, 4200.0);
        assert_eq!(record.steering_seconds_per_example, 3.2);
        assert_eq!(record.data_generation_seconds_per_example, 1.75);
        assert_eq!(record.runtime_version, "Python 3.12.2");
        assert_eq!(record.platform_info, "macos-23.4.0-aarch64");
    }

    #[test]
    fn test_failure_stops_the_batch() {
        let mut executor = MockProbeExecutor::new();
        executor
            .expect_execute()
            .with(eq(Probe::ModelLoading))
            .times(1)
            .returning(|_| Ok(10.0));
        executor
            .expect_execute()
            .with(eq(Probe::BenchmarkEval))
            .times(1)
            .returning(|_| Err(ProbeFailure::MissingResult));
        executor
            .expect_execute()
            .with(eq(Probe::ClassifierTraining))
            .times(0);

        let err = BenchmarkRunner::new(executor)
            .run_all(&test_fingerprint())
            .unwrap_err();

        assert!(matches!(
            err,
            CalibrationError::Probe {
                probe: Probe::BenchmarkEval,
                source: ProbeFailure::MissingResult
            }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_subprocess_batch_end_to_end() {
        let mut executor = SubprocessExecutor::new("sh", "test-model");
        for probe in Probe::ALL {
            let script = format!("echo 'BENCHMARK_RESULT:{}'\n", raw_seconds(probe));
            executor = executor.with_script(probe, script);
        }

        let record = BenchmarkRunner::new(executor)
            .run_all(&test_fingerprint())
            .unwrap();

        assert_eq!(record.benchmark_eval_seconds_per_100_examples, 50.0);
        assert_eq!(record.steering_seconds_per_example, 3.2);
    }
}
