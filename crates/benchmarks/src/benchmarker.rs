// Copyright 2025 LLM Calibrate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Device benchmarker context.
//!
//! [`DeviceBenchmarker`] ties the fingerprint, store and runner together
//! for callers such as a budgeting service. One instance is meant to be
//! held for the lifetime of the caller:
//!
//! - the record is loaded (or measured) lazily on first use,
//! - [`run_full_benchmark(true)`](DeviceBenchmarker::run_full_benchmark)
//!   forces a fresh measurement,
//! - once populated, the in-memory record is reused and never re-read from
//!   disk, so external updates to the store are not observed.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::CalibrationConfig;
use crate::error::{CalibrationError, Result};
use crate::estimator::{TaskType, TimeEstimator};
use crate::fingerprint::DeviceFingerprint;
use crate::probe::{ProbeExecutor, SubprocessExecutor};
use crate::record::{BenchmarkRecord, DeviceType};
use crate::runner::BenchmarkRunner;
use crate::store::BenchmarkStore;

/// Identity of the current device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Truncated fingerprint hash.
    pub device_id: String,
    /// Accelerator class.
    pub device_type: DeviceType,
}

/// Caches and produces benchmark records for the current device.
#[derive(Debug)]
pub struct DeviceBenchmarker<E = SubprocessExecutor> {
    fingerprint: DeviceFingerprint,
    store: BenchmarkStore,
    runner: BenchmarkRunner<E>,
    auto_run: bool,
    cached: Option<BenchmarkRecord>,
}

impl DeviceBenchmarker<SubprocessExecutor> {
    /// Build a benchmarker for this machine from `config`.
    pub fn from_config(config: &CalibrationConfig) -> Self {
        Self::new(
            DeviceFingerprint::detect(&config.interpreter),
            BenchmarkStore::new(config.benchmarks_file.clone()),
            BenchmarkRunner::new(SubprocessExecutor::from_config(config)),
            config.auto_run,
        )
    }
}

impl<E: ProbeExecutor> DeviceBenchmarker<E> {
    /// Assemble a benchmarker from explicit parts.
    pub fn new(
        fingerprint: DeviceFingerprint,
        store: BenchmarkStore,
        runner: BenchmarkRunner<E>,
        auto_run: bool,
    ) -> Self {
        Self {
            fingerprint,
            store,
            runner,
            auto_run,
            cached: None,
        }
    }

    /// Fingerprint of the current device.
    pub fn fingerprint(&self) -> &DeviceFingerprint {
        &self.fingerprint
    }

    /// Backing store.
    pub fn store(&self) -> &BenchmarkStore {
        &self.store
    }

    /// Identifier of the current device.
    pub fn device_id(&self) -> String {
        self.fingerprint.compute_id()
    }

    /// Accelerator class of the current device.
    pub fn device_type(&self) -> DeviceType {
        self.fingerprint.compute_type()
    }

    /// Device id and type together.
    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            device_id: self.device_id(),
            device_type: self.device_type(),
        }
    }

    /// The in-memory record, if one has been loaded or measured.
    pub fn cached(&self) -> Option<&BenchmarkRecord> {
        self.cached.as_ref()
    }

    /// Make sure a benchmark exists, measuring one if needed.
    ///
    /// Without `force_rerun` a valid stored record is reused. With it, all
    /// probes run and the result replaces both the stored and cached record.
    pub fn run_full_benchmark(&mut self, force_rerun: bool) -> Result<&BenchmarkRecord> {
        let device_id = self.device_id();

        if !force_rerun {
            if let Some(record) = self.store.load(&device_id) {
                info!(device_id = %short_id(&device_id), "Using cached benchmark results");
                return Ok(self.cached.insert(record));
            }
        }

        info!(
            device_id = %short_id(&device_id),
            device_type = %self.device_type(),
            "Running device performance benchmark"
        );

        let record = self.runner.run_all(&self.fingerprint)?;
        self.store.save(&record);

        info!(
            model_loading_seconds = record.model_loading_seconds,
            eval_seconds_per_100 = record.benchmark_eval_seconds_per_100_examples,
            classifier_seconds_per_100 = record.classifier_training_seconds_per_100_classifiers,
            steering_seconds_per_example = record.steering_seconds_per_example,
            generation_seconds_per_example = record.data_generation_seconds_per_example,
            "Benchmark complete"
        );

        Ok(self.cached.insert(record))
    }

    /// Current benchmark: in-memory first, then the store, then a new run
    /// when `auto_run` is set.
    pub fn current_benchmark(&mut self, auto_run: bool) -> Result<Option<&BenchmarkRecord>> {
        if self.cached.is_none() {
            if let Some(record) = self.store.load(&self.device_id()) {
                self.cached = Some(record);
            } else if auto_run {
                self.run_full_benchmark(true)?;
            }
        }
        Ok(self.cached.as_ref())
    }

    /// Estimated seconds for `quantity` units of `task_type`, regenerating
    /// the benchmark if the configuration allows it.
    pub fn estimate_task_time(&mut self, task_type: &str, quantity: u32) -> Result<f64> {
        self.estimate_task_time_with(task_type, quantity, self.auto_run)
    }

    /// Like [`estimate_task_time`](Self::estimate_task_time) with explicit
    /// control over regeneration.
    ///
    /// The task type is validated before any benchmark work starts.
    pub fn estimate_task_time_with(
        &mut self,
        task_type: &str,
        quantity: u32,
        auto_run: bool,
    ) -> Result<f64> {
        let task: TaskType = task_type.parse()?;
        let device_id = self.device_id();
        let record = self
            .current_benchmark(auto_run)?
            .ok_or(CalibrationError::NoBenchmarkAvailable { device_id })?;
        Ok(TimeEstimator::new(record).estimate(task, quantity))
    }
}

fn short_id(device_id: &str) -> &str {
    device_id.get(..8).unwrap_or(device_id)
}
