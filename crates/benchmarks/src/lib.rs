// Copyright 2025 LLM Calibrate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Device benchmarking and time estimation for LLM pipeline budgeting.
//!
//! This crate measures how long the expensive operations of an LLM tooling
//! pipeline take on the current machine, caches those coefficients keyed by
//! a device fingerprint, and turns them into time estimates.
//!
//! # Quick Start
//!
//! ```no_run
//! use llm_calibrate_benchmarks::{CalibrationConfig, DeviceBenchmarker};
//!
//! let config = CalibrationConfig::load(None)?;
//! let mut benchmarker = DeviceBenchmarker::from_config(&config);
//!
//! // Loads a cached benchmark, or measures one on first use.
//! let seconds = benchmarker.estimate_task_time("benchmark_eval", 250)?;
//! println!("~{seconds:.0}s for 250 evaluation examples");
//! # Ok::<(), llm_calibrate_benchmarks::CalibrationError>(())
//! ```
//!
//! # Modules
//!
//! - [`fingerprint`] - Device identification
//! - [`record`] - The cached `BenchmarkRecord`
//! - [`store`] - JSON persistence with a 7-day staleness window
//! - [`probe`] - The five subprocess probes and their result protocol
//! - [`runner`] - All-or-nothing probe batches
//! - [`estimator`] - Linear time projection per task type
//! - [`benchmarker`] - Context object tying everything together
//! - [`markdown`] - Markdown report generation

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod benchmarker;
pub mod config;
pub mod error;
pub mod estimator;
pub mod fingerprint;
pub mod markdown;
pub mod probe;
pub mod record;
pub mod runner;
pub mod store;

pub use benchmarker::{DeviceBenchmarker, DeviceInfo};
pub use config::CalibrationConfig;
pub use error::{CalibrationError, ProbeFailure, Result, StoreError};
pub use estimator::{TaskType, TimeEstimator};
pub use fingerprint::{Accelerator, DeviceFingerprint};
pub use probe::{Probe, ProbeExecutor, SubprocessExecutor};
pub use record::{BenchmarkRecord, DeviceType};
pub use runner::BenchmarkRunner;
pub use store::BenchmarkStore;
