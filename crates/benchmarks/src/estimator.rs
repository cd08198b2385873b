// Copyright 2025 LLM Calibrate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Task time estimation.
//!
//! Converts a benchmark record into a projected duration for a task type
//! and quantity. Every rule is linear in the quantity except model loading,
//! which is a fixed cost.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;
use crate::record::BenchmarkRecord;

/// Task types the budgeting system can ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Loading the model once. Ignores quantity.
    ModelLoading,
    /// Evaluating examples.
    BenchmarkEval,
    /// Training classifiers.
    ClassifierTraining,
    /// Steering examples.
    Steering,
    /// Generating examples.
    DataGeneration,
}

impl TaskType {
    /// All task types.
    pub const ALL: [TaskType; 5] = [
        TaskType::ModelLoading,
        TaskType::BenchmarkEval,
        TaskType::ClassifierTraining,
        TaskType::Steering,
        TaskType::DataGeneration,
    ];

    /// Snake-case name accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModelLoading => "model_loading",
            Self::BenchmarkEval => "benchmark_eval",
            Self::ClassifierTraining => "classifier_training",
            Self::Steering => "steering",
            Self::DataGeneration => "data_generation",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskType {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|task| task.name() == s)
            .ok_or_else(|| CalibrationError::UnknownTaskType(s.to_string()))
    }
}

/// Projects task durations from one benchmark record.
#[derive(Debug, Clone, Copy)]
pub struct TimeEstimator<'a> {
    record: &'a BenchmarkRecord,
}

impl<'a> TimeEstimator<'a> {
    /// Estimator over `record`.
    pub fn new(record: &'a BenchmarkRecord) -> Self {
        Self { record }
    }

    /// Estimated seconds for `quantity` units of `task`.
    ///
    /// `quantity` converts to `f64` losslessly, so doubling the quantity
    /// doubles the estimate exactly.
    pub fn estimate(&self, task: TaskType, quantity: u32) -> f64 {
        let quantity = f64::from(quantity);
        let r = self.record;
        match task {
            TaskType::ModelLoading => r.model_loading_seconds,
            TaskType::BenchmarkEval => (r.benchmark_eval_seconds_per_100_examples / 100.0) * quantity,
            TaskType::ClassifierTraining => {
                (r.classifier_training_seconds_per_100_classifiers / 100.0) * quantity
            }
            TaskType::Steering => r.steering_seconds_per_example * quantity,
            TaskType::DataGeneration => r.data_generation_seconds_per_example * quantity,
        }
    }

    /// Like [`estimate`](Self::estimate) with the task named as a string.
    pub fn estimate_named(&self, task_type: &str, quantity: u32) -> Result<f64, CalibrationError> {
        Ok(self.estimate(task_type.parse()?, quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sample_record;

    #[test]
    fn test_eval_scenario() {
        let record = sample_record("abc", 0.0);
        assert_eq!(record.benchmark_eval_seconds_per_100_examples, 50.0);
        let estimator = TimeEstimator::new(&record);
        assert_eq!(estimator.estimate(TaskType::BenchmarkEval, 20), 10.0);
    }

    #[test]
    fn test_steering_scenario() {
        let record = sample_record("abc", 0.0);
        let estimator = TimeEstimator::new(&record);
        assert_eq!(estimator.estimate_named("steering", 5).unwrap(), 16.0);
    }

    #[test]
    fn test_model_loading_ignores_quantity() {
        let record = sample_record("abc", 0.0);
        let estimator = TimeEstimator::new(&record);
        for q in [0, 1, 7, 1000] {
            assert_eq!(estimator.estimate(TaskType::ModelLoading, q), 12.5);
        }
    }

    #[test]
    fn test_linear_tasks_double_with_quantity() {
        let record = sample_record("abc", 0.0);
        let estimator = TimeEstimator::new(&record);
        for task in TaskType::ALL.into_iter().filter(|t| *t != TaskType::ModelLoading) {
            for q in [1, 3, 17, 250] {
                assert_eq!(
                    estimator.estimate(task, 2 * q),
                    2.0 * estimator.estimate(task, q),
                    "{task} at {q}"
                );
            }
        }
    }

    #[test]
    fn test_linear_scaling_holds_for_largest_quantities() {
        let record = sample_record("abc", 0.0);
        let estimator = TimeEstimator::new(&record);
        let q = u32::MAX / 2;
        assert_eq!(
            estimator.estimate(TaskType::Steering, 2 * q),
            2.0 * estimator.estimate(TaskType::Steering, q)
        );
        assert_eq!(
            estimator.estimate(TaskType::DataGeneration, u32::MAX),
            1.75 * 4_294_967_295.0
        );
    }

    #[test]
    fn test_classifier_training_per_classifier() {
        let record = sample_record("abc", 0.0);
        let estimator = TimeEstimator::new(&record);
        assert_eq!(estimator.estimate(TaskType::ClassifierTraining, 3), 126.0);
    }

    #[test]
    fn test_unknown_task_type() {
        let record = sample_record("abc", 0.0);
        let err = TimeEstimator::new(&record)
            .estimate_named("fine_tuning", 1)
            .unwrap_err();
        assert!(matches!(err, CalibrationError::UnknownTaskType(t) if t == "fine_tuning"));
    }

    #[test]
    fn test_task_names_round_trip() {
        for task in TaskType::ALL {
            assert_eq!(task.name().parse::<TaskType>().unwrap(), task);
        }
    }
}
