// Copyright 2025 LLM Calibrate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Markdown output generation for benchmark records.
//!
//! This module renders device benchmarks as markdown for humans reviewing
//! calibration results.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::record::{now_epoch_seconds, BenchmarkRecord};

fn format_timestamp(epoch_seconds: f64) -> String {
    DateTime::<Utc>::from_timestamp_millis((epoch_seconds * 1000.0) as i64)
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{epoch_seconds}"))
}

fn write_coefficients(output: &mut String, record: &BenchmarkRecord) {
    writeln!(output, "| Operation | Seconds | Unit |").unwrap();
    writeln!(output, "|-----------|---------|------|").unwrap();
    let rows = [
        ("Model loading", record.model_loading_seconds, "per load"),
        (
            "Evaluation",
            record.benchmark_eval_seconds_per_100_examples,
            "per 100 examples",
        ),
        (
            "Classifier training",
            record.classifier_training_seconds_per_100_classifiers,
            "per 100 classifiers",
        ),
        ("Steering", record.steering_seconds_per_example, "per example"),
        (
            "Data generation",
            record.data_generation_seconds_per_example,
            "per example",
        ),
    ];
    for (name, seconds, unit) in rows {
        writeln!(output, "| {} | {:.2} | {} |", name, seconds, unit).unwrap();
    }
}

/// Generate a markdown summary for a single device benchmark.
pub fn generate_summary(record: &BenchmarkRecord) -> String {
    let mut output = String::new();

    writeln!(output, "# Device Benchmark Summary").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Generated: {}", Utc::now().to_rfc3339()).unwrap();
    writeln!(output).unwrap();
    writeln!(output, "- **Device ID:** `{}`", record.device_id).unwrap();
    writeln!(output, "- **Device type:** {}", record.device_type).unwrap();
    writeln!(output, "- **Measured:** {}", format_timestamp(record.created_at)).unwrap();
    writeln!(output, "- **Runtime:** {}", record.runtime_version).unwrap();
    writeln!(output, "- **Platform:** {}", record.platform_info).unwrap();
    writeln!(output).unwrap();
    writeln!(output, "## Coefficients").unwrap();
    writeln!(output).unwrap();
    write_coefficients(&mut output, record);
    writeln!(output).unwrap();
    writeln!(output, "---").unwrap();
    writeln!(
        output,
        "Classifier training is extrapolated linearly from a single classifier."
    )
    .unwrap();

    output
}

/// Generate a report covering every device in the store.
pub fn generate_store_report(records: &BTreeMap<String, BenchmarkRecord>) -> String {
    let now = now_epoch_seconds();
    let mut output = String::new();

    writeln!(output, "# Benchmark Store Report").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Generated: {}", Utc::now().to_rfc3339()).unwrap();
    writeln!(output).unwrap();

    for (device_id, record) in records {
        let status = if record.is_stale_at(now) { "stale" } else { "valid" };
        writeln!(output, "## {}", device_id).unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "**Type:** {} | **Age:** {:.1} days ({}) | **Platform:** {}",
            record.device_type,
            record.age_days(now),
            status,
            record.platform_info
        )
        .unwrap();
        writeln!(output).unwrap();
        write_coefficients(&mut output, record);
        writeln!(output).unwrap();
    }

    writeln!(output, "---").unwrap();
    writeln!(output, "Total devices: {}", records.len()).unwrap();

    output
}
