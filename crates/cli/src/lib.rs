// Copyright 2025 LLM Calibrate Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI for LLM Calibrate.
//!
//! This crate provides the `calibrate` command: run or refresh the device
//! benchmark, inspect the benchmark store, and estimate task durations.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use llm_calibrate_benchmarks::{
    markdown, BenchmarkRecord, CalibrationConfig, DeviceBenchmarker, TaskType,
};
use tracing_subscriber::EnvFilter;

/// LLM Calibrate CLI.
#[derive(Parser, Debug)]
#[command(name = "calibrate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, global = true, env = "CALIBRATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Benchmark store path override.
    #[arg(long, global = true)]
    pub benchmarks_file: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Make sure a benchmark exists for this device, measuring one if needed.
    ///
    /// Measuring runs five probes in isolated processes and can take
    /// several minutes.
    Run {
        /// Re-run the probes even if a valid cached benchmark exists.
        #[arg(short, long)]
        force: bool,

        /// Write a markdown summary to this path.
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Show the device identity and cached benchmark status.
    Status {
        /// Print a report for every device in the store.
        #[arg(short, long)]
        all: bool,
    },

    /// Estimate how long a task takes on this device.
    Estimate {
        /// Task type: model_loading, benchmark_eval, classifier_training,
        /// steering or data_generation.
        task_type: String,

        /// Number of units (examples, classifiers).
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Fail instead of running the probes when no benchmark is cached.
        #[arg(long)]
        no_auto_run: bool,
    },
}

/// Install the global tracing subscriber.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn print_record(record: &BenchmarkRecord) {
    println!("{}", "Device benchmark".bold().green());
    println!("  Device ID:            {}", record.device_id);
    println!("  Device type:          {}", record.device_type);
    println!("  Model loading:        {:.1}s", record.model_loading_seconds);
    println!(
        "  Evaluation:           {:.1}s per 100 examples",
        record.benchmark_eval_seconds_per_100_examples
    );
    println!(
        "  Classifier creation:  {:.1}s per 100 classifiers",
        record.classifier_training_seconds_per_100_classifiers
    );
    println!(
        "  Steering:             {:.1}s per example",
        record.steering_seconds_per_example
    );
    println!(
        "  Generation:           {:.1}s per example",
        record.data_generation_seconds_per_example
    );
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Run the CLI with the given arguments.
///
/// # Returns
///
/// Returns `Ok(())` on success, or an error if the command fails.
pub fn run() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.json);

    let mut config =
        CalibrationConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(path) = cli.benchmarks_file {
        config.benchmarks_file = path;
    }

    let mut benchmarker = DeviceBenchmarker::from_config(&config);

    match cli.command {
        Commands::Run { force, report } => {
            let bar = spinner("Benchmarking device (this can take several minutes)");
            let result = benchmarker.run_full_benchmark(force);
            bar.finish_and_clear();
            let record = result?;

            print_record(record);

            if let Some(path) = report {
                std::fs::write(&path, markdown::generate_summary(record))
                    .with_context(|| format!("failed to write report to {}", path.display()))?;
                println!("Report written to {}", path.display());
            }

            Ok(())
        }
        Commands::Status { all } => {
            let info = benchmarker.device_info();
            println!("{}", "LLM Calibrate".bold());
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Device ID: {} ({})", info.device_id, info.device_type);
            println!("Store: {}", benchmarker.store().path().display());

            match benchmarker.current_benchmark(false)? {
                Some(record) => {
                    println!(
                        "Cached benchmark: {} ({:.1} days old)",
                        "valid".green(),
                        record.age_days(llm_calibrate_benchmarks::record::now_epoch_seconds())
                    );
                    print_record(record);
                }
                None => println!(
                    "Cached benchmark: {} (run `calibrate run`)",
                    "missing or stale".yellow()
                ),
            }

            if all {
                println!();
                print!(
                    "{}",
                    markdown::generate_store_report(&benchmarker.store().load_all())
                );
            }

            Ok(())
        }
        Commands::Estimate {
            task_type,
            quantity,
            no_auto_run,
        } => {
            let task: TaskType = task_type.parse()?;
            let auto_run = config.auto_run && !no_auto_run;
            let bar = auto_run.then(|| spinner("Preparing device benchmark"));
            let result = benchmarker.estimate_task_time_with(task.name(), quantity, auto_run);
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
            let seconds = result?;

            println!("{} x{}: {:.1}s", task, quantity, seconds);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_estimate() {
        let cli = Cli::try_parse_from([
            "calibrate",
            "estimate",
            "benchmark_eval",
            "--quantity",
            "20",
            "--no-auto-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Estimate {
                task_type,
                quantity,
                no_auto_run,
            } => {
                assert_eq!(task_type, "benchmark_eval");
                assert_eq!(quantity, 20);
                assert!(no_auto_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_store_override() {
        let cli = Cli::try_parse_from([
            "calibrate",
            "run",
            "--force",
            "--benchmarks-file",
            "/tmp/bench.json",
        ])
        .unwrap();
        assert_eq!(cli.benchmarks_file, Some(PathBuf::from("/tmp/bench.json")));
        assert!(matches!(cli.command, Commands::Run { force: true, report: None }));
    }
}
