// Copyright 2025 LLM Calibrate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Subprocess probe execution.
//!
//! Each probe script is written to a temporary file and run with the
//! configured interpreter. stdout and stderr are captured, the probe's
//! timeout ceiling is enforced, and the child is killed if it expires.
//!
//! The public API is blocking. A single-threaded Tokio runtime is built per
//! probe only to drive the child process and its timeout.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::debug;

use super::{protocol, scripts, Probe, ProbeExecutor};
use crate::config::CalibrationConfig;
use crate::error::ProbeFailure;

/// Number of trailing stderr lines kept in failure messages.
const STDERR_TAIL_LINES: usize = 5;

/// Runs probe scripts in isolated interpreter processes.
#[derive(Debug, Clone)]
pub struct SubprocessExecutor {
    interpreter: String,
    model_name: String,
    working_dir: Option<PathBuf>,
    script_overrides: HashMap<Probe, String>,
    timeout_overrides: HashMap<Probe, Duration>,
}

impl SubprocessExecutor {
    /// Create an executor that runs scripts with `interpreter` against `model_name`.
    pub fn new(interpreter: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            model_name: model_name.into(),
            working_dir: None,
            script_overrides: HashMap::new(),
            timeout_overrides: HashMap::new(),
        }
    }

    /// Build an executor from configuration.
    pub fn from_config(config: &CalibrationConfig) -> Self {
        let executor = Self::new(config.interpreter.clone(), config.model_name.clone());
        match &config.working_dir {
            Some(dir) => executor.with_working_dir(dir.clone()),
            None => executor,
        }
    }

    /// Run probe processes from `dir`.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Replace the built-in script for `probe`.
    pub fn with_script(mut self, probe: Probe, script: impl Into<String>) -> Self {
        self.script_overrides.insert(probe, script.into());
        self
    }

    /// Replace the timeout ceiling for `probe`.
    pub fn with_timeout(mut self, probe: Probe, timeout: Duration) -> Self {
        self.timeout_overrides.insert(probe, timeout);
        self
    }

    /// Script source that will run for `probe`.
    pub fn script_for(&self, probe: Probe) -> String {
        self.script_overrides
            .get(&probe)
            .cloned()
            .unwrap_or_else(|| scripts::render(probe, &self.model_name))
    }

    /// Timeout ceiling that applies to `probe`.
    pub fn timeout_for(&self, probe: Probe) -> Duration {
        self.timeout_overrides
            .get(&probe)
            .copied()
            .unwrap_or_else(|| probe.timeout())
    }

    async fn run_script(&self, path: &Path, timeout: Duration) -> Result<Output, ProbeFailure> {
        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn()?;

        // On timeout the child is dropped inside the future and killed.
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => Ok(output?),
            Err(_elapsed) => Err(ProbeFailure::Timeout(timeout)),
        }
    }
}

impl ProbeExecutor for SubprocessExecutor {
    fn execute(&self, probe: Probe) -> Result<f64, ProbeFailure> {
        let mut script = tempfile::Builder::new()
            .prefix("calibrate-probe-")
            .suffix(".py")
            .tempfile()?;
        script.write_all(self.script_for(probe).as_bytes())?;
        script.flush()?;

        let timeout = self.timeout_for(probe);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let start = Instant::now();
        let output = runtime.block_on(self.run_script(script.path(), timeout))?;
        debug!(
            probe = %probe,
            wall_ms = start.elapsed().as_millis() as u64,
            exit_code = ?output.status.code(),
            "Probe process finished"
        );

        interpret_output(&output)
    }
}

/// Map a finished process to the reported seconds or a failure.
fn interpret_output(output: &Output) -> Result<f64, ProbeFailure> {
    let stdout = String::from_utf8_lossy(&output.stdout);

    if !output.status.success() {
        let message = protocol::find_error(&stdout)
            .map(str::to_string)
            .unwrap_or_else(|| stderr_tail(&output.stderr));
        return Err(ProbeFailure::NonZeroExit {
            code: output.status.code().unwrap_or(-1),
            message,
        });
    }

    protocol::parse_result(&stdout)
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return "no output on stderr".to_string();
    }
    lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join(" | ")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(probe: Probe, script: &str) -> SubprocessExecutor {
        SubprocessExecutor::new("sh", "test-model").with_script(probe, script)
    }

    #[test]
    fn test_reads_result_line() {
        let executor = sh(
            Probe::ModelLoading,
            "echo 'warming up'\necho 'BENCHMARK_RESULT:2.5'\necho bye\n",
        );
        assert_eq!(executor.execute(Probe::ModelLoading).unwrap(), 2.5);
    }

    #[test]
    fn test_non_zero_exit_carries_error_line() {
        let executor = sh(Probe::Steering, "echo 'BENCHMARK_ERROR:boom'\nexit 3\n");
        match executor.execute(Probe::Steering) {
            Err(ProbeFailure::NonZeroExit { code, message }) => {
                assert_eq!(code, 3);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_non_zero_exit_falls_back_to_stderr() {
        let executor = sh(Probe::Steering, "echo 'Traceback: oops' >&2\nexit 1\n");
        match executor.execute(Probe::Steering) {
            Err(ProbeFailure::NonZeroExit { message, .. }) => assert!(message.contains("oops")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_result_is_ignored_on_failure_exit() {
        let executor = sh(Probe::BenchmarkEval, "echo 'BENCHMARK_RESULT:1.0'\nexit 2\n");
        assert!(matches!(
            executor.execute(Probe::BenchmarkEval),
            Err(ProbeFailure::NonZeroExit { code: 2, .. })
        ));
    }

    #[test]
    fn test_missing_result_line() {
        let executor = sh(Probe::DataGeneration, "echo 'nothing to see'\n");
        assert!(matches!(
            executor.execute(Probe::DataGeneration),
            Err(ProbeFailure::MissingResult)
        ));
    }

    #[test]
    fn test_timeout_kills_probe() {
        let executor = sh(Probe::ClassifierTraining, "sleep 5\necho 'BENCHMARK_RESULT:1.0'\n")
            .with_timeout(Probe::ClassifierTraining, Duration::from_millis(200));
        let start = Instant::now();
        assert!(matches!(
            executor.execute(Probe::ClassifierTraining),
            Err(ProbeFailure::Timeout(_))
        ));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_missing_interpreter_fails_to_launch() {
        let executor = SubprocessExecutor::new("definitely-not-a-real-interpreter-xyz", "m");
        assert!(matches!(
            executor.execute(Probe::ModelLoading),
            Err(ProbeFailure::Launch(_))
        ));
    }

    #[test]
    fn test_defaults_use_builtin_scripts_and_timeouts() {
        let executor = SubprocessExecutor::new("python3", "org/model");
        assert!(executor.script_for(Probe::ModelLoading).contains("\"org/model\""));
        assert_eq!(executor.timeout_for(Probe::ClassifierTraining), Duration::from_secs(600));
    }
}
