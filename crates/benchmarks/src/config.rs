// Copyright 2025 LLM Calibrate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Calibration configuration.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then `CALIBRATE_*` environment variables.
//!
//! ```text
//! CALIBRATE_BENCHMARKS_FILE=/var/cache/calibrate/device_benchmarks.json
//! CALIBRATE_INTERPRETER=/opt/venv/bin/python
//! CALIBRATE_AUTO_RUN=false
//! ```

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::DEFAULT_BENCHMARKS_FILE;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CALIBRATE";

/// Default program used to run probe scripts.
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Model loaded by every probe unless configured otherwise.
pub const DEFAULT_MODEL_NAME: &str = "meta-llama/Llama-3.1-8B-Instruct";

/// Settings for benchmarking and estimation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Path of the JSON benchmark store.
    pub benchmarks_file: PathBuf,
    /// Program that runs the probe scripts.
    pub interpreter: String,
    /// Model every probe loads.
    pub model_name: String,
    /// Working directory for probe processes.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Run the probes automatically when no valid benchmark exists.
    pub auto_run: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            benchmarks_file: PathBuf::from(DEFAULT_BENCHMARKS_FILE),
            interpreter: DEFAULT_INTERPRETER.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            working_dir: None,
            auto_run: true,
        }
    }
}

impl CalibrationConfig {
    /// Load configuration from defaults, `file` (if given) and the environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_with(file, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with(file: Option<&Path>, env: Environment) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default(
                "benchmarks_file",
                defaults.benchmarks_file.to_string_lossy().into_owned(),
            )?
            .set_default("interpreter", defaults.interpreter)?
            .set_default("model_name", defaults.model_name)?
            .set_default("auto_run", defaults.auto_run)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder.add_source(env.try_parsing(true)).build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        Environment::with_prefix(ENV_PREFIX).source(Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ))
    }

    #[test]
    fn test_defaults() {
        let config = CalibrationConfig::load_with(None, env(&[])).unwrap();
        assert_eq!(config, CalibrationConfig::default());
        assert_eq!(config.benchmarks_file, PathBuf::from("device_benchmarks.json"));
        assert!(config.auto_run);
    }

    #[test]
    fn test_file_then_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibrate.toml");
        std::fs::write(
            &path,
            "interpreter = \"/opt/venv/bin/python\"\nmodel_name = \"org/small\"\nauto_run = true\n",
        )
        .unwrap();

        let config = CalibrationConfig::load_with(
            Some(&path),
            env(&[("CALIBRATE_AUTO_RUN", "false"), ("CALIBRATE_MODEL_NAME", "org/override")]),
        )
        .unwrap();

        assert_eq!(config.interpreter, "/opt/venv/bin/python");
        assert_eq!(config.model_name, "org/override");
        assert!(!config.auto_run);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = CalibrationConfig::load_with(Some(Path::new("/nonexistent/calibrate.toml")), env(&[]));
        assert!(result.is_err());
    }
}
