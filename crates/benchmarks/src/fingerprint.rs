// Copyright 2025 LLM Calibrate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Device fingerprinting.
//!
//! A fingerprint combines CPU architecture, processor name, OS name and
//! release, the probe runtime version and the accelerator (if any) into one
//! canonical string. The device id is a truncated SHA-256 of that string, so
//! identical hardware and software always map to the same cached benchmark.
//!
//! Detection never fails: anything that cannot be queried degrades to
//! `"unknown"` or to "no accelerator".

use std::process::Command;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::record::DeviceType;

/// Length of the hex device identifier.
pub const DEVICE_ID_LEN: usize = 12;

const UNKNOWN: &str = "unknown";

/// Accelerator detected on the current machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum Accelerator {
    /// No supported accelerator.
    None,
    /// CUDA device with its reported name.
    Cuda {
        /// GPU product name, e.g. "NVIDIA A100-SXM4-80GB".
        name: String,
    },
    /// Apple Metal Performance Shaders.
    Mps,
}

impl Accelerator {
    /// Probe for an accelerator, preferring CUDA over MPS.
    pub fn detect() -> Self {
        if let Some(name) = detect_cuda_device_name() {
            Self::Cuda { name }
        } else if mps_available() {
            Self::Mps
        } else {
            Self::None
        }
    }

    /// Closed device class for this accelerator.
    pub fn device_type(&self) -> DeviceType {
        match self {
            Self::None => DeviceType::Cpu,
            Self::Cuda { .. } => DeviceType::Cuda,
            Self::Mps => DeviceType::Mps,
        }
    }

    /// Fingerprint component, absent for CPU-only machines.
    fn tag(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Cuda { name } => Some(format!("cuda_{name}")),
            Self::Mps => Some("mps".to_string()),
        }
    }
}

/// Hardware and software attributes identifying a device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFingerprint {
    /// CPU architecture, e.g. `x86_64`.
    pub arch: String,
    /// Processor brand string.
    pub processor: String,
    /// Operating system name.
    pub os: String,
    /// Operating system release.
    pub os_release: String,
    /// Version string of the runtime that executes probes.
    pub runtime_version: String,
    /// Accelerator, if any.
    pub accelerator: Accelerator,
}

impl DeviceFingerprint {
    /// Collect the fingerprint of the current machine.
    ///
    /// `interpreter` is the program used to run probe scripts; its version
    /// is part of the fingerprint because it affects measured timings.
    pub fn detect(interpreter: &str) -> Self {
        Self {
            arch: std::env::consts::ARCH.to_string(),
            processor: detect_processor_name().unwrap_or_else(|| UNKNOWN.to_string()),
            os: std::env::consts::OS.to_string(),
            os_release: command_stdout("uname", &["-r"]).unwrap_or_else(|| UNKNOWN.to_string()),
            runtime_version: detect_runtime_version(interpreter),
            accelerator: Accelerator::detect(),
        }
    }

    /// Canonical `|`-joined string that is hashed into the device id.
    pub fn canonical(&self) -> String {
        let mut parts = vec![
            self.arch.clone(),
            self.processor.clone(),
            self.os.clone(),
            self.os_release.clone(),
            self.runtime_version.clone(),
        ];
        if let Some(tag) = self.accelerator.tag() {
            parts.push(tag);
        }
        parts.join("|")
    }

    /// Stable truncated hex identifier for this fingerprint.
    pub fn compute_id(&self) -> String {
        let digest = Sha256::digest(self.canonical().as_bytes());
        let mut id = hex::encode(digest);
        id.truncate(DEVICE_ID_LEN);
        id
    }

    /// Device class derived from the accelerator.
    pub fn compute_type(&self) -> DeviceType {
        self.accelerator.device_type()
    }

    /// Human-readable platform description stored with records.
    pub fn platform_info(&self) -> String {
        format!("{}-{}-{}", self.os, self.os_release, self.arch)
    }
}

/// Run a command and return its trimmed stdout when it succeeds with output.
fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn detect_cuda_device_name() -> Option<String> {
    let listing = command_stdout("nvidia-smi", &["--query-gpu=name", "--format=csv,noheader"])?;
    listing
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

fn mps_available() -> bool {
    cfg!(all(target_os = "macos", target_arch = "aarch64"))
}

fn detect_runtime_version(interpreter: &str) -> String {
    let Ok(output) = Command::new(interpreter).arg("--version").output() else {
        return UNKNOWN.to_string();
    };
    // Older Python builds print the version on stderr.
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).trim().to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    };
    if output.status.success() && !text.is_empty() {
        text
    } else {
        UNKNOWN.to_string()
    }
}

#[cfg(target_os = "linux")]
fn detect_processor_name() -> Option<String> {
    let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
    cpuinfo
        .lines()
        .find(|line| line.starts_with("model name") || line.starts_with("Model"))
        .and_then(|line| line.split(':').nth(1))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(target_os = "macos")]
fn detect_processor_name() -> Option<String> {
    command_stdout("sysctl", &["-n", "machdep.cpu.brand_string"])
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn detect_processor_name() -> Option<String> {
    None
}
