// Copyright 2025 LLM Calibrate Contributors
// SPDX-License-Identifier: Apache-2.0

//! JSON-backed benchmark store.
//!
//! The store is a single JSON object mapping device ids to
//! [`BenchmarkRecord`]s. Reads never fail: a missing file, unknown device,
//! malformed document or stale record all read as "absent". Writes replace
//! the whole file and log failures instead of returning them.
//!
//! There is no locking. Concurrent writers race and the last one wins.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::record::{now_epoch_seconds, BenchmarkRecord};

/// Default store file name.
pub const DEFAULT_BENCHMARKS_FILE: &str = "device_benchmarks.json";

/// Device id to benchmark record mapping persisted as JSON.
#[derive(Debug, Clone)]
pub struct BenchmarkStore {
    path: PathBuf,
}

impl Default for BenchmarkStore {
    fn default() -> Self {
        Self::new(DEFAULT_BENCHMARKS_FILE)
    }
}

impl BenchmarkStore {
    /// Create a store backed by `path`. The file need not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the valid record for `device_id`, if any.
    pub fn load(&self, device_id: &str) -> Option<BenchmarkRecord> {
        self.load_at(device_id, now_epoch_seconds())
    }

    /// Load the record for `device_id`, judging staleness against `now`.
    pub fn load_at(&self, device_id: &str, now: f64) -> Option<BenchmarkRecord> {
        let document = match self.read_document() {
            Ok(Some(document)) => document,
            Ok(None) => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Error loading cached benchmark");
                return None;
            }
        };

        let entry = document.get(device_id)?;
        let record: BenchmarkRecord = match serde_json::from_value(entry.clone()) {
            Ok(record) => record,
            Err(e) => {
                warn!(device_id = %device_id, error = %e, "Cached benchmark entry is malformed");
                return None;
            }
        };

        if !record.is_valid_at(now) {
            warn!(
                device_id = %device_id,
                created_at = record.created_at,
                "Cached benchmark has invalid durations or timestamp, will re-run"
            );
            return None;
        }

        if record.is_stale_at(now) {
            info!(
                device_id = %device_id,
                age_days = record.age_days(now),
                "Cached benchmark is stale, will re-run"
            );
            return None;
        }

        Some(record)
    }

    /// Every entry that parses as a record, stale or not.
    pub fn load_all(&self) -> BTreeMap<String, BenchmarkRecord> {
        match self.read_document() {
            Ok(Some(document)) => document
                .into_iter()
                .filter_map(|(id, value)| {
                    serde_json::from_value(value).ok().map(|record| (id, record))
                })
                .collect(),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Error reading benchmark store");
                BTreeMap::new()
            }
        }
    }

    /// Insert or overwrite the entry for `record.device_id`.
    ///
    /// Failures are logged; the caller keeps its in-memory record either way.
    pub fn save(&self, record: &BenchmarkRecord) {
        match self.try_save(record) {
            Ok(()) => info!(path = %self.path.display(), "Saved benchmark results"),
            Err(e) => error!(path = %self.path.display(), error = %e, "Error saving benchmark"),
        }
    }

    /// Fallible form of [`save`](Self::save).
    pub fn try_save(&self, record: &BenchmarkRecord) -> Result<(), StoreError> {
        let mut document = self.read_document()?.unwrap_or_default();
        document.insert(record.device_id.clone(), serde_json::to_value(record)?);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&Value::Object(document))?;
        fs::write(&self.path, json)?;
        debug!(device_id = %record.device_id, "Benchmark entry written");
        Ok(())
    }

    /// Read the whole document. `Ok(None)` means the file does not exist.
    fn read_document(&self) -> Result<Option<Map<String, Value>>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(StoreError::NotAnObject),
        }
    }
}
