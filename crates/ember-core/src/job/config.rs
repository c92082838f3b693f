// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::DEFAULT_CATEGORY_COUNT;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading or writing a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("config file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON for the expected structure.
    #[error("config file is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Startup parameters of a [`super::JobSystem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSystemConfig {
    /// Number of generic worker threads. `None` derives it from the hardware:
    /// one per logical core, minus one left for the main thread.
    pub worker_threads: Option<usize>,
    /// Number of job categories. At least the three built-in ones.
    pub category_count: usize,
    /// Worker thread name prefix; workers are named `"{thread_name}-{index}"`.
    pub thread_name: String,
}

impl Default for JobSystemConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            category_count: DEFAULT_CATEGORY_COUNT,
            thread_name: "ember-worker".to_string(),
        }
    }
}

impl JobSystemConfig {
    /// Creates a configuration with the given worker and category counts.
    pub fn new(worker_threads: Option<usize>, category_count: usize) -> Self {
        Self {
            worker_threads,
            category_count,
            ..Self::default()
        }
    }

    /// Returns the number of workers to spawn, resolving the hardware default.
    pub fn resolved_worker_threads(&self) -> usize {
        match self.worker_threads {
            Some(count) => count,
            None => std::thread::available_parallelism()
                .map(|n| n.get().saturating_sub(1).max(1))
                .unwrap_or(1),
        }
    }

    /// Loads a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Saves the configuration to a JSON file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = JobSystemConfig::from_json(r#"{ "worker_threads": 2 }"#).unwrap();
        assert_eq!(config.worker_threads, Some(2));
        assert_eq!(config.category_count, DEFAULT_CATEGORY_COUNT);
        assert_eq!(config.thread_name, "ember-worker");
        assert_eq!(config.resolved_worker_threads(), 2);
    }

    #[test]
    fn hardware_default_leaves_a_core_for_the_main_thread() {
        let config = JobSystemConfig::default();
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(config.resolved_worker_threads(), cores.saturating_sub(1).max(1));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");

        let config = JobSystemConfig {
            worker_threads: Some(3),
            category_count: 4,
            thread_name: "loader".to_string(),
        };
        config.to_file(&path).unwrap();

        assert_eq!(JobSystemConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn malformed_json_is_reported() {
        let error = JobSystemConfig::from_json("{ worker_threads: ").unwrap_err();
        assert!(matches!(error, ConfigError::Json(_)));
    }
}
