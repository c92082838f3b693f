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

//! Sandbox settings: a JSON file overridden by command-line flags.

use anyhow::{Context, Result};
use clap::Parser;
use ember_core::job::JobSystemConfig;
use ember_io::StreamingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Streams every asset of a directory through the job system, then optionally
/// captures a screenshot of the first loaded texture.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Directory scanned for .png, .jpg and .obj files.
    #[arg(long)]
    pub assets: PathBuf,

    /// Generic worker threads (default: hardware concurrency minus one).
    /// With 0, generic jobs run on the frame thread.
    #[arg(long)]
    pub workers: Option<usize>,

    /// JSON settings file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Capture the first loaded texture to this file once loading completes.
    #[arg(long)]
    pub screenshot: Option<PathBuf>,

    /// Time budget per frame for draining the main and render categories.
    #[arg(long)]
    pub frame_budget_ms: Option<u64>,

    /// Give up after this many frames.
    #[arg(long, default_value_t = 10_000)]
    pub max_frames: u64,
}

/// Everything the sandbox can be configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub jobs: JobSystemConfig,
    pub streaming: StreamingConfig,
    pub frame_budget_ms: u64,
    pub telemetry_interval_ms: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            jobs: JobSystemConfig::default(),
            streaming: StreamingConfig::default(),
            frame_budget_ms: 4,
            telemetry_interval_ms: 1000,
        }
    }
}

impl SandboxConfig {
    /// Loads a configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Builds the effective configuration: defaults, then the file, then flags.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(workers) = cli.workers {
            config.jobs.worker_threads = Some(workers);
        }
        if let Some(budget) = cli.frame_budget_ms {
            config.frame_budget_ms = budget;
        }
        Ok(config)
    }

    pub fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }

    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry_interval_ms)
    }
}
