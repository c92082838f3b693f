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

//! Service periodically reporting job system activity.

use ember_core::job::{JobSystem, JobSystemStats};
use std::time::{Duration, Instant};

/// Logs a [`JobSystemStats`] snapshot at a fixed interval.
#[derive(Debug)]
pub struct TelemetryService {
    last_update: Instant,
    update_interval: Duration,
    last_report: Option<JobSystemStats>,
}

impl TelemetryService {
    /// Creates a new telemetry service with the given update interval.
    pub fn new(update_interval: Duration) -> Self {
        Self {
            last_update: Instant::now(),
            update_interval,
            last_report: None,
        }
    }

    /// Should be called periodically (e.g., once per frame).
    /// Samples and logs the job system's counters if the interval has passed.
    pub fn tick(&mut self, jobs: &JobSystem) -> bool {
        if self.last_update.elapsed() < self.update_interval {
            return false;
        }

        let stats = jobs.stats();
        let executed_since = stats.executed - self.last_report.map_or(0, |last| last.executed);
        log::info!("Jobs: {stats} (+{executed_since} executed)");
        if stats.panicked > self.last_report.map_or(0, |last| last.panicked) {
            log::warn!("{} job(s) have panicked so far", stats.panicked);
        }

        self.last_report = Some(stats);
        self.last_update = Instant::now();
        true
    }

    /// The snapshot taken by the last successful [`tick`](Self::tick).
    pub fn last_report(&self) -> Option<JobSystemStats> {
        self.last_report
    }
}

impl Default for TelemetryService {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
