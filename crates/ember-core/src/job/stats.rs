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

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A point-in-time snapshot of job system activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobSystemStats {
    /// Jobs that entered a pending queue.
    pub submitted: u64,
    /// Jobs whose execution returned, including panicked ones.
    pub executed: u64,
    /// Jobs whose execution panicked.
    pub panicked: u64,
    /// Jobs reaped after their finish callback step.
    pub callbacks_run: u64,
    /// Jobs currently held in the arena.
    pub live_jobs: usize,
    /// Background worker threads.
    pub workers: usize,
}

impl fmt::Display for JobSystemStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "submitted={} executed={} panicked={} callbacks={} live={} workers={}",
            self.submitted,
            self.executed,
            self.panicked,
            self.callbacks_run,
            self.live_jobs,
            self.workers
        )
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatCounters {
    pub(crate) submitted: AtomicU64,
    pub(crate) executed: AtomicU64,
    pub(crate) panicked: AtomicU64,
    pub(crate) callbacks_run: AtomicU64,
}

impl StatCounters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, live_jobs: usize, workers: usize) -> JobSystemStats {
        JobSystemStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            callbacks_run: self.callbacks_run.load(Ordering::Relaxed),
            live_jobs,
            workers,
        }
    }
}
