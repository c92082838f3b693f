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

//! Jobs, categories, and the [`JobSystem`] that schedules them.
//!
//! A job is a unit of work with a category, a set of dependency edges, and an
//! optional finish callback. The category decides which thread is allowed to
//! execute it:
//! - [`JobCategory::GENERIC`] jobs are picked up by background worker threads.
//! - [`JobCategory::MAIN`] and [`JobCategory::RENDER`] jobs are only executed when
//!   their owning thread drains the category, once per frame.
//!
//! Finish callbacks always run on the thread that drains the category's
//! finished queue, never on a worker, which keeps non-thread-safe completion
//! work (GPU resource creation, UI updates) on its owning thread.

mod category;
mod config;
mod error;
mod slot;
mod stats;
mod system;

pub use category::JobCategoryQueues;
pub use config::{ConfigError, JobSystemConfig};
pub use error::JobError;
pub use stats::JobSystemStats;
pub use system::JobSystem;

use std::any::Any;
use std::fmt;

/// Number of categories a job system provides unless configured otherwise.
pub const DEFAULT_CATEGORY_COUNT: usize = 3;

/// A stable handle into the job system's job arena.
///
/// Identifiers are allocated monotonically and never reused, so a stale id
/// can only ever resolve to "unknown job", never to a different job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub(crate) u64);

impl JobId {
    /// Returns the raw numeric value of the identifier.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

/// Identifies which execution context may run a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobCategory(u8);

impl JobCategory {
    /// Drained by the background worker pool.
    pub const GENERIC: JobCategory = JobCategory(0);
    /// Drained synchronously by the main (game) thread.
    pub const MAIN: JobCategory = JobCategory(1);
    /// Drained synchronously by the render thread.
    pub const RENDER: JobCategory = JobCategory(2);

    /// Creates a category from its index. Indices past the built-in ones are
    /// valid when the job system was started with enough categories.
    pub const fn new(index: u8) -> Self {
        JobCategory(index)
    }

    /// Returns the category's index into the job system's category table.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for JobCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            JobCategory::GENERIC => f.write_str("generic"),
            JobCategory::MAIN => f.write_str("main"),
            JobCategory::RENDER => f.write_str("render"),
            JobCategory(index) => write!(f, "category-{index}"),
        }
    }
}

/// Lifecycle of a job inside the job system.
///
/// `Created -> Ready -> Running -> Finished`. There is no retry state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// In the arena, waiting for submission or for predecessors to finish.
    Created,
    /// All predecessors finished; queued in its category's pending queue.
    Ready,
    /// Claimed by exactly one thread and executing.
    Running,
    /// Execution returned; waiting for its finish callback to be drained.
    Finished,
}

/// How a job's execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobOutcome {
    /// `execute` returned normally.
    Completed,
    /// `execute` panicked. The panic was caught on the executing thread.
    Panicked,
}

/// A unit of work schedulable by the [`JobSystem`].
///
/// Jobs are moved into the system's arena on creation and stay owned by it until
/// their finish callback has run. Anything a job produces lives in the job itself
/// (or is handed off through an [`crate::sync::AsyncQueue`]) and is inspected by
/// the finish callback.
///
/// # Examples
///
/// ```
/// use ember_core::job::Job;
/// use std::any::Any;
///
/// struct Sum {
///     values: Vec<u32>,
///     total: u32,
/// }
///
/// impl Job for Sum {
///     fn execute(&mut self) {
///         self.total = self.values.iter().sum();
///     }
///
///     fn name(&self) -> &str {
///         "sum"
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
///
///     fn as_any_mut(&mut self) -> &mut dyn Any {
///         self
///     }
/// }
/// ```
pub trait Job: Send + 'static {
    /// Performs the work. Runs on whichever thread claimed the job.
    fn execute(&mut self);

    /// A short name used in logs.
    fn name(&self) -> &str;

    /// Returns the job as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Gives finish callbacks typed access to the concrete job.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A job wrapping a closure, for work that needs no result state.
pub struct FnJob<F>
where
    F: FnOnce() + Send + 'static,
{
    name: &'static str,
    work: Option<F>,
}

impl<F> FnJob<F>
where
    F: FnOnce() + Send + 'static,
{
    /// Wraps `work` into a job named `name`.
    pub fn new(name: &'static str, work: F) -> Self {
        Self {
            name,
            work: Some(work),
        }
    }

    /// Returns `true` once the closure has been run.
    pub fn has_run(&self) -> bool {
        self.work.is_none()
    }
}

impl<F> Job for FnJob<F>
where
    F: FnOnce() + Send + 'static,
{
    fn execute(&mut self) {
        if let Some(work) = self.work.take() {
            work();
        }
    }

    fn name(&self) -> &str {
        self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
