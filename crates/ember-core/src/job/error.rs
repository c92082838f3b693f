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

//! Defines the errors reported by the job system.

use super::{JobCategory, JobId};
use thiserror::Error;

/// An error returned by a [`super::JobSystem`] operation.
///
/// These are programming errors on the caller's side (unknown handles, edges
/// wired too late, cycles) or lifecycle errors (submitting after shutdown).
/// Failures inside a job's own work never surface here; they are recorded in
/// the job and inspected by its finish callback.
#[derive(Debug, Error)]
pub enum JobError {
    /// The id does not name a live job. It was never created or has been reaped.
    #[error("{0} is not a live job")]
    UnknownJob(JobId),

    /// The category index is outside the job system's category table.
    #[error("category {category} is out of range (the job system has {count} categories)")]
    UnknownCategory {
        /// The requested category.
        category: JobCategory,
        /// Number of categories the system was started with.
        count: usize,
    },

    /// The configuration asked for an unusable number of categories.
    #[error("invalid category count {requested}: must be between {minimum} and {maximum}")]
    InvalidCategoryCount {
        /// The configured category count.
        requested: usize,
        /// Smallest accepted value.
        minimum: usize,
        /// Largest accepted value.
        maximum: usize,
    },

    /// A dependency edge was added after its predecessor had been submitted,
    /// or its successor had already become ready.
    #[error("{0} has already been submitted; dependencies must be wired before submission")]
    AlreadySubmitted(JobId),

    /// A job cannot depend on itself.
    #[error("{0} cannot depend on itself")]
    SelfDependency(JobId),

    /// The edge `from -> to` would close a dependency cycle.
    #[error("adding {from} -> {to} would create a dependency cycle")]
    DependencyCycle {
        /// The would-be predecessor.
        from: JobId,
        /// The would-be successor.
        to: JobId,
    },

    /// The job system has been shut down.
    #[error("the job system is not running")]
    NotRunning,

    /// A finish callback was registered for a different concrete job type.
    #[error("finish callback for {job} expects a `{expected}` job")]
    CallbackTypeMismatch {
        /// The job the callback was registered on.
        job: JobId,
        /// The type the callback expected.
        expected: &'static str,
    },

    /// A worker thread could not be spawned.
    #[error("failed to spawn a worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}
