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

//! # Ember Core
//!
//! Foundational crate containing the job system, its concurrency primitives,
//! and the interface contracts that the rest of the engine builds on.
//!
//! - [`sync`]: the counting [`sync::Semaphore`] and the [`sync::AsyncQueue`].
//! - [`job`]: jobs, categories, dependency edges, and the [`JobSystem`] that
//!   schedules them across worker threads and owning threads.
//! - [`renderer`]: the graphics device contract consumed by GPU-affine jobs.
//! - [`context`]: the explicitly constructed [`EngineContext`].

#![warn(missing_docs)]

pub mod context;
pub mod job;
pub mod renderer;
pub mod sync;

pub use context::EngineContext;
pub use job::{
    FnJob, Job, JobCategory, JobError, JobId, JobOutcome, JobState, JobSystem, JobSystemConfig,
    JobSystemStats,
};
pub use sync::{AsyncQueue, Semaphore};
