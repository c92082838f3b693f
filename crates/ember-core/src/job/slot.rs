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

//! The arena entry holding one job and its scheduling state.

use super::{Job, JobCategory, JobId, JobOutcome, JobState};
use std::any::{Any, TypeId};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub(crate) type FinishCallback = Box<dyn FnOnce(&mut dyn Job, JobOutcome) + Send>;

/// State transitions guarded by the per-job lock.
#[derive(Debug)]
struct Lifecycle {
    state: JobState,
    submitted: bool,
    successors: Vec<JobId>,
    outcome: Option<JobOutcome>,
}

pub(crate) struct JobSlot {
    id: JobId,
    category: JobCategory,
    name: String,
    job_type: TypeId,
    predecessors: AtomicUsize,
    lifecycle: Mutex<Lifecycle>,
    // Taken out while executing so the lock is not held across user code.
    job: Mutex<Option<Box<dyn Job>>>,
    callback: Mutex<Option<FinishCallback>>,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl JobSlot {
    pub(crate) fn new<J: Job>(id: JobId, category: JobCategory, job: J) -> Self {
        Self {
            id,
            category,
            name: job.name().to_string(),
            job_type: TypeId::of::<J>(),
            predecessors: AtomicUsize::new(0),
            lifecycle: Mutex::new(Lifecycle {
                state: JobState::Created,
                submitted: false,
                successors: Vec::new(),
                outcome: None,
            }),
            job: Mutex::new(Some(Box::new(job))),
            callback: Mutex::new(None),
        }
    }

    pub(crate) fn id(&self) -> JobId {
        self.id
    }

    pub(crate) fn category(&self) -> JobCategory {
        self.category
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_job_type<J: Job>(&self) -> bool {
        self.job_type == TypeId::of::<J>()
    }

    pub(crate) fn state(&self) -> JobState {
        relock(&self.lifecycle).state
    }

    pub(crate) fn predecessor_count(&self) -> usize {
        self.predecessors.load(Ordering::Acquire)
    }

    pub(crate) fn successors(&self) -> Vec<JobId> {
        relock(&self.lifecycle).successors.clone()
    }

    /// Records `successor` as depending on this job.
    ///
    /// Both lifecycle locks are held while the edge is written, so neither job
    /// can be submitted halfway through. Callers serialize edge edits through
    /// the registry lock, which rules out lock-order inversions here.
    pub(crate) fn link_successor(&self, successor: &JobSlot) -> Result<(), JobId> {
        let mut lifecycle = relock(&self.lifecycle);
        if lifecycle.submitted || lifecycle.state != JobState::Created {
            return Err(self.id);
        }
        let successor_lifecycle = relock(&successor.lifecycle);
        if successor_lifecycle.state != JobState::Created {
            return Err(successor.id);
        }
        successor.predecessors.fetch_add(1, Ordering::AcqRel);
        lifecycle.successors.push(successor.id);
        drop(successor_lifecycle);
        Ok(())
    }

    /// Marks the job submitted and moves it to `Ready` if nothing blocks it.
    ///
    /// ## Returns
    /// `true` exactly once: for the call that made the job ready. The caller is
    /// then responsible for queueing it.
    pub(crate) fn try_make_ready(&self) -> bool {
        let mut lifecycle = relock(&self.lifecycle);
        lifecycle.submitted = true;
        if lifecycle.state == JobState::Created && self.predecessor_count() == 0 {
            lifecycle.state = JobState::Ready;
            true
        } else {
            false
        }
    }

    /// Drops one predecessor. Returns `true` when it was the last one.
    pub(crate) fn release_predecessor(&self) -> bool {
        let previous = self.predecessors.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "predecessor count underflow on {}", self.id);
        previous == 1
    }

    /// Claims the job for execution. Succeeds at most once per job.
    pub(crate) fn try_start(&self) -> bool {
        let mut lifecycle = relock(&self.lifecycle);
        if lifecycle.state == JobState::Ready {
            lifecycle.state = JobState::Running;
            true
        } else {
            false
        }
    }

    /// Runs the job on the calling thread, catching panics.
    pub(crate) fn execute(&self) -> JobOutcome {
        let Some(mut job) = relock(&self.job).take() else {
            log::error!("{} ('{}') has no job body to execute", self.id, self.name);
            return JobOutcome::Panicked;
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| job.execute()));
        *relock(&self.job) = Some(job);

        match result {
            Ok(()) => JobOutcome::Completed,
            Err(payload) => {
                log::error!(
                    "{} ('{}') panicked: {}",
                    self.id,
                    self.name,
                    panic_message(payload.as_ref())
                );
                JobOutcome::Panicked
            }
        }
    }

    /// Moves the job to `Finished` and hands back its successor list.
    pub(crate) fn finish(&self, outcome: JobOutcome) -> Vec<JobId> {
        let mut lifecycle = relock(&self.lifecycle);
        debug_assert_eq!(lifecycle.state, JobState::Running);
        lifecycle.state = JobState::Finished;
        lifecycle.outcome = Some(outcome);
        std::mem::take(&mut lifecycle.successors)
    }

    pub(crate) fn set_callback(&self, callback: FinishCallback) {
        *relock(&self.callback) = Some(callback);
    }

    /// Runs the finish callback, if any. The callback is consumed, so it can
    /// only ever run once.
    pub(crate) fn invoke_callback(&self) -> bool {
        let Some(callback) = relock(&self.callback).take() else {
            return false;
        };
        let outcome = relock(&self.lifecycle)
            .outcome
            .unwrap_or(JobOutcome::Completed);
        let mut guard = relock(&self.job);
        match guard.as_deref_mut() {
            Some(job) => {
                callback(job, outcome);
                true
            }
            None => {
                log::error!("{} lost its job body before its finish callback", self.id);
                false
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
