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

//! The [`JobSystem`]: worker pool, category table, and job arena.

use super::category::JobCategoryQueues;
use super::slot::JobSlot;
use super::stats::{JobSystemStats, StatCounters};
use super::{Job, JobCategory, JobError, JobId, JobOutcome, JobState, JobSystemConfig};
use super::DEFAULT_CATEGORY_COUNT;
use crate::sync::Semaphore;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Upper bound on categories; [`JobCategory`] indices are a `u8`.
const MAX_CATEGORY_COUNT: usize = u8::MAX as usize + 1;

type Registry = HashMap<JobId, Arc<JobSlot>>;

/// State shared between the owning handle and the worker threads.
struct Shared {
    categories: Vec<JobCategoryQueues>,
    registry: Mutex<Registry>,
    next_id: AtomicU64,
    wake: Semaphore,
    running: AtomicBool,
    stats: StatCounters,
}

impl Shared {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, id: JobId) -> Result<Arc<JobSlot>, JobError> {
        self.registry()
            .get(&id)
            .cloned()
            .ok_or(JobError::UnknownJob(id))
    }

    fn queues(&self, category: JobCategory) -> Result<&JobCategoryQueues, JobError> {
        self.categories
            .get(category.index())
            .ok_or(JobError::UnknownCategory {
                category,
                count: self.categories.len(),
            })
    }

    /// Queues a job that just became ready and wakes a worker for generic work.
    fn make_ready(&self, slot: &JobSlot) {
        let queues = &self.categories[slot.category().index()];
        match queues.enqueue(slot.id()) {
            Ok(()) => {
                StatCounters::bump(&self.stats.submitted);
                log::debug!("{} ('{}') ready in {}", slot.id(), slot.name(), slot.category());
                if slot.category() == JobCategory::GENERIC {
                    self.wake.release(1);
                }
            }
            Err(id) => {
                log::warn!("{id} became ready after shutdown and will not run");
            }
        }
    }

    /// Claims, executes and finishes one job on the calling thread.
    ///
    /// ## Returns
    /// `true` if this call executed the job, `false` if the id was stale or
    /// another thread had already claimed it.
    fn execute(&self, id: JobId) -> bool {
        let slot = match self.slot(id) {
            Ok(slot) => slot,
            Err(_) => {
                log::error!("{id} was queued but is missing from the job arena");
                return false;
            }
        };

        // 1. Ready -> Running, at most once.
        if !slot.try_start() {
            log::trace!("{id} was already claimed");
            return false;
        }

        // 2. Run the job body, panics included.
        log::trace!("{id} ('{}') running on {:?}", slot.name(), thread::current().name());
        let outcome = slot.execute();
        StatCounters::bump(&self.stats.executed);
        if outcome == JobOutcome::Panicked {
            StatCounters::bump(&self.stats.panicked);
        }

        // 3. Finished. Queue the callback before any successor can run.
        let successors = slot.finish(outcome);
        if let Err(id) = self.categories[slot.category().index()].enqueue_finished(id) {
            log::error!("finished queue of {} refused {id}", slot.category());
        }

        // 4. Release successors; the last predecessor to finish submits them.
        for successor_id in successors {
            match self.slot(successor_id) {
                Ok(successor) => {
                    if successor.release_predecessor() && successor.try_make_ready() {
                        self.make_ready(&successor);
                    }
                }
                Err(_) => log::error!("{id} has a successor {successor_id} that no longer exists"),
            }
        }
        true
    }

    /// Returns `true` if `target` is reachable from `start` along successor edges.
    fn reaches(registry: &Registry, start: JobId, target: JobId) -> bool {
        let mut stack = vec![start];
        let mut visited = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            if let Some(slot) = registry.get(&id) {
                stack.extend(slot.successors());
            }
        }
        false
    }
}

fn worker_loop(shared: Arc<Shared>, index: usize) {
    log::debug!("job worker {index} started");
    let generic = &shared.categories[JobCategory::GENERIC.index()];
    while shared.wake.acquire() {
        if !shared.running.load(Ordering::Acquire) {
            break;
        }
        if let Some(id) = generic.try_dequeue() {
            shared.execute(id);
        }
    }
    log::debug!("job worker {index} exiting");
}

/// Schedules [`Job`]s across a pool of generic workers and the threads that
/// own the other categories.
///
/// Jobs are moved into a system-owned arena on [`create`](Self::create) and
/// referenced by [`JobId`] afterwards. A job stays in the arena until its
/// category's finished queue is drained with
/// [`process_finish_callbacks`](Self::process_finish_callbacks), which runs its
/// finish callback and then drops it together with its payload.
///
/// Generic jobs are executed by background workers. Every other category is
/// only executed when its owning thread calls
/// [`process_job_category`](Self::process_job_category).
pub struct JobSystem {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl JobSystem {
    /// Starts a job system and spawns its generic workers.
    ///
    /// ## Arguments
    /// * `config` - Worker count, category count and worker thread names.
    ///
    /// ## Errors
    /// Returns [`JobError::InvalidCategoryCount`] if fewer than the built-in
    /// categories (or more than 256) are requested, and [`JobError::Spawn`] if a
    /// worker thread could not be created. Workers spawned before the failure
    /// are shut down again.
    pub fn startup(config: JobSystemConfig) -> Result<Self, JobError> {
        if !(DEFAULT_CATEGORY_COUNT..=MAX_CATEGORY_COUNT).contains(&config.category_count) {
            return Err(JobError::InvalidCategoryCount {
                requested: config.category_count,
                minimum: DEFAULT_CATEGORY_COUNT,
                maximum: MAX_CATEGORY_COUNT,
            });
        }

        let categories = (0..config.category_count)
            .map(|index| JobCategoryQueues::new(JobCategory::new(index as u8)))
            .collect();
        let shared = Arc::new(Shared {
            categories,
            registry: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            wake: Semaphore::new(0),
            running: AtomicBool::new(true),
            stats: StatCounters::default(),
        });

        let worker_count = config.resolved_worker_threads();
        let system = Self {
            shared,
            workers: Mutex::new(Vec::with_capacity(worker_count)),
            worker_count,
        };

        for index in 0..worker_count {
            let shared = Arc::clone(&system.shared);
            let handle = thread::Builder::new()
                .name(format!("{}-{index}", config.thread_name))
                .spawn(move || worker_loop(shared, index))?;
            system.lock_workers().push(handle);
        }

        log::info!(
            "Job system started: {} worker(s), {} categories",
            worker_count,
            config.category_count
        );
        Ok(system)
    }

    fn lock_workers(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_running(&self) -> Result<(), JobError> {
        if self.shared.running.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(JobError::NotRunning)
        }
    }

    /// Moves `job` into the arena in the `Created` state.
    ///
    /// The job does not run until [`run`](Self::run) is called on it or, for a
    /// job with predecessors, until its last predecessor finishes.
    ///
    /// ## Errors
    /// [`JobError::UnknownCategory`] or [`JobError::NotRunning`].
    pub fn create<J: Job>(&self, job: J, category: JobCategory) -> Result<JobId, JobError> {
        self.ensure_running()?;
        self.shared.queues(category)?;

        let id = JobId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let slot = JobSlot::new(id, category, job);
        log::trace!("{id} ('{}') created in {category}", slot.name());
        self.shared.registry().insert(id, Arc::new(slot));
        Ok(id)
    }

    /// Makes `successor` depend on `job`: it will not start before `job` has
    /// finished executing.
    ///
    /// ## Errors
    /// - [`JobError::UnknownJob`] if either id is not live.
    /// - [`JobError::SelfDependency`] if both ids are the same.
    /// - [`JobError::DependencyCycle`] if `successor` already reaches `job`.
    /// - [`JobError::AlreadySubmitted`] if `job` was already submitted or
    ///   `successor` is already ready.
    pub fn add_successor(&self, job: JobId, successor: JobId) -> Result<(), JobError> {
        if job == successor {
            return Err(JobError::SelfDependency(job));
        }

        let registry = self.shared.registry();
        let predecessor_slot = registry.get(&job).ok_or(JobError::UnknownJob(job))?;
        let successor_slot = registry
            .get(&successor)
            .ok_or(JobError::UnknownJob(successor))?;

        if Shared::reaches(&registry, successor, job) {
            return Err(JobError::DependencyCycle {
                from: job,
                to: successor,
            });
        }

        predecessor_slot
            .link_successor(successor_slot)
            .map_err(JobError::AlreadySubmitted)?;
        log::trace!("{job} -> {successor}");
        Ok(())
    }

    /// Makes `job` depend on `predecessor`. Mirror of
    /// [`add_successor`](Self::add_successor).
    pub fn add_predecessor(&self, job: JobId, predecessor: JobId) -> Result<(), JobError> {
        self.add_successor(predecessor, job)
    }

    /// Registers the callback run once `job` has finished.
    ///
    /// The callback runs on the thread that calls
    /// [`process_finish_callbacks`](Self::process_finish_callbacks) for the job's
    /// category, with typed access to the job and the way its execution ended.
    /// Registering a second callback replaces the first.
    ///
    /// ## Errors
    /// [`JobError::UnknownJob`], or [`JobError::CallbackTypeMismatch`] if `J`
    /// is not the concrete type the job was created with.
    pub fn set_finish_callback<J, F>(&self, job: JobId, callback: F) -> Result<(), JobError>
    where
        J: Job,
        F: FnOnce(&mut J, JobOutcome) + Send + 'static,
    {
        let slot = self.shared.slot(job)?;
        if !slot.is_job_type::<J>() {
            return Err(JobError::CallbackTypeMismatch {
                job,
                expected: std::any::type_name::<J>(),
            });
        }

        slot.set_callback(Box::new(move |dyn_job: &mut dyn Job, outcome: JobOutcome| {
            match dyn_job.as_any_mut().downcast_mut::<J>() {
                Some(typed) => callback(typed, outcome),
                None => log::error!("{job} changed type before its finish callback"),
            }
        }));
        Ok(())
    }

    /// Submits a job.
    ///
    /// A job with no outstanding predecessors is queued in its category right
    /// away; otherwise it is held and queued by its last finishing predecessor.
    /// Running an already submitted job is a no-op.
    ///
    /// ## Errors
    /// [`JobError::UnknownJob`] or [`JobError::NotRunning`] after shutdown.
    pub fn run(&self, job: JobId) -> Result<(), JobError> {
        self.ensure_running()?;
        let slot = self.shared.slot(job)?;
        if slot.try_make_ready() {
            self.shared.make_ready(&slot);
        } else {
            log::trace!(
                "{job} held with {} outstanding predecessor(s)",
                slot.predecessor_count()
            );
        }
        Ok(())
    }

    /// Creates and runs a job in one call.
    pub fn submit<J: Job>(&self, job: J, category: JobCategory) -> Result<JobId, JobError> {
        let id = self.create(job, category)?;
        self.run(id)?;
        Ok(id)
    }

    /// Executes every ready job of `category` on the calling thread.
    ///
    /// Jobs made ready while draining (successors of the drained jobs) are
    /// executed too.
    ///
    /// ## Returns
    /// The number of jobs executed by this call.
    pub fn process_job_category(&self, category: JobCategory) -> Result<usize, JobError> {
        let queues = self.shared.queues(category)?;
        let mut executed = 0;
        while let Some(id) = queues.try_dequeue() {
            if self.shared.execute(id) {
                executed += 1;
            }
        }
        Ok(executed)
    }

    /// Executes ready jobs of `category` on the calling thread until the queue
    /// is empty or `budget` has elapsed.
    ///
    /// The budget is only checked before pulling the next job. A job that has
    /// started always runs to completion, so one long job can overrun it.
    pub fn process_job_category_for(
        &self,
        category: JobCategory,
        budget: Duration,
    ) -> Result<usize, JobError> {
        let queues = self.shared.queues(category)?;
        let start = Instant::now();
        let mut executed = 0;
        while start.elapsed() < budget {
            let Some(id) = queues.try_dequeue() else {
                break;
            };
            if self.shared.execute(id) {
                executed += 1;
            }
        }
        Ok(executed)
    }

    /// Drains the finished queue of `category` on the calling thread.
    ///
    /// Each finished job has its callback run exactly once and is then removed
    /// from the arena. Works after shutdown so pending callbacks can still be
    /// delivered.
    ///
    /// ## Returns
    /// The number of jobs reaped.
    pub fn process_finish_callbacks(&self, category: JobCategory) -> Result<usize, JobError> {
        let queues = self.shared.queues(category)?;
        let mut reaped = 0;
        while let Some(id) = queues.try_dequeue_finished() {
            let Some(slot) = self.shared.registry().remove(&id) else {
                log::error!("finished {id} is missing from the job arena");
                continue;
            };
            slot.invoke_callback();
            StatCounters::bump(&self.shared.stats.callbacks_run);
            log::trace!("{id} ('{}') reaped", slot.name());
            reaped += 1;
        }
        Ok(reaped)
    }

    /// Returns the state of a live job, or `None` once it has been reaped.
    pub fn state(&self, job: JobId) -> Option<JobState> {
        self.shared.slot(job).ok().map(|slot| slot.state())
    }

    /// Number of jobs currently held in the arena.
    pub fn live_jobs(&self) -> usize {
        self.shared.registry().len()
    }

    /// Number of generic worker threads.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Number of categories this system was started with.
    pub fn category_count(&self) -> usize {
        self.shared.categories.len()
    }

    /// Returns `false` once [`shutdown`](Self::shutdown) has been called.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Takes a snapshot of the activity counters.
    pub fn stats(&self) -> JobSystemStats {
        self.shared.stats.snapshot(self.live_jobs(), self.worker_count)
    }

    /// Stops the job system and joins its workers.
    ///
    /// Pending queues are closed; jobs still queued there are never executed
    /// by workers. Finished queues stay drainable, so owning threads should
    /// call [`process_finish_callbacks`](Self::process_finish_callbacks)
    /// afterwards if they rely on callbacks. Calling this more than once is a
    /// no-op.
    pub fn shutdown(&self) {
        if !self.shared.running.swap(false, Ordering::AcqRel) {
            return;
        }
        log::info!("Shutting down job system...");

        self.shared.wake.release_all();
        for queues in &self.shared.categories {
            queues.close_pending();
        }

        let current = thread::current().id();
        let handles: Vec<_> = self.lock_workers().drain(..).collect();
        for handle in handles {
            if handle.thread().id() == current {
                log::warn!("job system shut down from its own worker; not joining it");
                continue;
            }
            let name = handle.thread().name().unwrap_or("<unnamed>").to_string();
            if handle.join().is_err() {
                log::error!("job worker '{name}' panicked");
            }
        }
        log::info!("Job system shut down.");
    }
}

impl Drop for JobSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for JobSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobSystem")
            .field("worker_count", &self.worker_count)
            .field("category_count", &self.category_count())
            .field("running", &self.is_running())
            .field("live_jobs", &self.live_jobs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::FnJob;
    use std::any::Any;
    use std::sync::atomic::AtomicUsize;

    fn system(workers: usize) -> JobSystem {
        JobSystem::startup(JobSystemConfig::new(Some(workers), DEFAULT_CATEGORY_COUNT))
            .expect("job system should start")
    }

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        condition()
    }

    /// Drains finished callbacks of `category` until `expected` jobs were reaped.
    fn drain_callbacks(system: &JobSystem, category: JobCategory, expected: usize) -> usize {
        let mut reaped = 0;
        wait_until(Duration::from_secs(5), || {
            reaped += system.process_finish_callbacks(category).unwrap();
            reaped >= expected
        });
        reaped
    }

    fn recorder(
        log: &Arc<Mutex<Vec<String>>>,
        name: &'static str,
    ) -> FnJob<impl FnOnce() + Send + 'static> {
        let log = log.clone();
        FnJob::new(name, move || log.lock().unwrap().push(name.to_string()))
    }

    struct Counter {
        value: u32,
    }

    impl Job for Counter {
        fn execute(&mut self) {
            self.value += 1;
        }

        fn name(&self) -> &str {
            "counter"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn submitting_a_predecessor_runs_its_successor_automatically() {
        let system = system(2);
        let events = Arc::new(Mutex::new(Vec::new()));

        let a = system.create(recorder(&events, "A"), JobCategory::GENERIC).unwrap();
        let b = system.create(recorder(&events, "B"), JobCategory::GENERIC).unwrap();
        system.add_successor(a, b).unwrap();
        assert_eq!(system.state(b), Some(JobState::Created));

        system.run(a).unwrap();
        assert_eq!(drain_callbacks(&system, JobCategory::GENERIC, 2), 2);

        assert_eq!(*events.lock().unwrap(), vec!["A", "B"]);
        assert_eq!(system.live_jobs(), 0);
        assert_eq!(system.state(a), None);
    }

    #[test]
    fn finish_callbacks_fire_in_dependency_order() {
        let system = system(2);
        let a = system.create(Counter { value: 0 }, JobCategory::GENERIC).unwrap();
        let b = system.create(Counter { value: 10 }, JobCategory::GENERIC).unwrap();
        system.add_successor(a, b).unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));
        for id in [a, b] {
            let order = order.clone();
            system
                .set_finish_callback(id, move |job: &mut Counter, outcome| {
                    assert_eq!(outcome, JobOutcome::Completed);
                    order.lock().unwrap().push(job.value);
                })
                .unwrap();
        }

        system.run(a).unwrap();
        assert_eq!(drain_callbacks(&system, JobCategory::GENERIC, 2), 2);
        assert_eq!(*order.lock().unwrap(), vec![1, 11]);
    }

    #[test]
    fn hundred_independent_jobs_each_execute_once() {
        let system = system(4);
        let counters: Vec<Arc<AtomicUsize>> =
            (0..100).map(|_| Arc::new(AtomicUsize::new(0))).collect();

        for counter in &counters {
            let counter = counter.clone();
            system
                .submit(
                    FnJob::new("count", move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }),
                    JobCategory::GENERIC,
                )
                .unwrap();
        }

        assert_eq!(drain_callbacks(&system, JobCategory::GENERIC, 100), 100);
        assert!(counters.iter().all(|c| c.load(Ordering::SeqCst) == 1));
        let stats = system.stats();
        assert_eq!(stats.executed, 100);
        assert_eq!(stats.callbacks_run, 100);
        assert_eq!(stats.live_jobs, 0);
    }

    #[test]
    fn diamond_successor_runs_once_after_both_branches() {
        let system = system(4);
        let b_done = Arc::new(AtomicBool::new(false));
        let c_done = Arc::new(AtomicBool::new(false));
        let d_runs = Arc::new(AtomicUsize::new(0));
        let d_saw_both = Arc::new(AtomicBool::new(false));

        let a = system.create(FnJob::new("A", || {}), JobCategory::GENERIC).unwrap();
        let flag = b_done.clone();
        let b = system
            .create(
                FnJob::new("B", move || flag.store(true, Ordering::SeqCst)),
                JobCategory::GENERIC,
            )
            .unwrap();
        let flag = c_done.clone();
        let c = system
            .create(
                FnJob::new("C", move || {
                    thread::sleep(Duration::from_millis(5));
                    flag.store(true, Ordering::SeqCst)
                }),
                JobCategory::GENERIC,
            )
            .unwrap();
        let (b_seen, c_seen, runs, saw) =
            (b_done.clone(), c_done.clone(), d_runs.clone(), d_saw_both.clone());
        let d = system
            .create(
                FnJob::new("D", move || {
                    runs.fetch_add(1, Ordering::SeqCst);
                    saw.store(
                        b_seen.load(Ordering::SeqCst) && c_seen.load(Ordering::SeqCst),
                        Ordering::SeqCst,
                    );
                }),
                JobCategory::GENERIC,
            )
            .unwrap();

        system.add_successor(a, b).unwrap();
        system.add_successor(a, c).unwrap();
        system.add_predecessor(d, b).unwrap();
        system.add_predecessor(d, c).unwrap();

        system.run(a).unwrap();
        assert_eq!(drain_callbacks(&system, JobCategory::GENERIC, 4), 4);
        assert_eq!(d_runs.load(Ordering::SeqCst), 1);
        assert!(d_saw_both.load(Ordering::SeqCst));
    }

    #[test]
    fn category_is_fifo_when_drained_by_its_owner() {
        let system = system(0);
        let events = Arc::new(Mutex::new(Vec::new()));
        for name in ["J1", "J2", "J3"] {
            system.submit(recorder(&events, name), JobCategory::MAIN).unwrap();
        }

        assert_eq!(system.process_job_category(JobCategory::MAIN).unwrap(), 3);
        assert_eq!(*events.lock().unwrap(), vec!["J1", "J2", "J3"]);
        assert_eq!(system.process_finish_callbacks(JobCategory::MAIN).unwrap(), 3);
    }

    #[test]
    fn single_worker_keeps_submission_order() {
        let system = system(1);
        let events = Arc::new(Mutex::new(Vec::new()));
        for name in ["J1", "J2", "J3", "J4"] {
            system.submit(recorder(&events, name), JobCategory::GENERIC).unwrap();
        }

        assert_eq!(drain_callbacks(&system, JobCategory::GENERIC, 4), 4);
        assert_eq!(*events.lock().unwrap(), vec!["J1", "J2", "J3", "J4"]);
    }

    #[test]
    fn workers_never_touch_owned_categories() {
        let system = system(2);
        let ran_on = Arc::new(Mutex::new(None));
        let slot = ran_on.clone();
        system
            .submit(
                FnJob::new("render-only", move || {
                    *slot.lock().unwrap() = Some(thread::current().id());
                }),
                JobCategory::RENDER,
            )
            .unwrap();

        thread::sleep(Duration::from_millis(20));
        assert!(ran_on.lock().unwrap().is_none());

        assert_eq!(system.process_job_category(JobCategory::RENDER).unwrap(), 1);
        assert_eq!(*ran_on.lock().unwrap(), Some(thread::current().id()));
    }

    #[test]
    fn panicking_job_still_finishes_and_releases_successors() {
        let system = system(0);
        let boom = system
            .create(
                FnJob::new("boom", || panic!("intentional panic for testing")),
                JobCategory::MAIN,
            )
            .unwrap();
        let after = system.create(Counter { value: 0 }, JobCategory::MAIN).unwrap();
        system.add_successor(boom, after).unwrap();

        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let sink = outcomes.clone();
        system
            .set_finish_callback(after, move |job: &mut Counter, outcome| {
                sink.lock().unwrap().push((job.value, outcome));
            })
            .unwrap();

        system.run(boom).unwrap();
        assert_eq!(system.process_job_category(JobCategory::MAIN).unwrap(), 2);
        assert_eq!(system.process_finish_callbacks(JobCategory::MAIN).unwrap(), 2);
        assert_eq!(*outcomes.lock().unwrap(), vec![(1, JobOutcome::Completed)]);
        assert_eq!(system.stats().panicked, 1);
    }

    #[test]
    fn budget_only_gates_pulling_the_next_job() {
        let system = system(0);
        for _ in 0..3 {
            system.submit(Counter { value: 0 }, JobCategory::RENDER).unwrap();
        }

        assert_eq!(
            system
                .process_job_category_for(JobCategory::RENDER, Duration::ZERO)
                .unwrap(),
            0
        );

        let slow = system
            .submit(
                FnJob::new("slow", || thread::sleep(Duration::from_millis(30))),
                JobCategory::MAIN,
            )
            .unwrap();
        system.submit(Counter { value: 0 }, JobCategory::MAIN).unwrap();
        // The slow job overruns the budget, so the second one waits a frame.
        assert_eq!(
            system
                .process_job_category_for(JobCategory::MAIN, Duration::from_millis(5))
                .unwrap(),
            1
        );
        assert_eq!(system.state(slow), Some(JobState::Finished));

        assert_eq!(
            system
                .process_job_category_for(JobCategory::RENDER, Duration::from_secs(5))
                .unwrap(),
            3
        );
    }

    #[test]
    fn held_job_is_not_queued_until_its_predecessor_finishes() {
        let system = system(0);
        let a = system.create(Counter { value: 0 }, JobCategory::MAIN).unwrap();
        let b = system.create(Counter { value: 0 }, JobCategory::MAIN).unwrap();
        system.add_successor(a, b).unwrap();

        system.run(b).unwrap();
        assert_eq!(system.process_job_category(JobCategory::MAIN).unwrap(), 0);
        assert_eq!(system.state(b), Some(JobState::Created));

        system.run(a).unwrap();
        system.run(a).unwrap();
        assert_eq!(system.process_job_category(JobCategory::MAIN).unwrap(), 2);
        assert_eq!(system.state(b), Some(JobState::Finished));
    }

    #[test]
    fn invalid_edges_are_rejected() {
        let system = system(0);
        let a = system.create(Counter { value: 0 }, JobCategory::MAIN).unwrap();
        let b = system.create(Counter { value: 0 }, JobCategory::MAIN).unwrap();
        let c = system.create(Counter { value: 0 }, JobCategory::MAIN).unwrap();

        assert!(matches!(
            system.add_successor(a, a),
            Err(JobError::SelfDependency(id)) if id == a
        ));

        system.add_successor(a, b).unwrap();
        system.add_successor(b, c).unwrap();
        assert!(matches!(
            system.add_successor(c, a),
            Err(JobError::DependencyCycle { from, to }) if from == c && to == a
        ));

        system.run(a).unwrap();
        let d = system.create(Counter { value: 0 }, JobCategory::MAIN).unwrap();
        assert!(matches!(
            system.add_successor(a, d),
            Err(JobError::AlreadySubmitted(id)) if id == a
        ));

        let missing = JobId(9_999);
        assert!(matches!(
            system.add_successor(missing, d),
            Err(JobError::UnknownJob(id)) if id == missing
        ));
    }

    #[test]
    fn callback_type_is_checked_when_registered() {
        let system = system(0);
        let id = system.create(Counter { value: 0 }, JobCategory::MAIN).unwrap();
        let error = system
            .set_finish_callback(id, |_: &mut FnJob<fn()>, _| {})
            .unwrap_err();
        assert!(matches!(error, JobError::CallbackTypeMismatch { job, .. } if job == id));
    }

    #[test]
    fn unknown_category_and_bad_config_are_errors() {
        let system = system(0);
        assert!(matches!(
            system.submit(Counter { value: 0 }, JobCategory::new(7)),
            Err(JobError::UnknownCategory { count: 3, .. })
        ));
        assert!(system.process_job_category(JobCategory::new(3)).is_err());

        let error = JobSystem::startup(JobSystemConfig::new(Some(0), 2)).unwrap_err();
        assert!(matches!(error, JobError::InvalidCategoryCount { requested: 2, .. }));

        let extended = JobSystem::startup(JobSystemConfig::new(Some(0), 5)).unwrap();
        extended.submit(Counter { value: 0 }, JobCategory::new(4)).unwrap();
        assert_eq!(extended.process_job_category(JobCategory::new(4)).unwrap(), 1);
    }

    #[test]
    fn shutdown_wakes_idle_workers_and_is_idempotent() {
        let system = system(2);
        thread::sleep(Duration::from_millis(10));

        let start = Instant::now();
        system.shutdown();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(!system.is_running());
        system.shutdown();

        assert!(matches!(
            system.submit(Counter { value: 0 }, JobCategory::GENERIC),
            Err(JobError::NotRunning)
        ));
    }

    #[test]
    fn shutdown_lets_the_running_job_finish_and_drops_the_rest() {
        let system = system(1);
        let log = Arc::new(Mutex::new(Vec::new()));
        let started = Arc::new(AtomicBool::new(false));
        let gate = Arc::new(AtomicBool::new(false));

        let blocker = {
            let (log, started, gate) = (log.clone(), started.clone(), gate.clone());
            system
                .create(
                    FnJob::new("blocker", move || {
                        started.store(true, Ordering::SeqCst);
                        while !gate.load(Ordering::SeqCst) {
                            thread::sleep(Duration::from_millis(1));
                        }
                        log.lock().unwrap().push("blocker".to_string());
                    }),
                    JobCategory::GENERIC,
                )
                .unwrap()
        };
        let successor = system
            .create(recorder(&log, "successor"), JobCategory::GENERIC)
            .unwrap();
        system.add_successor(blocker, successor).unwrap();
        system.run(blocker).unwrap();
        assert!(wait_until(Duration::from_secs(5), || started.load(Ordering::SeqCst)));

        // Queued behind the running job on the only worker.
        for name in ["queued-a", "queued-b", "queued-c"] {
            system.submit(recorder(&log, name), JobCategory::GENERIC).unwrap();
        }

        let opener = {
            let gate = gate.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                gate.store(true, Ordering::SeqCst);
            })
        };
        let start = Instant::now();
        system.shutdown();
        assert!(start.elapsed() < Duration::from_secs(5));
        opener.join().unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["blocker".to_string()]);
        assert_eq!(system.state(blocker), Some(JobState::Finished));
        assert_ne!(system.state(successor), Some(JobState::Finished));
        assert_eq!(system.stats().executed, 1);

        assert!(matches!(system.run(successor), Err(JobError::NotRunning)));
        assert!(matches!(
            system.submit(Counter { value: 0 }, JobCategory::GENERIC),
            Err(JobError::NotRunning)
        ));
        assert_eq!(system.process_finish_callbacks(JobCategory::GENERIC).unwrap(), 1);
    }

    #[test]
    fn finished_jobs_stay_drainable_after_shutdown() {
        let system = system(0);
        let id = system.submit(Counter { value: 0 }, JobCategory::MAIN).unwrap();
        let seen = Arc::new(AtomicBool::new(false));
        let flag = seen.clone();
        system
            .set_finish_callback(id, move |_: &mut Counter, _| flag.store(true, Ordering::SeqCst))
            .unwrap();
        system.process_job_category(JobCategory::MAIN).unwrap();

        system.shutdown();
        assert_eq!(system.process_finish_callbacks(JobCategory::MAIN).unwrap(), 1);
        assert!(seen.load(Ordering::SeqCst));
    }

    #[test]
    fn worker_threads_are_named_from_config() {
        let mut config = JobSystemConfig::new(Some(1), DEFAULT_CATEGORY_COUNT);
        config.thread_name = "loader".to_string();
        let system = JobSystem::startup(config).unwrap();

        let name = Arc::new(Mutex::new(None));
        let sink = name.clone();
        system
            .submit(
                FnJob::new("whoami", move || {
                    *sink.lock().unwrap() = thread::current().name().map(str::to_string);
                }),
                JobCategory::GENERIC,
            )
            .unwrap();
        drain_callbacks(&system, JobCategory::GENERIC, 1);
        assert_eq!(name.lock().unwrap().as_deref(), Some("loader-0"));
    }
}
