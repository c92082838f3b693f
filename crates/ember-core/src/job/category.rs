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

use super::{JobCategory, JobId};
use crate::sync::AsyncQueue;

/// The pending and finished queues of one job category.
///
/// This is a structural grouping only. Which thread drains which queue is
/// decided by the [`super::JobSystem`].
#[derive(Debug)]
pub struct JobCategoryQueues {
    category: JobCategory,
    pending: AsyncQueue<JobId>,
    finished: AsyncQueue<JobId>,
}

impl JobCategoryQueues {
    /// Creates empty queues for `category`.
    pub fn new(category: JobCategory) -> Self {
        Self {
            category,
            pending: AsyncQueue::new(),
            finished: AsyncQueue::new(),
        }
    }

    /// The category these queues belong to.
    pub fn category(&self) -> JobCategory {
        self.category
    }

    /// Queues a ready job. Fails with the id once the pending queue is closed.
    pub fn enqueue(&self, id: JobId) -> Result<(), JobId> {
        self.pending.enqueue(id)
    }

    /// Pops the oldest ready job without blocking.
    pub fn try_dequeue(&self) -> Option<JobId> {
        self.pending.try_dequeue()
    }

    /// Blocks until a ready job is available or the pending queue is closed.
    pub fn dequeue(&self) -> Option<JobId> {
        self.pending.dequeue()
    }

    /// Queues a job whose execution has returned.
    pub fn enqueue_finished(&self, id: JobId) -> Result<(), JobId> {
        self.finished.enqueue(id)
    }

    /// Pops the oldest finished job without blocking.
    pub fn try_dequeue_finished(&self) -> Option<JobId> {
        self.finished.try_dequeue()
    }

    /// Number of jobs waiting to execute.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of jobs waiting for their finish callback.
    pub fn finished_len(&self) -> usize {
        self.finished.len()
    }

    /// Closes the pending queue. Finished jobs can still be drained afterwards.
    pub fn close_pending(&self) {
        self.pending.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_and_finished_are_independent_fifos() {
        let queues = JobCategoryQueues::new(JobCategory::MAIN);
        queues.enqueue(JobId(1)).unwrap();
        queues.enqueue(JobId(2)).unwrap();
        queues.enqueue_finished(JobId(7)).unwrap();

        assert_eq!(queues.pending_len(), 2);
        assert_eq!(queues.finished_len(), 1);
        assert_eq!(queues.try_dequeue(), Some(JobId(1)));
        assert_eq!(queues.try_dequeue_finished(), Some(JobId(7)));
        assert_eq!(queues.dequeue(), Some(JobId(2)));
        assert_eq!(queues.try_dequeue(), None);
        assert_eq!(queues.category(), JobCategory::MAIN);
    }

    #[test]
    fn closing_pending_keeps_finished_drainable() {
        let queues = JobCategoryQueues::new(JobCategory::GENERIC);
        queues.enqueue_finished(JobId(3)).unwrap();
        queues.close_pending();

        assert_eq!(queues.enqueue(JobId(4)), Err(JobId(4)));
        assert_eq!(queues.dequeue(), None);
        assert_eq!(queues.try_dequeue_finished(), Some(JobId(3)));
    }
}
