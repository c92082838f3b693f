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

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

struct QueueState<T> {
    items: VecDeque<T>,
    shut_down: bool,
}

/// A thread-safe FIFO queue with blocking and non-blocking consumers.
///
/// The queue is generic over the payload type `T`, which ensures it can carry
/// job handles inside the job system as well as decoded assets between the
/// stages of the streaming pipeline. Items are moved out on dequeue, so each
/// item is delivered to exactly one consumer.
///
/// A queue is either unbounded ([`AsyncQueue::new`]) or bounded
/// ([`AsyncQueue::bounded`]), in which case producers block while it is full.
pub struct AsyncQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: Option<usize>,
}

impl<T> AsyncQueue<T> {
    /// Creates an unbounded queue.
    pub fn new() -> Self {
        Self::with_capacity_limit(None)
    }

    /// Creates a queue holding at most `capacity` items (minimum one).
    pub fn bounded(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "a zero-capacity queue would never accept items");
        Self::with_capacity_limit(Some(capacity.max(1)))
    }

    fn with_capacity_limit(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                shut_down: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an item and wakes one blocked consumer.
    ///
    /// On a bounded queue this blocks while the queue is full.
    ///
    /// ## Returns
    /// `Err(item)` when the queue has been shut down; ownership of the item goes
    /// back to the caller.
    pub fn enqueue(&self, item: T) -> Result<(), T> {
        let mut state = self.lock();
        if let Some(capacity) = self.capacity {
            while !state.shut_down && state.items.len() >= capacity {
                state = self
                    .not_full
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
        if state.shut_down {
            return Err(item);
        }
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Pops the front item without blocking.
    pub fn try_dequeue(&self) -> Option<T> {
        let item = self.lock().items.pop_front();
        if item.is_some() && self.capacity.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Blocks until an item is available.
    ///
    /// ## Returns
    /// `None` once the queue has been shut down and drained, so consumer loops
    /// can use `while let Some(item) = queue.dequeue()`.
    pub fn dequeue(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Some(item);
            }
            if state.shut_down {
                return None;
            }
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`AsyncQueue::dequeue`], but gives up after `timeout`.
    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Some(item);
            }
            let now = Instant::now();
            if state.shut_down || now >= deadline {
                return None;
            }
            let (guard, _) = self
                .not_empty
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
    }

    /// Closes the queue to new items and wakes every blocked producer and consumer.
    ///
    /// Items already queued stay available to `try_dequeue` and `dequeue`.
    pub fn shutdown(&self) {
        self.lock().shut_down = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Returns `true` once [`AsyncQueue::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.lock().shut_down
    }

    /// Returns the number of queued items.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Returns `true` when no item is queued.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Returns the capacity limit of a bounded queue.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl<T> Default for AsyncQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for AsyncQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("AsyncQueue")
            .field("len", &state.items.len())
            .field("capacity", &self.capacity)
            .field("shut_down", &state.shut_down)
            .finish()
    }
}
