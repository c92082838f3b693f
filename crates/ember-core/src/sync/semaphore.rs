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

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct SemaphoreState {
    count: usize,
    released: bool,
}

/// A counting semaphore used to park idle worker threads.
///
/// Besides the permit count, the semaphore carries a latched "released" flag set
/// by [`Semaphore::release_all`]. Once latched, every current and future
/// [`Semaphore::acquire`] returns `false` immediately, so a shutdown can never be
/// lost between a worker checking the running flag and going to sleep.
#[derive(Debug, Default)]
pub struct Semaphore {
    state: Mutex<SemaphoreState>,
    condvar: Condvar,
}

impl Semaphore {
    /// Creates a semaphore holding `initial` permits.
    pub fn new(initial: usize) -> Self {
        Self {
            state: Mutex::new(SemaphoreState {
                count: initial,
                released: false,
            }),
            condvar: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SemaphoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until a permit is available and takes it.
    ///
    /// ## Returns
    /// `true` when a permit was taken, `false` when the semaphore has been
    /// released for shutdown. The count is never touched in the latter case.
    pub fn acquire(&self) -> bool {
        let mut state = self.lock();
        loop {
            if state.released {
                return false;
            }
            if state.count > 0 {
                state.count -= 1;
                return true;
            }
            state = self
                .condvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Takes a permit if one is immediately available.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.lock();
        if state.released || state.count == 0 {
            return false;
        }
        state.count -= 1;
        true
    }

    /// Like [`Semaphore::acquire`], but gives up after `timeout`.
    pub fn acquire_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if state.released {
                return false;
            }
            if state.count > 0 {
                state.count -= 1;
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .condvar
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
    }

    /// Adds `n` permits and wakes up to `n` waiters.
    pub fn release(&self, n: usize) {
        if n == 0 {
            return;
        }
        {
            let mut state = self.lock();
            state.count += n;
        }
        if n == 1 {
            self.condvar.notify_one();
        } else {
            // Waiters that find the count drained go back to sleep.
            self.condvar.notify_all();
        }
    }

    /// Wakes every waiter and makes all further acquisitions fail.
    ///
    /// Used once at shutdown. Calling it again is harmless.
    pub fn release_all(&self) {
        self.lock().released = true;
        self.condvar.notify_all();
    }

    /// Returns the number of permits currently available.
    pub fn available(&self) -> usize {
        self.lock().count
    }

    /// Returns `true` once [`Semaphore::release_all`] has been called.
    pub fn is_released(&self) -> bool {
        self.lock().released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn acquire_consumes_released_permits() {
        let semaphore = Semaphore::new(0);
        assert!(!semaphore.try_acquire());

        semaphore.release(2);
        assert_eq!(semaphore.available(), 2);
        assert!(semaphore.acquire());
        assert!(semaphore.try_acquire());
        assert!(!semaphore.try_acquire());
        assert_eq!(semaphore.available(), 0);
    }

    #[test]
    fn acquire_timeout_expires_without_permits() {
        let semaphore = Semaphore::new(0);
        let start = Instant::now();
        assert!(!semaphore.acquire_timeout(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn release_wakes_blocked_waiters() {
        let semaphore = Arc::new(Semaphore::new(0));
        let woken = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let semaphore = semaphore.clone();
                let woken = woken.clone();
                thread::spawn(move || {
                    if semaphore.acquire() {
                        woken.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        semaphore.release(4);

        for handle in handles {
            handle.join().expect("waiter panicked");
        }
        assert_eq!(woken.load(Ordering::SeqCst), 4);
        assert_eq!(semaphore.available(), 0);
    }

    #[test]
    fn release_all_unblocks_every_waiter() {
        let semaphore = Arc::new(Semaphore::new(0));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let semaphore = semaphore.clone();
                thread::spawn(move || semaphore.acquire())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        semaphore.release_all();

        for handle in handles {
            assert!(!handle.join().expect("waiter panicked"));
        }
        assert!(semaphore.is_released());
    }

    #[test]
    fn acquire_after_release_all_does_not_block() {
        let semaphore = Semaphore::new(3);
        semaphore.release_all();
        semaphore.release_all();

        assert!(!semaphore.acquire());
        assert!(!semaphore.try_acquire());
        assert!(!semaphore.acquire_timeout(Duration::from_secs(5)));
        // Permits are left untouched by the failed acquisitions.
        assert_eq!(semaphore.available(), 3);
    }
}
