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

//! Blocking synchronization primitives shared by the job system and asset streaming.
//!
//! Both primitives are built on a `Mutex` plus `Condvar` pair. Lock poisoning is
//! recovered rather than propagated: the guarded state is plain counters and
//! queues that a panicking holder cannot leave half-updated.

mod async_queue;
mod semaphore;

pub use async_queue::AsyncQueue;
pub use semaphore::Semaphore;
