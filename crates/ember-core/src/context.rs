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

//! Provides the explicitly constructed context shared by engine subsystems.

use crate::job::JobSystem;
use crate::renderer::GraphicsDevice;
use std::sync::Arc;

/// The engine services a subsystem may depend on.
///
/// Built once at startup and passed to every subsystem that needs scheduling
/// or graphics. Nothing in the engine reaches these services through globals.
#[derive(Debug, Clone)]
pub struct EngineContext {
    /// The job system scheduling background and per-thread work.
    pub job_system: Arc<JobSystem>,
    /// The graphics device. Only usable from the thread that owns it.
    pub graphics_device: Arc<dyn GraphicsDevice>,
}

impl EngineContext {
    /// Bundles the engine services into a context.
    pub fn new(job_system: Arc<JobSystem>, graphics_device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            job_system,
            graphics_device,
        }
    }
}
