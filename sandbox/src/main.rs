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

mod config;
mod game;

use anyhow::Result;
use clap::Parser;
use ember_core::job::JobSystem;
use ember_core::EngineContext;
use ember_infra::HeadlessDevice;
use std::sync::Arc;

use config::{Cli, SandboxConfig};
use game::Sandbox;

fn main() -> Result<()> {
    ember_telemetry::logging::init("info");

    let cli = Cli::parse();
    let config = SandboxConfig::resolve(&cli)?;
    log::debug!("Effective configuration: {config:?}");

    // This thread owns the device and drains the main and render categories.
    let jobs = Arc::new(JobSystem::startup(config.jobs.clone())?);
    log::info!("Job system started with {} worker(s)", jobs.worker_count());
    let context = EngineContext::new(jobs, Arc::new(HeadlessDevice::new()));

    let mut sandbox = Sandbox::new(context, config, &cli.assets, cli.screenshot.clone());
    let report = sandbox.run(cli.max_frames)?;

    log::info!(
        "Done after {} frame(s): {} asset(s) loaded, {} skipped",
        report.frames,
        report.loaded,
        report.failed
    );
    if let Some(Err(reason)) = report.screenshot {
        anyhow::bail!("screenshot failed: {reason}");
    }
    Ok(())
}
