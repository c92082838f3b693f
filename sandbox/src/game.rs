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

//! The sandbox frame loop: scan a directory, stream it, optionally capture a
//! screenshot, then stop.

use anyhow::{bail, Context, Result};
use ember_core::job::{JobCategory, JobSystem};
use ember_core::EngineContext;
use ember_io::{queue_screenshot, AssetStreamer, LoadingState, SaveImageJob};
use ember_telemetry::TelemetryService;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use walkdir::WalkDir;

use crate::config::SandboxConfig;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

type SaveReport = Arc<Mutex<Option<Result<(), String>>>>;

/// Where the sandbox stands.
#[derive(Debug)]
pub enum Phase {
    /// Nothing queued yet.
    Menu,
    /// Waiting for every queued asset to reach the GPU.
    Loading,
    /// Assets are resident; a screenshot may be in flight.
    Play { screenshot: Option<SaveReport> },
    /// The run is over.
    Done,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub frames: u64,
    pub loaded: usize,
    pub failed: usize,
    pub screenshot: Option<Result<(), String>>,
}

/// Owns the engine services and drives them one frame at a time.
pub struct Sandbox {
    context: EngineContext,
    streamer: AssetStreamer,
    telemetry: TelemetryService,
    config: SandboxConfig,
    assets: PathBuf,
    screenshot_path: Option<PathBuf>,
    screenshot_result: Option<Result<(), String>>,
    phase: Phase,
}

impl Sandbox {
    /// Creates the sandbox. Must be called on the thread owning the device.
    pub fn new(
        context: EngineContext,
        config: SandboxConfig,
        assets: impl Into<PathBuf>,
        screenshot_path: Option<PathBuf>,
    ) -> Self {
        let streamer = AssetStreamer::new(context.job_system.clone(), config.streaming.clone());
        let telemetry = TelemetryService::new(config.telemetry_interval());
        Self {
            context,
            streamer,
            telemetry,
            config,
            assets: assets.into(),
            screenshot_path,
            screenshot_result: None,
            phase: Phase::Menu,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Done)
    }

    /// Runs frames until the sandbox is done or `max_frames` is exceeded,
    /// then shuts the job system down.
    pub fn run(&mut self, max_frames: u64) -> Result<RunReport> {
        let mut frames = 0;
        while !self.is_done() {
            if frames >= max_frames {
                self.shutdown()?;
                bail!("gave up after {frames} frames in phase {:?}", self.phase);
            }
            self.frame()?;
            frames += 1;
            thread::sleep(FRAME_INTERVAL);
        }
        self.shutdown()?;

        Ok(RunReport {
            frames,
            loaded: self.streamer.objects_loaded(),
            failed: self.streamer.objects_failed(),
            screenshot: self.screenshot_result.clone(),
        })
    }

    /// Executes one frame.
    pub fn frame(&mut self) -> Result<()> {
        let jobs = self.context.job_system.clone();
        let budget = self.config.frame_budget();

        // 1. Thread-affine work: render first, then main. Without workers the
        // generic category is drained here too.
        jobs.process_job_category_for(JobCategory::RENDER, budget)?;
        jobs.process_job_category_for(JobCategory::MAIN, budget)?;
        if jobs.worker_count() == 0 {
            jobs.process_job_category_for(JobCategory::GENERIC, budget)?;
        }

        // 2. Advance the phase.
        self.step(&jobs)?;

        // 3. Finish callbacks of every category run on this thread.
        for index in 0..jobs.category_count() {
            jobs.process_finish_callbacks(JobCategory::new(index as u8))?;
        }

        // 4. Periodic statistics.
        self.telemetry.tick(&jobs);
        Ok(())
    }

    fn step(&mut self, jobs: &JobSystem) -> Result<()> {
        let next = match &self.phase {
            Phase::Menu => {
                let queued = self.queue_directory()?;
                log::info!("Queued {queued} asset(s) from {}", self.assets.display());
                Some(Phase::Loading)
            }
            Phase::Loading => {
                let state = self.streamer.update(self.context.graphics_device.as_ref());
                match state {
                    LoadingState::Loading { .. } => {
                        log::debug!("{state} ({:.0}%)", self.streamer.progress() * 100.0);
                        None
                    }
                    LoadingState::Idle | LoadingState::Complete { .. } => {
                        log::info!("Loading finished: {state}");
                        for failure in self.streamer.failures() {
                            log::warn!(
                                "  {} ({}): {}",
                                failure.name,
                                failure.path.display(),
                                failure.reason
                            );
                        }
                        Some(Phase::Play {
                            screenshot: self.queue_screenshot(jobs)?,
                        })
                    }
                }
            }
            Phase::Play { screenshot: None } => Some(Phase::Done),
            Phase::Play {
                screenshot: Some(report),
            } => {
                let result = report
                    .lock()
                    .map_err(|_| anyhow::anyhow!("screenshot report lock poisoned"))?
                    .take();
                match result {
                    Some(result) => {
                        match &result {
                            Ok(()) => log::info!("Screenshot saved"),
                            Err(reason) => log::error!("Screenshot failed: {reason}"),
                        }
                        self.screenshot_result = Some(result);
                        Some(Phase::Done)
                    }
                    None => None,
                }
            }
            Phase::Done => None,
        };

        if let Some(next) = next {
            log::debug!("Phase {:?} -> {:?}", self.phase, next);
            self.phase = next;
        }
        Ok(())
    }

    /// Queues every image and OBJ file under the asset directory.
    fn queue_directory(&mut self) -> Result<usize> {
        if !self.assets.is_dir() {
            bail!("asset directory {} does not exist", self.assets.display());
        }

        let mut queued = 0;
        for entry in WalkDir::new(&self.assets)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let name = asset_name(&self.assets, path);
            match extension(path).as_deref() {
                Some("png" | "jpg" | "jpeg") => {
                    self.streamer.queue_image(name, path)?;
                    queued += 1;
                }
                Some("obj") => {
                    self.streamer.queue_mesh(name, path)?;
                    queued += 1;
                }
                _ => log::trace!("Ignoring {}", path.display()),
            }
        }
        Ok(queued)
    }

    fn queue_screenshot(&self, jobs: &JobSystem) -> Result<Option<SaveReport>> {
        let Some(path) = &self.screenshot_path else {
            return Ok(None);
        };
        let mut textures: Vec<_> = self.streamer.textures().collect();
        textures.sort_by(|a, b| a.0.cmp(b.0));
        let Some(&(name, texture)) = textures.first() else {
            log::warn!("No texture was loaded, skipping the screenshot");
            return Ok(None);
        };

        log::info!("Capturing '{name}' ({texture}) to {}", path.display());
        let shot = queue_screenshot(
            jobs,
            self.context.graphics_device.clone(),
            texture,
            path.clone(),
        )
        .context("queueing the screenshot")?;

        let report: SaveReport = Arc::new(Mutex::new(None));
        let sink = report.clone();
        jobs.set_finish_callback(shot.save, move |job: &mut SaveImageJob, outcome| {
            let result = job
                .result()
                .cloned()
                .unwrap_or_else(|| Err(format!("save job ended with {outcome:?}")));
            if let Ok(mut slot) = sink.lock() {
                *slot = Some(result);
            }
        })?;
        Ok(Some(report))
    }

    fn shutdown(&mut self) -> Result<()> {
        let jobs = &self.context.job_system;
        jobs.shutdown();
        for index in 0..jobs.category_count() {
            jobs.process_finish_callbacks(JobCategory::new(index as u8))?;
        }
        log::info!("Job system stopped: {}", jobs.stats());
        Ok(())
    }
}

/// Asset names are paths relative to the scanned directory, with `/` separators.
fn asset_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}
