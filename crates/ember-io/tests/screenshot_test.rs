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

use anyhow::{ensure, Result};
use ember_core::job::{JobCategory, JobId, JobState, JobSystem, JobSystemConfig};
use ember_core::renderer::{CpuImage, GraphicsDevice, TextureId};
use ember_infra::HeadlessDevice;
use ember_io::{queue_screenshot, SaveImageJob};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

type SaveReport = Arc<Mutex<Option<Result<(), String>>>>;

/// Waits for the save job's callback and returns what it reported.
fn wait_for_save(jobs: &JobSystem, report: &SaveReport) -> Result<Result<(), String>> {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        jobs.process_finish_callbacks(JobCategory::GENERIC)?;
        if let Some(result) = report.lock().unwrap().take() {
            return Ok(result);
        }
        ensure!(Instant::now() < deadline, "save job never reported");
        thread::sleep(Duration::from_millis(1));
    }
}

fn watch_save(jobs: &JobSystem, save: JobId) -> Result<SaveReport> {
    let report = Arc::new(Mutex::new(None));
    let sink = report.clone();
    jobs.set_finish_callback(save, move |job: &mut SaveImageJob, _| {
        *sink.lock().unwrap() = job.result().cloned();
    })?;
    Ok(report)
}

#[test]
fn capture_on_render_thread_then_save_on_worker() -> Result<()> {
    // --- 1. Setup: a texture on the "render thread" (this one) ---
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("shot.png");
    let jobs = JobSystem::startup(JobSystemConfig::new(Some(2), 3))?;
    let device = Arc::new(HeadlessDevice::new());
    let texture = device.create_texture("frame", &CpuImage::solid(5, 3, [1, 2, 3, 255]))?;

    // --- 2. Queue the screenshot; nothing runs until the render category is drained ---
    let shot = queue_screenshot(&jobs, device.clone(), texture, &path)?;
    let report = watch_save(&jobs, shot.save)?;
    thread::sleep(Duration::from_millis(10));
    assert_eq!(jobs.state(shot.capture), Some(JobState::Ready));
    assert_eq!(jobs.state(shot.save), Some(JobState::Created));

    // --- 3. Render frame: the capture runs here, the save follows on a worker ---
    assert_eq!(jobs.process_job_category(JobCategory::RENDER)?, 1);
    assert_eq!(wait_for_save(&jobs, &report)?, Ok(()));

    // --- 4. Assert: the file holds the texture ---
    let saved = image::open(&path)?.to_rgba8();
    assert_eq!(saved.dimensions(), (5, 3));
    assert_eq!(saved.get_pixel(4, 2).0, [1, 2, 3, 255]);

    assert_eq!(jobs.process_finish_callbacks(JobCategory::RENDER)?, 1);
    assert_eq!(jobs.live_jobs(), 0);
    Ok(())
}

#[test]
fn failed_capture_is_reported_by_the_save_job() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("never.png");
    let jobs = JobSystem::startup(JobSystemConfig::new(Some(1), 3))?;
    let device = Arc::new(HeadlessDevice::new());

    let shot = queue_screenshot(&jobs, device, TextureId(77), &path)?;
    let report = watch_save(&jobs, shot.save)?;
    jobs.process_job_category(JobCategory::RENDER)?;

    let result = wait_for_save(&jobs, &report)?;
    assert_eq!(result, Err("no image was captured".to_string()));
    assert!(!path.exists());
    Ok(())
}
