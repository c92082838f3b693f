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

//! Capture-then-save screenshot jobs.
//!
//! The capture runs in the render category because it reads from the graphics
//! device. The save runs on a generic worker. The captured image moves between
//! them through a single-slot [`AsyncQueue`].

use ember_core::job::{Job, JobCategory, JobError, JobId, JobSystem};
use ember_core::renderer::{CpuImage, GraphicsDevice, TextureId};
use ember_core::sync::AsyncQueue;
use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads a texture back into a [`CpuImage`]. Render category only.
pub struct MakeImageFromTextureJob {
    device: Arc<dyn GraphicsDevice>,
    texture: TextureId,
    output: Arc<AsyncQueue<CpuImage>>,
    error: Option<String>,
}

impl MakeImageFromTextureJob {
    /// Creates a capture of `texture` delivering into `output`.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        texture: TextureId,
        output: Arc<AsyncQueue<CpuImage>>,
    ) -> Self {
        Self {
            device,
            texture,
            output,
            error: None,
        }
    }

    /// Why the capture failed, once it has run.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl Job for MakeImageFromTextureJob {
    fn execute(&mut self) {
        let result = self
            .device
            .read_texture(self.texture)
            .map_err(|error| error.to_string())
            .and_then(|image| {
                self.output
                    .enqueue(image)
                    .map_err(|_| "capture queue is closed".to_string())
            });
        if let Err(error) = result {
            log::warn!("Capture of {} failed: {error}", self.texture);
            self.error = Some(error);
        }
    }

    fn name(&self) -> &str {
        "capture texture"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Writes the captured image to disk, format chosen by the file extension.
pub struct SaveImageJob {
    path: PathBuf,
    input: Arc<AsyncQueue<CpuImage>>,
    result: Option<Result<(), String>>,
}

impl SaveImageJob {
    /// Creates a save of whatever `input` delivers to `path`.
    pub fn new(path: impl Into<PathBuf>, input: Arc<AsyncQueue<CpuImage>>) -> Self {
        Self {
            path: path.into(),
            input,
            result: None,
        }
    }

    /// Destination file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` until the job has run, then whether the file was written.
    pub fn result(&self) -> Option<&Result<(), String>> {
        self.result.as_ref()
    }

    fn save(&self) -> Result<(), String> {
        let image = self
            .input
            .try_dequeue()
            .ok_or_else(|| "no image was captured".to_string())?;
        let (width, height) = (image.width, image.height);
        let buffer = image::RgbaImage::from_raw(width, height, image.pixels)
            .ok_or_else(|| format!("{width}x{height} capture has a malformed pixel buffer"))?;
        buffer.save(&self.path).map_err(|error| error.to_string())
    }
}

impl Job for SaveImageJob {
    fn execute(&mut self) {
        let result = self.save();
        match &result {
            Ok(()) => log::info!("Screenshot saved to {}", self.path.display()),
            Err(error) => log::warn!("Screenshot {} not saved: {error}", self.path.display()),
        }
        self.result = Some(result);
    }

    fn name(&self) -> &str {
        "save screenshot"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The two jobs of a screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenshotJobs {
    /// The render-category capture. Runs when the render thread drains its category.
    pub capture: JobId,
    /// The generic save, released by the capture.
    pub save: JobId,
}

/// Schedules a capture of `texture` followed by a save to `path`.
///
/// The capture is submitted immediately but only executes when the render
/// thread processes [`JobCategory::RENDER`]. Callbacks on the returned jobs
/// must be registered before that happens.
///
/// ## Errors
/// Returns a `JobError` if the job system refused either job.
pub fn queue_screenshot(
    job_system: &JobSystem,
    device: Arc<dyn GraphicsDevice>,
    texture: TextureId,
    path: impl Into<PathBuf>,
) -> Result<ScreenshotJobs, JobError> {
    let handoff = Arc::new(AsyncQueue::bounded(1));
    let capture = job_system.create(
        MakeImageFromTextureJob::new(device, texture, handoff.clone()),
        JobCategory::RENDER,
    )?;
    let save = job_system.create(SaveImageJob::new(path, handoff), JobCategory::GENERIC)?;
    job_system.add_successor(capture, save)?;
    job_system.run(capture)?;
    Ok(ScreenshotJobs { capture, save })
}
