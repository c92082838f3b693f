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

//! The GPU-create stage of the asset pipeline and its progress tracking.

use crate::decode::{ImageDecoder, ObjMeshDecoder};
use crate::loading::{CpuMeshLoading, ImageLoading, LoadAssetJob, LoadImageJob, LoadMeshJob};
use ember_core::job::{Job, JobCategory, JobError, JobId, JobOutcome, JobSystem};
use ember_core::renderer::{GraphicsDevice, MeshId, TextureId};
use ember_core::sync::AsyncQueue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Tuning of the [`AssetStreamer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Maximum number of GPU uploads per asset kind in one [`AssetStreamer::update`].
    /// `0` is treated as `1` so loading always progresses.
    pub uploads_per_frame: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            uploads_per_frame: 4,
        }
    }
}

impl StreamingConfig {
    /// Loads a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Where the loading pipeline stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingState {
    /// Nothing has been queued.
    Idle,
    /// Some queued assets have not reached the GPU stage yet.
    Loading {
        /// Assets uploaded so far.
        loaded: usize,
        /// Assets skipped so far.
        failed: usize,
        /// Assets queued in total.
        total: usize,
    },
    /// Every queued asset was either uploaded or skipped.
    Complete {
        /// Assets uploaded.
        loaded: usize,
        /// Assets skipped.
        failed: usize,
    },
}

impl LoadingState {
    /// Returns `true` for [`LoadingState::Complete`].
    pub fn is_complete(&self) -> bool {
        matches!(self, LoadingState::Complete { .. })
    }
}

impl fmt::Display for LoadingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadingState::Idle => f.write_str("idle"),
            LoadingState::Loading {
                loaded,
                failed,
                total,
            } => write!(f, "loading {}/{total} ({failed} failed)", loaded + failed),
            LoadingState::Complete { loaded, failed } => {
                write!(f, "complete ({loaded} loaded, {failed} failed)")
            }
        }
    }
}

/// An asset that was skipped, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    /// Asset name.
    pub name: String,
    /// Source file.
    pub path: PathBuf,
    /// What went wrong, from the disk stage or the GPU stage.
    pub reason: String,
}

/// Drives background asset loading from the thread owning the graphics device.
///
/// `queue_*` schedules a [`LoadAssetJob`] on the generic workers. Each call to
/// [`update`](Self::update) then pulls a bounded number of decoded records
/// from the loaded-from-disk queues without blocking and creates their GPU
/// resources on the calling thread.
///
/// A failed asset is skipped with a diagnostic: it counts towards
/// [`objects_failed`](Self::objects_failed), never towards
/// [`objects_loaded`](Self::objects_loaded), and is listed in
/// [`failures`](Self::failures). Loading completes once every queued asset
/// was seen by the GPU stage.
///
/// Load jobs carry finish callbacks, so some thread must keep calling
/// [`JobSystem::process_finish_callbacks`] for [`JobCategory::GENERIC`].
/// Otherwise finished load jobs stay in the job arena and a load whose
/// decoder panicked is never reported.
pub struct AssetStreamer {
    job_system: Arc<JobSystem>,
    config: StreamingConfig,
    images: Arc<AsyncQueue<ImageLoading>>,
    meshes: Arc<AsyncQueue<CpuMeshLoading>>,
    textures: HashMap<String, TextureId>,
    gpu_meshes: HashMap<String, MeshId>,
    failures: Vec<LoadFailure>,
    objects_to_load: usize,
    objects_loaded: usize,
}

impl AssetStreamer {
    /// Creates an idle streamer scheduling its loads on `job_system`.
    pub fn new(job_system: Arc<JobSystem>, mut config: StreamingConfig) -> Self {
        if config.uploads_per_frame == 0 {
            log::warn!("uploads_per_frame of 0 would stall loading; using 1");
            config.uploads_per_frame = 1;
        }
        Self {
            job_system,
            config,
            images: Arc::new(AsyncQueue::new()),
            meshes: Arc::new(AsyncQueue::new()),
            textures: HashMap::new(),
            gpu_meshes: HashMap::new(),
            failures: Vec::new(),
            objects_to_load: 0,
            objects_loaded: 0,
        }
    }

    /// Schedules the image at `path` to be loaded as texture `name`.
    ///
    /// ## Errors
    /// Returns a `JobError` if the job system refused the load job.
    pub fn queue_image(
        &mut self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<JobId, JobError> {
        let job = LoadImageJob::new(
            ImageLoading::new(name, path.as_ref()),
            ImageDecoder,
            self.images.clone(),
        );
        self.schedule(job)
    }

    /// Schedules the OBJ mesh at `path` to be loaded as mesh `name`.
    ///
    /// ## Errors
    /// Returns a `JobError` if the job system refused the load job.
    pub fn queue_mesh(
        &mut self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<JobId, JobError> {
        let job = LoadMeshJob::new(
            CpuMeshLoading::new(name, path.as_ref()),
            ObjMeshDecoder,
            self.meshes.clone(),
        );
        self.schedule(job)
    }

    fn schedule<A, D>(&mut self, job: LoadAssetJob<A, D>) -> Result<JobId, JobError>
    where
        A: Send + 'static,
        D: crate::decode::AssetDecoder<A> + 'static,
    {
        let name = job.name().to_string();
        let id = self.job_system.create(job, JobCategory::GENERIC)?;
        // A panicking decoder never hands its record off; do it here instead.
        self.job_system
            .set_finish_callback(id, |job: &mut LoadAssetJob<A, D>, outcome| {
                if outcome == JobOutcome::Panicked {
                    job.abandon("decoder panicked");
                }
            })?;
        self.job_system.run(id)?;

        self.objects_to_load += 1;
        log::debug!("Queued {id}: {name}");
        Ok(id)
    }

    /// Creates GPU resources for decoded assets, at most
    /// `uploads_per_frame` of each kind, and reports the resulting state.
    ///
    /// Never blocks. Must be called from the thread owning `device`, and
    /// alongside [`JobSystem::process_finish_callbacks`] for
    /// [`JobCategory::GENERIC`]: a load whose decoder panicked only reaches
    /// the queues through its finish callback.
    pub fn update(&mut self, device: &dyn GraphicsDevice) -> LoadingState {
        for _ in 0..self.config.uploads_per_frame {
            let Some(record) = self.images.try_dequeue() else {
                break;
            };
            let result = match &record.payload {
                Some(image) => device
                    .create_texture(&record.name, image)
                    .map_err(|error| error.to_string()),
                None => Err(Self::disk_error(&record.error)),
            };
            match result {
                Ok(texture) => {
                    self.textures.insert(record.name.clone(), texture);
                    self.objects_loaded += 1;
                }
                Err(reason) => self.skip(record.name, record.path, reason),
            }
        }

        for _ in 0..self.config.uploads_per_frame {
            let Some(record) = self.meshes.try_dequeue() else {
                break;
            };
            let result = match &record.payload {
                Some(mesh) => device
                    .create_mesh(&record.name, mesh)
                    .map_err(|error| error.to_string()),
                None => Err(Self::disk_error(&record.error)),
            };
            match result {
                Ok(mesh) => {
                    self.gpu_meshes.insert(record.name.clone(), mesh);
                    self.objects_loaded += 1;
                }
                Err(reason) => self.skip(record.name, record.path, reason),
            }
        }

        self.state()
    }

    fn disk_error(error: &Option<String>) -> String {
        error
            .clone()
            .unwrap_or_else(|| "no payload was produced".to_string())
    }

    fn skip(&mut self, name: String, path: PathBuf, reason: String) {
        log::warn!("Skipping asset '{name}' ({}): {reason}", path.display());
        self.failures.push(LoadFailure { name, path, reason });
    }

    /// Current state of the pipeline.
    pub fn state(&self) -> LoadingState {
        let failed = self.objects_failed();
        if self.objects_to_load == 0 {
            LoadingState::Idle
        } else if self.objects_loaded + failed >= self.objects_to_load {
            LoadingState::Complete {
                loaded: self.objects_loaded,
                failed,
            }
        } else {
            LoadingState::Loading {
                loaded: self.objects_loaded,
                failed,
                total: self.objects_to_load,
            }
        }
    }

    /// Fraction of queued assets that reached the GPU, in `[0, 1]`.
    /// `1.0` when nothing was queued.
    pub fn progress(&self) -> f32 {
        if self.objects_to_load == 0 {
            1.0
        } else {
            self.objects_loaded as f32 / self.objects_to_load as f32
        }
    }

    /// Number of assets queued so far.
    pub fn objects_to_load(&self) -> usize {
        self.objects_to_load
    }

    /// Number of assets uploaded to the GPU.
    pub fn objects_loaded(&self) -> usize {
        self.objects_loaded
    }

    /// Number of assets skipped.
    pub fn objects_failed(&self) -> usize {
        self.failures.len()
    }

    /// Diagnostics of every skipped asset, in the order they were seen.
    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    /// Texture created for the image queued as `name`.
    pub fn texture(&self, name: &str) -> Option<TextureId> {
        self.textures.get(name).copied()
    }

    /// Mesh created for the OBJ file queued as `name`.
    pub fn mesh(&self, name: &str) -> Option<MeshId> {
        self.gpu_meshes.get(name).copied()
    }

    /// Names and handles of every texture created so far.
    pub fn textures(&self) -> impl Iterator<Item = (&str, TextureId)> {
        self.textures.iter().map(|(name, &id)| (name.as_str(), id))
    }
}

impl fmt::Debug for AssetStreamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetStreamer")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("pending_images", &self.images.len())
            .field("pending_meshes", &self.meshes.len())
            .finish()
    }
}
