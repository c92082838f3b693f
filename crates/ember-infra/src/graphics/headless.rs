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

//! An in-memory [`GraphicsDevice`] with the thread affinity of a real one.

use ember_core::renderer::{CpuImage, CpuMesh, GraphicsDevice, MeshId, RenderError, TextureId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

#[derive(Debug)]
struct HeadlessTextureEntry {
    label: String,
    image: CpuImage,
}

#[derive(Debug)]
struct HeadlessMeshEntry {
    label: String,
    vertex_count: usize,
    index_count: usize,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A graphics device that keeps every resource in CPU memory.
///
/// Like a real immediate context it may only be used from the thread that
/// created it; calls from any other thread fail with
/// [`RenderError::WrongThread`]. This makes it a faithful stand-in for the
/// render thread in tools and tests.
#[derive(Debug)]
pub struct HeadlessDevice {
    owner: ThreadId,
    textures: Mutex<HashMap<TextureId, HeadlessTextureEntry>>,
    meshes: Mutex<HashMap<MeshId, HeadlessMeshEntry>>,
    rejected_labels: Mutex<HashSet<String>>,
    next_texture_id: AtomicU32,
    next_mesh_id: AtomicU32,
    allocated_bytes: AtomicU64,
}

impl HeadlessDevice {
    /// Creates a device owned by the calling thread.
    pub fn new() -> Self {
        let owner = thread::current().id();
        log::info!("Headless graphics device created on {owner:?}");
        Self {
            owner,
            textures: Mutex::new(HashMap::new()),
            meshes: Mutex::new(HashMap::new()),
            rejected_labels: Mutex::new(HashSet::new()),
            next_texture_id: AtomicU32::new(0),
            next_mesh_id: AtomicU32::new(0),
            allocated_bytes: AtomicU64::new(0),
        }
    }

    /// Makes every later upload labelled `label` fail with a backend error.
    pub fn reject_label(&self, label: impl Into<String>) {
        relock(&self.rejected_labels).insert(label.into());
    }

    /// Number of live textures.
    pub fn texture_count(&self) -> usize {
        relock(&self.textures).len()
    }

    /// Number of live meshes.
    pub fn mesh_count(&self) -> usize {
        relock(&self.meshes).len()
    }

    /// Total bytes uploaded so far.
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes.load(Ordering::Relaxed)
    }

    /// Debug label of a texture, if it exists.
    pub fn texture_label(&self, texture: TextureId) -> Option<String> {
        relock(&self.textures)
            .get(&texture)
            .map(|entry| entry.label.clone())
    }

    /// Debug label and `(vertices, indices)` counts of a mesh, if it exists.
    pub fn mesh_info(&self, mesh: MeshId) -> Option<(String, usize, usize)> {
        relock(&self.meshes)
            .get(&mesh)
            .map(|entry| (entry.label.clone(), entry.vertex_count, entry.index_count))
    }

    fn check_thread(&self) -> Result<(), RenderError> {
        if thread::current().id() == self.owner {
            Ok(())
        } else {
            log::error!(
                "Headless device used from {:?}, owned by {:?}",
                thread::current().id(),
                self.owner
            );
            Err(RenderError::WrongThread)
        }
    }

    fn check_label(&self, label: &str) -> Result<(), RenderError> {
        if relock(&self.rejected_labels).contains(label) {
            Err(RenderError::Backend(format!("upload of '{label}' rejected")))
        } else {
            Ok(())
        }
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_texture(&self, label: &str, image: &CpuImage) -> Result<TextureId, RenderError> {
        self.check_thread()?;
        self.check_label(label)?;
        if !image.is_consistent() || image.width == 0 || image.height == 0 {
            return Err(RenderError::InvalidResource {
                label: label.to_string(),
                reason: format!(
                    "{}x{} image with {} bytes",
                    image.width,
                    image.height,
                    image.byte_len()
                ),
            });
        }

        let id = TextureId(self.next_texture_id.fetch_add(1, Ordering::Relaxed));
        self.allocated_bytes
            .fetch_add(image.byte_len() as u64, Ordering::Relaxed);
        relock(&self.textures).insert(
            id,
            HeadlessTextureEntry {
                label: label.to_string(),
                image: image.clone(),
            },
        );
        log::debug!("Created {id} '{label}' ({}x{})", image.width, image.height);
        Ok(id)
    }

    fn create_mesh(&self, label: &str, mesh: &CpuMesh) -> Result<MeshId, RenderError> {
        self.check_thread()?;
        self.check_label(label)?;
        if mesh.is_empty() {
            return Err(RenderError::InvalidResource {
                label: label.to_string(),
                reason: "mesh has no geometry".to_string(),
            });
        }
        if let Some(&bad) = mesh
            .indices
            .iter()
            .find(|&&index| index as usize >= mesh.vertices.len())
        {
            return Err(RenderError::InvalidResource {
                label: label.to_string(),
                reason: format!("index {bad} out of {} vertices", mesh.vertices.len()),
            });
        }

        let id = MeshId(self.next_mesh_id.fetch_add(1, Ordering::Relaxed));
        let bytes = mesh.vertex_bytes().len() + mesh.index_bytes().len();
        self.allocated_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
        relock(&self.meshes).insert(
            id,
            HeadlessMeshEntry {
                label: label.to_string(),
                vertex_count: mesh.vertices.len(),
                index_count: mesh.indices.len(),
            },
        );
        log::debug!(
            "Created {id} '{label}' ({} triangles)",
            mesh.triangle_count()
        );
        Ok(id)
    }

    fn read_texture(&self, texture: TextureId) -> Result<CpuImage, RenderError> {
        self.check_thread()?;
        relock(&self.textures)
            .get(&texture)
            .map(|entry| entry.image.clone())
            .ok_or(RenderError::InvalidTexture(texture))
    }
}
