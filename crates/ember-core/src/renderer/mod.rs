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

//! Backend-agnostic rendering contracts consumed by GPU-affine jobs.
//!
//! This module only defines the "what": CPU-side resource data and the
//! [`GraphicsDevice`] trait that turns it into GPU resources. Concrete devices
//! live in `ember-infra`. A device is bound to the thread that owns the graphics
//! context, which is why uploads and read-backs are scheduled as render-category
//! jobs or performed by the render thread itself.

pub mod error;
pub mod resource;

pub use self::error::RenderError;
pub use self::resource::{CpuImage, CpuMesh, Vertex};

use std::fmt::{self, Debug};

/// An opaque handle to a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

/// An opaque handle to a GPU mesh (vertex and index buffers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

/// The resource-creation surface of a graphics backend.
///
/// Implementations may reject calls made from a thread other than the one
/// owning the graphics context with [`RenderError::WrongThread`].
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Uploads an RGBA8 image as a new texture.
    /// ## Arguments
    /// * `label` - A debug name for the texture.
    /// * `image` - The pixel data to upload.
    /// ## Returns
    /// The handle of the created texture.
    /// ## Errors
    /// * `RenderError` - If the image is invalid or the backend refuses the upload.
    fn create_texture(&self, label: &str, image: &CpuImage) -> Result<TextureId, RenderError>;

    /// Uploads a mesh as new vertex and index buffers.
    /// ## Arguments
    /// * `label` - A debug name for the mesh.
    /// * `mesh` - The vertex and index data to upload.
    /// ## Returns
    /// The handle of the created mesh.
    /// ## Errors
    /// * `RenderError` - If the mesh is empty or the backend refuses the upload.
    fn create_mesh(&self, label: &str, mesh: &CpuMesh) -> Result<MeshId, RenderError>;

    /// Copies a texture back into CPU memory.
    /// ## Errors
    /// * `RenderError::InvalidTexture` - If `texture` does not name a live texture.
    fn read_texture(&self, texture: TextureId) -> Result<CpuImage, RenderError>;
}
