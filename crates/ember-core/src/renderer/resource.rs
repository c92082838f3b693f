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

//! CPU-side resource data handed to the graphics device.

use super::RenderError;

/// Bytes per RGBA8 pixel.
const RGBA8_BYTES: usize = 4;

/// A decoded image in tightly packed RGBA8, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl CpuImage {
    /// Wraps RGBA8 pixel data, checking that its length matches the dimensions.
    ///
    /// ## Errors
    /// `RenderError::InvalidResource` if `pixels` has the wrong length.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RenderError> {
        let expected = Self::expected_len(width, height);
        if pixels.len() != expected {
            return Err(RenderError::InvalidResource {
                label: format!("{width}x{height} image"),
                reason: format!("expected {expected} bytes of RGBA8, got {}", pixels.len()),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Creates an image filled with a single color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(Self::expected_len(width, height))
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Size of the pixel data in bytes.
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    /// Returns `true` if the pixel buffer matches the dimensions.
    pub fn is_consistent(&self) -> bool {
        self.pixels.len() == Self::expected_len(self.width, self.height)
    }

    fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * RGBA8_BYTES
    }
}

/// A single mesh vertex, formatted for GPU consumption.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Vertex normal, zero when the source had none.
    pub normal: [f32; 3],
    /// Texture coordinate, zero when the source had none.
    pub uv: [f32; 2],
}

/// Indexed triangle-list geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,
    /// Triangle-list indices into `vertices`.
    pub indices: Vec<u32>,
}

impl CpuMesh {
    /// The vertex buffer as raw bytes.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// The index buffer as raw bytes.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Number of triangles described by the index buffer.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns `true` if the mesh has no geometry.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_length_is_validated() {
        assert!(CpuImage::new(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            CpuImage::new(2, 2, vec![0; 15]),
            Err(RenderError::InvalidResource { .. })
        ));
    }

    #[test]
    fn solid_image_repeats_the_color() {
        let image = CpuImage::solid(3, 1, [1, 2, 3, 4]);
        assert_eq!(image.pixels, vec![1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]);
        assert_eq!(image.byte_len(), 12);
        assert!(image.is_consistent());
    }

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        let mesh = CpuMesh {
            vertices: vec![Vertex::default(); 3],
            indices: vec![0, 1, 2],
        };
        assert_eq!(mesh.vertex_bytes().len(), 96);
        assert_eq!(mesh.index_bytes().len(), 12);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(!mesh.is_empty());
    }
}
