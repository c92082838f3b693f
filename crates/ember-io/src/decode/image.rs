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

use super::{AssetDecoder, DecodeError};
use ember_core::renderer::CpuImage;

/// Decodes any format supported by the `image` crate into RGBA8.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl AssetDecoder<CpuImage> for ImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<CpuImage, DecodeError> {
        let decoded = image::load_from_memory(bytes)?;

        // Convert to RGBA8 (kept in sRGB space)
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::Empty(format!("{width}x{height} image")));
        }

        Ok(CpuImage {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }
}
