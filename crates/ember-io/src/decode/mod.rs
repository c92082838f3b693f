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

//! Decoding raw file bytes into CPU-side engine resources.

mod image;
mod obj;

pub use self::image::ImageDecoder;
pub use self::obj::ObjMeshDecoder;

use std::path::Path;
use thiserror::Error;

/// A failure while reading or decoding an asset.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file could not be read.
    #[error("failed to read asset file: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes are not an image format the decoder understands.
    #[error("failed to decode image: {0}")]
    Image(#[from] ::image::ImageError),

    /// The bytes are not a valid Wavefront OBJ file.
    #[error("failed to parse OBJ: {0}")]
    Obj(#[from] tobj::LoadError),

    /// The file decoded to nothing usable.
    #[error("asset is empty: {0}")]
    Empty(String),
}

/// Parses a byte slice into an asset of type `A`.
///
/// This is the CPU-heavy part of loading. Implementations are run on worker
/// threads, so they must not touch the graphics device.
pub trait AssetDecoder<A>: Send + Sync {
    /// Decodes `bytes` into an asset.
    ///
    /// ## Errors
    /// `DecodeError` if the bytes are not a valid encoding of `A`.
    fn decode(&self, bytes: &[u8]) -> Result<A, DecodeError>;

    /// Reads `path` and decodes its content.
    fn decode_file(&self, path: &Path) -> Result<A, DecodeError> {
        let bytes = std::fs::read(path)?;
        self.decode(&bytes)
    }
}
