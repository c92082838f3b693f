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

//! Errors reported by a [`super::GraphicsDevice`].

use super::TextureId;
use thiserror::Error;

/// A failure while creating or reading a GPU resource.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The device was called from a thread that does not own the graphics context.
    #[error("graphics device used from a thread that does not own it")]
    WrongThread,

    /// The texture handle does not name a live texture.
    #[error("{0} does not exist")]
    InvalidTexture(TextureId),

    /// The CPU-side resource data is malformed.
    #[error("invalid resource '{label}': {reason}")]
    InvalidResource {
        /// Debug name of the resource.
        label: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Any other backend failure.
    #[error("graphics backend error: {0}")]
    Backend(String),
}
