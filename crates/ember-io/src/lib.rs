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

//! I/O services built on the job system: asset decoding, background loading
//! jobs, the streaming pipeline that turns them into GPU resources, and
//! screenshot capture.

#![warn(missing_docs)]

pub mod decode;
pub mod loading;
pub mod screenshot;
pub mod streaming;

pub use decode::{AssetDecoder, DecodeError, ImageDecoder, ObjMeshDecoder};
pub use loading::{AssetLoading, CpuMeshLoading, ImageLoading, LoadImageJob, LoadMeshJob};
pub use screenshot::{queue_screenshot, MakeImageFromTextureJob, SaveImageJob, ScreenshotJobs};
pub use streaming::{AssetStreamer, LoadFailure, LoadingState, StreamingConfig};
