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

//! The disk-load stage of the asset pipeline.
//!
//! A [`LoadAssetJob`] runs on a generic worker, reads and decodes one file, and
//! hands the resulting [`AssetLoading`] record to a loaded-from-disk queue.
//! The record is handed off whether or not loading succeeded, so whoever
//! consumes the queue always sees one record per job.

use crate::decode::{AssetDecoder, ImageDecoder, ObjMeshDecoder};
use ember_core::job::Job;
use ember_core::renderer::{CpuImage, CpuMesh};
use ember_core::sync::AsyncQueue;
use std::any::Any;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

/// One asset travelling through the loading pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetLoading<A> {
    /// Name the asset is registered under once uploaded.
    pub name: String,
    /// Source file.
    pub path: PathBuf,
    /// The decoded resource. `None` until loaded, and forever on failure.
    pub payload: Option<A>,
    /// Why loading failed, if it did.
    pub error: Option<String>,
}

impl<A> AssetLoading<A> {
    /// Creates an empty record for the asset at `path`.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            payload: None,
            error: None,
        }
    }

    /// Returns `true` if the payload was decoded.
    pub fn is_loaded(&self) -> bool {
        self.payload.is_some()
    }
}

/// A decoded image waiting for texture creation.
pub type ImageLoading = AssetLoading<CpuImage>;
/// A decoded mesh waiting for buffer creation.
pub type CpuMeshLoading = AssetLoading<CpuMesh>;

/// Reads a file, decodes it with `D`, and hands the record to `output`.
pub struct LoadAssetJob<A, D> {
    label: String,
    record: Option<AssetLoading<A>>,
    decoder: D,
    output: Arc<AsyncQueue<AssetLoading<A>>>,
    failed: bool,
    _asset: PhantomData<fn() -> A>,
}

/// Loads an image file into an [`ImageLoading`] record.
pub type LoadImageJob = LoadAssetJob<CpuImage, ImageDecoder>;
/// Loads an OBJ file into a [`CpuMeshLoading`] record.
pub type LoadMeshJob = LoadAssetJob<CpuMesh, ObjMeshDecoder>;

impl<A, D> LoadAssetJob<A, D>
where
    A: Send + 'static,
    D: AssetDecoder<A> + 'static,
{
    /// Creates a job loading `record.path` with `decoder`.
    pub fn new(
        record: AssetLoading<A>,
        decoder: D,
        output: Arc<AsyncQueue<AssetLoading<A>>>,
    ) -> Self {
        Self {
            label: format!("load '{}'", record.name),
            record: Some(record),
            decoder,
            output,
            failed: false,
            _asset: PhantomData,
        }
    }

    /// Returns `true` if loading failed. Meaningful once the job has run.
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Returns `true` once the record has been handed to the output queue.
    pub fn is_handed_off(&self) -> bool {
        self.record.is_none()
    }

    /// Hands the record off as failed if execution never got that far.
    ///
    /// Used by finish callbacks of jobs whose decoder panicked, so the
    /// consumer still sees exactly one record for this asset.
    pub fn abandon(&mut self, reason: &str) {
        let Some(mut record) = self.record.take() else {
            return;
        };
        self.failed = true;
        record.payload = None;
        record.error = Some(reason.to_string());
        log::warn!("Loading '{}' abandoned: {reason}", record.name);
        self.hand_off(record);
    }

    fn hand_off(&mut self, record: AssetLoading<A>) {
        if let Err(record) = self.output.enqueue(record) {
            log::warn!(
                "Loaded-from-disk queue closed; dropping record for '{}'",
                record.name
            );
        }
    }
}

impl<A, D> Job for LoadAssetJob<A, D>
where
    A: Send + 'static,
    D: AssetDecoder<A> + 'static,
{
    fn execute(&mut self) {
        let Some(record) = self.record.as_mut() else {
            return;
        };

        match self.decoder.decode_file(&record.path) {
            Ok(asset) => {
                log::debug!("Decoded '{}' from {}", record.name, record.path.display());
                record.payload = Some(asset);
            }
            Err(error) => {
                log::warn!(
                    "Failed to load '{}' from {}: {error}",
                    record.name,
                    record.path.display()
                );
                record.error = Some(error.to_string());
                self.failed = true;
            }
        }

        if let Some(record) = self.record.take() {
            self.hand_off(record);
        }
    }

    fn name(&self) -> &str {
        &self.label
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
