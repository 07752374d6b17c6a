// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stand-ins for the graphics device.

use std::cell::Cell;
use std::rc::Rc;

use draw_atlas::upload::{TextureProvider, UploadRecorder};
use draw_atlas::{AtlasRect, MaskFormat};

/// A texture handle that reports its own release.
#[derive(Debug)]
pub(crate) struct FakeTexture {
    pub(crate) id: u32,
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) format: MaskFormat,
    live: Rc<Cell<u32>>,
}

impl Drop for FakeTexture {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

/// Hands out [`FakeTexture`]s and counts how many are alive.
#[derive(Debug, Default)]
pub(crate) struct FakeTextures {
    allocated: u32,
    live: Rc<Cell<u32>>,
    /// Allocation fails once this many textures have been handed out.
    pub(crate) limit: Option<u32>,
}

impl FakeTextures {
    /// Textures allocated so far, including released ones.
    pub(crate) fn allocated(&self) -> u32 {
        self.allocated
    }

    /// Textures not yet dropped.
    pub(crate) fn live(&self) -> u32 {
        self.live.get()
    }
}

impl TextureProvider for FakeTextures {
    type Texture = FakeTexture;

    fn allocate(&mut self, width: u16, height: u16, format: MaskFormat) -> Option<FakeTexture> {
        if self.limit.is_some_and(|limit| self.allocated >= limit) {
            return None;
        }
        self.allocated += 1;
        self.live.set(self.live.get() + 1);
        Some(FakeTexture {
            id: self.allocated,
            width,
            height,
            format,
            live: self.live.clone(),
        })
    }
}

/// One recorded texture copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RecordedUpload {
    pub(crate) texture: u32,
    pub(crate) dst: AtlasRect,
    pub(crate) row_stride: usize,
    pub(crate) pixels: Vec<u8>,
}

impl RecordedUpload {
    /// The bytes of row `row` of the destination rectangle.
    pub(crate) fn row(&self, row: usize, bytes_per_pixel: usize) -> &[u8] {
        let start = row * self.row_stride;
        &self.pixels[start..start + usize::from(self.dst.width()) * bytes_per_pixel]
    }
}

/// Keeps a copy of every upload it is given.
#[derive(Debug, Default)]
pub(crate) struct RecordingUploads {
    pub(crate) uploads: Vec<RecordedUpload>,
    /// Refuse every upload, as a recorder out of staging memory would.
    pub(crate) refuse: bool,
}

impl UploadRecorder<FakeTexture> for RecordingUploads {
    fn record_upload(
        &mut self,
        texture: &FakeTexture,
        pixels: &[u8],
        row_stride: usize,
        dst: AtlasRect,
    ) -> bool {
        if self.refuse {
            return false;
        }
        assert!(
            dst.right <= texture.width && dst.bottom <= texture.height,
            "upload {dst:?} falls outside the {}x{} texture",
            texture.width,
            texture.height
        );
        self.uploads.push(RecordedUpload {
            texture: texture.id,
            dst,
            row_stride,
            pixels: pixels.to_vec(),
        });
        true
    }
}
