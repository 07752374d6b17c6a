// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interfaces to the GPU side: page textures and pixel uploads.
//!
//! The atlas never talks to a graphics API. It asks a [`TextureProvider`]
//! for a texture when a page is activated, drops the texture when the page is
//! deactivated, and hands dirty plot regions to an [`UploadRecorder`] when
//! the frame is about to be submitted.

use crate::{AtlasRect, MaskFormat};

/// Creates the textures that back atlas pages.
pub trait TextureProvider {
    /// The texture handle stored by each active page.
    ///
    /// Dropping the handle releases the texture.
    type Texture;

    /// Allocates a `width` x `height` texture for `format`, or `None` if the
    /// device is out of memory.
    fn allocate(&mut self, width: u16, height: u16, format: MaskFormat) -> Option<Self::Texture>;
}

/// Receives pending plot contents and turns them into copy commands.
pub trait UploadRecorder<T> {
    /// Copies `pixels` into `dst` on `texture`.
    ///
    /// `pixels` starts at the top-left pixel of `dst`; consecutive rows are
    /// `row_stride` bytes apart. Returns false if the upload could not be
    /// recorded.
    fn record_upload(
        &mut self,
        texture: &T,
        pixels: &[u8],
        row_stride: usize,
        dst: AtlasRect,
    ) -> bool;
}
