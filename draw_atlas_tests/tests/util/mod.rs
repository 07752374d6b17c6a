// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility functions and types shared across tests.

mod glyph_cache;
mod gpu;
mod harness;

pub(crate) use glyph_cache::{GlyphCache, GlyphKey};
pub(crate) use gpu::{FakeTexture, FakeTextures, RecordedUpload, RecordingUploads};
pub(crate) use harness::TestAtlas;

/// A `width` x `height` single-channel image whose pixels encode their position.
pub(crate) fn coverage_image(width: u16, height: u16) -> Vec<u8> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| (x ^ (y << 3)) as u8))
        .collect()
}

/// A `width` x `height` image of packed 32-bit pixels, as bytes.
pub(crate) fn argb_image(width: u16, height: u16, color: u32) -> Vec<u8> {
    let pixels: Vec<u32> = (0..u32::from(width) * u32::from(height))
        .map(|index| color ^ index)
        .collect();
    bytemuck::cast_slice(&pixels).to_vec()
}
