// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sizing and aging policy.

/// Largest page edge the sizing policy will ever choose.
pub const MAX_ATLAS_SIZE: u16 = 2048;

/// The kind of content an atlas stores, which fixes its pixel format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaskFormat {
    /// 8-bit coverage masks (grayscale glyphs, path coverage).
    A8,
    /// 16-bit LCD subpixel coverage.
    A565,
    /// 32-bit colour (emoji, images).
    Argb,
}

impl MaskFormat {
    /// Bytes used by one pixel of this format.
    #[inline]
    pub const fn bytes_per_pixel(self) -> u8 {
        match self {
            Self::A8 => 1,
            Self::A565 => 2,
            Self::Argb => 4,
        }
    }
}

// Indexed by floor(log2(max_bytes >> 18)).
const ARGB_DIMENSIONS: [(u16, u16); 6] = [
    (256, 256),
    (512, 256),
    (512, 512),
    (1024, 512),
    (1024, 1024),
    (2048, 1024),
];

/// Maps a memory budget and device limit to page and plot dimensions.
///
/// Built once per context; each atlas asks it for the dimensions of its
/// [`MaskFormat`] at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasConfig {
    argb_dimensions: (u16, u16),
    max_texture_size: u16,
}

impl AtlasConfig {
    /// Chooses dimensions for a device whose textures may be up to
    /// `max_texture_size` pixels on a side, spending roughly `max_bytes` on
    /// colour atlas pages.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "max_texture_size is clamped to MAX_ATLAS_SIZE first"
    )]
    pub fn new(max_texture_size: u32, max_bytes: usize) -> Self {
        let max_texture_size = max_texture_size.min(u32::from(MAX_ATLAS_SIZE)) as u16;
        let scaled = max_bytes >> 18;
        let index = if scaled > 0 {
            (scaled.ilog2() as usize).min(ARGB_DIMENSIONS.len() - 1)
        } else {
            0
        };
        let (width, height) = ARGB_DIMENSIONS[index];
        Self {
            argb_dimensions: (width.min(max_texture_size), height.min(max_texture_size)),
            max_texture_size,
        }
    }

    /// Page dimensions for atlases of `format`.
    pub fn atlas_dimensions(self, format: MaskFormat) -> (u16, u16) {
        match format {
            // Coverage masks are small per pixel, so give them twice the extent.
            MaskFormat::A8 => (
                self.argb_dimensions
                    .0
                    .saturating_mul(2)
                    .min(self.max_texture_size),
                self.argb_dimensions
                    .1
                    .saturating_mul(2)
                    .min(self.max_texture_size),
            ),
            MaskFormat::A565 | MaskFormat::Argb => self.argb_dimensions,
        }
    }

    /// Plot dimensions for atlases of `format`.
    pub fn plot_dimensions(self, format: MaskFormat) -> (u16, u16) {
        let (atlas_width, atlas_height) = self.atlas_dimensions(format);
        match format {
            MaskFormat::A8 => {
                let width: u16 = if atlas_width >= 2048 { 512 } else { 256 };
                let height: u16 = if atlas_height >= 2048 { 512 } else { 256 };
                (width.min(atlas_width), height.min(atlas_height))
            }
            MaskFormat::A565 | MaskFormat::Argb => {
                (256_u16.min(atlas_width), 256_u16.min(atlas_height))
            }
        }
    }

    /// The device texture limit, clamped to [`MAX_ATLAS_SIZE`].
    pub fn max_texture_size(self) -> u16 {
        self.max_texture_size
    }
}

/// Tunables for [`DrawAtlas::compact`](crate::DrawAtlas::compact).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompactionPolicy {
    /// A plot idle for more than this many flushes is no longer recently used.
    pub plot_recently_used_count: u32,
    /// An atlas idle for more than this many flushes is compacted anyway.
    pub atlas_recently_used_count: u32,
    /// The last page is drained into earlier pages once its recently used
    /// plots number at most `plots_per_page / last_page_drain_divisor`.
    pub last_page_drain_divisor: u32,
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self {
            plot_recently_used_count: 32,
            atlas_recently_used_count: 128,
            last_page_drain_divisor: 4,
        }
    }
}
