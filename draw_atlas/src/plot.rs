// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A fixed-size region of a page: the unit of allocation and eviction.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};

use crate::packer::RectPacker;
use crate::{AtlasLocator, AtlasRect, AtlasToken, GenerationCounter, PlotLocator};

/// One plot of one page.
///
/// The plot keeps a CPU copy of its pixels so that dirty regions can be
/// uploaded in one copy per plot. The copy is allocated on the first insert
/// and freed when the owning page is deactivated.
pub(crate) struct Plot<P> {
    page_index: u32,
    plot_index: u32,
    generation: u64,
    /// Offset of the plot inside its page, in pixels.
    origin: [u16; 2],
    width: u16,
    height: u16,
    bytes_per_pixel: u8,
    packer: P,
    data: Vec<u8>,
    /// Plot-local region written since the last upload.
    dirty_rect: AtlasRect,
    last_use: AtlasToken,
    flushes_since_last_used: u32,
    occupied: bool,
}

impl<P: RectPacker> Plot<P> {
    pub(crate) fn new(
        page_index: u32,
        plot_index: u32,
        origin: [u16; 2],
        width: u16,
        height: u16,
        bytes_per_pixel: u8,
        counter: &GenerationCounter,
    ) -> Self {
        Self {
            page_index,
            plot_index,
            generation: counter.next(),
            origin,
            width,
            height,
            bytes_per_pixel,
            packer: P::new(width, height),
            data: Vec::new(),
            dirty_rect: AtlasRect::EMPTY,
            last_use: AtlasToken::INVALID,
            flushes_since_last_used: 0,
            occupied: false,
        }
    }

    #[inline]
    fn row_bytes(&self) -> usize {
        usize::from(self.bytes_per_pixel) * usize::from(self.width)
    }

    /// Packs a `width` x `height` sub-image and copies `pixels` into the plot.
    ///
    /// `pixels` holds tightly packed rows and must contain at least
    /// `width * height * bytes_per_pixel` bytes; the atlas checks this.
    pub(crate) fn try_add_sub_image(
        &mut self,
        width: u16,
        height: u16,
        pixels: &[u8],
        padding: u16,
    ) -> Option<AtlasLocator> {
        let (x, y) = self.packer.try_pack(width, height, padding)?;
        let rect = AtlasRect::from_xywh(x, y, width, height);

        if self.data.is_empty() {
            self.data = vec![0; self.row_bytes() * usize::from(self.height)];
        }
        let row_bytes = self.row_bytes();
        let src_row_bytes = usize::from(self.bytes_per_pixel) * usize::from(width);
        if src_row_bytes > 0 {
            let dst_start =
                usize::from(y) * row_bytes + usize::from(x) * usize::from(self.bytes_per_pixel);
            for (row, src) in pixels
                .chunks_exact(src_row_bytes)
                .take(usize::from(height))
                .enumerate()
            {
                let dst = dst_start + row * row_bytes;
                self.data[dst..dst + src_row_bytes].copy_from_slice(src);
            }
        }

        self.dirty_rect = self.dirty_rect.union(rect);
        self.occupied = true;
        Some(AtlasLocator::new(
            self.plot_locator(),
            self.origin,
            rect.offset(self.origin[0], self.origin[1]),
        ))
    }

    /// True if pixels were written since the last [`mark_uploaded`](Self::mark_uploaded).
    #[inline]
    pub(crate) fn needs_upload(&self) -> bool {
        !self.dirty_rect.is_empty()
    }

    /// Returns the pending pixels and their destination rectangle in page
    /// coordinates.
    ///
    /// The rectangle is widened to 4-byte boundaries horizontally. Rows in
    /// the returned slice are [`upload_row_stride`](Self::upload_row_stride)
    /// bytes apart. With nothing pending the rectangle is empty. The pending
    /// state is kept until [`mark_uploaded`](Self::mark_uploaded).
    pub(crate) fn prepare_for_upload(&self) -> (&[u8], AtlasRect) {
        if self.dirty_rect.is_empty() || self.data.is_empty() {
            return (&[], AtlasRect::EMPTY);
        }

        let rect = self.upload_rect();
        let bpp = usize::from(self.bytes_per_pixel);
        let row_bytes = self.row_bytes();
        let start = usize::from(rect.top) * row_bytes + usize::from(rect.left) * bpp;
        let end = (usize::from(rect.bottom) - 1) * row_bytes + usize::from(rect.right) * bpp;
        (
            &self.data[start..end],
            rect.offset(self.origin[0], self.origin[1]),
        )
    }

    /// The dirty rect widened to whole 4-byte groups, clamped to the plot.
    fn upload_rect(&self) -> AtlasRect {
        let clear_bits = 0x3 / u16::from(self.bytes_per_pixel);
        let mut rect = self.dirty_rect;
        rect.left &= !clear_bits;
        // Widen in u32 so plots near `u16::MAX` wide cannot overflow.
        let wide_bits = u32::from(clear_bits);
        let right = ((u32::from(rect.right) + wide_bits) & !wide_bits).min(u32::from(self.width));
        rect.right = u16::try_from(right).unwrap_or(self.width);
        rect
    }

    /// Forgets the region returned by the last `prepare_for_upload`.
    pub(crate) fn mark_uploaded(&mut self) {
        self.dirty_rect = AtlasRect::EMPTY;
    }

    /// Byte distance between rows of the slice returned by `prepare_for_upload`.
    #[inline]
    pub(crate) fn upload_row_stride(&self) -> usize {
        self.row_bytes()
    }

    /// Records that a draw with `token` reads this plot.
    ///
    /// Tokens only move forward; an older token is ignored.
    pub(crate) fn set_last_use_token(&mut self, token: AtlasToken) {
        if token > self.last_use {
            self.last_use = token;
        }
    }

    #[inline]
    pub(crate) fn last_use_token(&self) -> AtlasToken {
        self.last_use
    }

    #[inline]
    pub(crate) fn flushes_since_last_used(&self) -> u32 {
        self.flushes_since_last_used
    }

    pub(crate) fn inc_flushes_since_last_used(&mut self) {
        self.flushes_since_last_used = self.flushes_since_last_used.saturating_add(1);
    }

    pub(crate) fn reset_flushes_since_last_used(&mut self) {
        self.flushes_since_last_used = 0;
    }

    #[inline]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub(crate) fn plot_locator(&self) -> PlotLocator {
        PlotLocator::new(self.page_index, self.plot_index, self.generation)
    }

    /// True if at least one sub-image was added since the last reset.
    #[inline]
    pub(crate) fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// Fraction of the plot reserved by sub-images.
    pub(crate) fn occupancy(&self) -> f32 {
        self.packer.occupancy()
    }

    /// Clears every sub-image and moves the plot to a fresh generation.
    ///
    /// With `free_data` the CPU pixel copy is released; otherwise it is zeroed
    /// so stale pixels never reach a later upload.
    pub(crate) fn reset_rects(&mut self, counter: &GenerationCounter, free_data: bool) {
        self.packer.reset();
        self.generation = counter.next();
        self.last_use = AtlasToken::INVALID;
        if free_data {
            self.data = Vec::new();
        } else {
            self.data.fill(0);
        }
        self.dirty_rect = AtlasRect::EMPTY;
        self.occupied = false;
    }
}

impl<P> Debug for Plot<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Plot")
            .field("page_index", &self.page_index)
            .field("plot_index", &self.plot_index)
            .field("generation", &self.generation)
            .field("last_use", &self.last_use)
            .field("flushes_since_last_used", &self.flushes_since_last_used)
            .field("occupied", &self.occupied)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::Plot;
    use crate::packer::ShelfPacker;
    use crate::{AtlasRect, AtlasToken, GenerationCounter};

    fn plot(counter: &GenerationCounter, bytes_per_pixel: u8) -> Plot<ShelfPacker> {
        Plot::new(0, 1, [16, 0], 16, 16, bytes_per_pixel, counter)
    }

    #[test]
    fn add_sub_image_copies_rows_and_marks_dirty() {
        let counter = GenerationCounter::new();
        let mut plot = plot(&counter, 1);
        let pixels = [1_u8, 2, 3, 4, 5, 6];
        let loc = plot.try_add_sub_image(3, 2, &pixels, 0).unwrap();

        assert_eq!(loc.page_rect(), AtlasRect::from_xywh(16, 0, 3, 2));
        assert_eq!(loc.top_left(), (0, 0));
        assert_eq!(loc.plot_locator(), plot.plot_locator());
        assert!(plot.needs_upload());
        assert!(plot.is_occupied());

        let stride = plot.upload_row_stride();
        let (data, rect) = plot.prepare_for_upload();
        // Widened from 0..3 to 0..4 for 4-byte alignment.
        assert_eq!(rect, AtlasRect::from_xywh(16, 0, 4, 2));
        assert_eq!(&data[..4], &[1, 2, 3, 0]);
        assert_eq!(&data[stride..stride + 4], &[4, 5, 6, 0]);
    }

    #[test]
    fn pending_upload_survives_until_marked() {
        let counter = GenerationCounter::new();
        let mut plot = plot(&counter, 4);
        let (data, rect) = plot.prepare_for_upload();
        assert!(data.is_empty() && rect.is_empty(), "nothing written yet");

        plot.try_add_sub_image(2, 2, &[7; 16], 1).unwrap();
        let (_, rect) = plot.prepare_for_upload();
        assert_eq!(rect, AtlasRect::from_xywh(17, 1, 2, 2));
        assert!(plot.needs_upload(), "reading the region does not consume it");
        let (_, again) = plot.prepare_for_upload();
        assert_eq!(again, rect);

        plot.mark_uploaded();
        assert!(!plot.needs_upload());
        let (data, rect) = plot.prepare_for_upload();
        assert!(data.is_empty() && rect.is_empty(), "nothing new after the upload");
    }

    #[test]
    fn widening_is_clamped_at_the_widest_plot() {
        let counter = GenerationCounter::new();
        let width = u16::MAX - 1;
        let mut plot: Plot<ShelfPacker> = Plot::new(0, 0, [0, 0], width, 1, 1, &counter);
        plot.dirty_rect = AtlasRect::from_xywh(width - 5, 0, 4, 1);
        let rect = plot.upload_rect();
        assert_eq!(rect.left, width - 6);
        assert_eq!(rect.right, width);
    }

    #[test]
    fn last_use_token_is_monotone() {
        let counter = GenerationCounter::new();
        let mut plot = plot(&counter, 1);
        plot.set_last_use_token(AtlasToken::from_raw(5));
        plot.set_last_use_token(AtlasToken::from_raw(3));
        assert_eq!(plot.last_use_token(), AtlasToken::from_raw(5));
        plot.set_last_use_token(AtlasToken::from_raw(9));
        assert_eq!(plot.last_use_token(), AtlasToken::from_raw(9));
    }

    #[test]
    fn reset_bumps_generation_and_clears_state() {
        let counter = GenerationCounter::new();
        let mut plot = plot(&counter, 1);
        let before = plot.plot_locator();
        plot.try_add_sub_image(16, 16, &[1; 256], 0).unwrap();
        assert!(plot.try_add_sub_image(1, 1, &[1], 0).is_none(), "plot is full");
        plot.set_last_use_token(AtlasToken::from_raw(4));

        plot.reset_rects(&counter, false);
        assert_ne!(plot.generation(), before.generation());
        assert_eq!(plot.last_use_token(), AtlasToken::INVALID);
        assert!(!plot.is_occupied());
        assert!(!plot.needs_upload());
        assert!(plot.try_add_sub_image(1, 1, &[1], 0).is_some(), "space is reusable");
    }
}
