// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sub-rectangle packing inside a single plot.

use core::fmt::{Debug, Formatter};

use etagere::{AtlasAllocator, Size};

/// Packs rectangles into a fixed-size area.
///
/// Each plot owns one packer. The atlas only asks it for a position and
/// resets it when the plot is evicted; it never inspects the packer's state.
pub trait RectPacker {
    /// Creates an empty packer covering `width` x `height` pixels.
    fn new(width: u16, height: u16) -> Self
    where
        Self: Sized;

    /// Reserves a `width` x `height` rectangle surrounded by `padding` pixels
    /// on every side.
    ///
    /// Returns the origin of the unpadded rectangle, or `None` if there is no
    /// room left.
    fn try_pack(&mut self, width: u16, height: u16, padding: u16) -> Option<(u16, u16)>;

    /// Forgets every reservation.
    fn reset(&mut self);

    /// Fraction of the area reserved so far, in `0.0..=1.0`.
    fn occupancy(&self) -> f32;
}

/// The default packer, a shelf allocator from `etagere`.
///
/// Plots are never freed piecemeal, only reset as a whole, so allocation ids
/// are dropped as soon as a rectangle is placed.
pub struct ShelfPacker {
    allocator: AtlasAllocator,
    width: u16,
    height: u16,
    area_so_far: u32,
}

impl RectPacker for ShelfPacker {
    fn new(width: u16, height: u16) -> Self {
        Self {
            allocator: AtlasAllocator::new(Size::new(i32::from(width), i32::from(height))),
            width,
            height,
            area_so_far: 0,
        }
    }

    fn try_pack(&mut self, width: u16, height: u16, padding: u16) -> Option<(u16, u16)> {
        let padding = i32::from(padding);
        // Empty sub-images still take a pixel so that every locator is distinct.
        let padded_width = (i32::from(width) + 2 * padding).max(1);
        let padded_height = (i32::from(height) + 2 * padding).max(1);
        if padded_width > i32::from(self.width) || padded_height > i32::from(self.height) {
            return None;
        }

        let allocation = self
            .allocator
            .allocate(Size::new(padded_width, padded_height))?;
        let origin = allocation.rectangle.min;
        let x = u16::try_from(origin.x + padding).ok()?;
        let y = u16::try_from(origin.y + padding).ok()?;
        self.area_so_far += padded_width.unsigned_abs() * padded_height.unsigned_abs();
        Some((x, y))
    }

    fn reset(&mut self) {
        self.allocator.clear();
        self.area_so_far = 0;
    }

    fn occupancy(&self) -> f32 {
        let area = u32::from(self.width) * u32::from(self.height);
        if area == 0 {
            return 0.0;
        }
        self.area_so_far as f32 / area as f32
    }
}

impl Debug for ShelfPacker {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShelfPacker")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("area_so_far", &self.area_so_far)
            .finish_non_exhaustive()
    }
}
