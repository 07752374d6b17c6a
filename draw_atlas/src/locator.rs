// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generation-stamped handles into an atlas.

/// Identifies one plot of one page at one generation.
///
/// A locator stays valid only while the plot it names still carries the same
/// generation; check with [`DrawAtlas::has_id`](crate::DrawAtlas::has_id)
/// before reusing a locator across frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlotLocator {
    page_index: u32,
    plot_index: u32,
    generation: u64,
}

impl PlotLocator {
    /// Creates a locator for the given page, plot and generation.
    pub const fn new(page_index: u32, plot_index: u32, generation: u64) -> Self {
        Self {
            page_index,
            plot_index,
            generation,
        }
    }

    /// Index of the page holding the plot.
    #[inline]
    pub const fn page_index(&self) -> u32 {
        self.page_index
    }

    /// Index of the plot within its page.
    #[inline]
    pub const fn plot_index(&self) -> u32 {
        self.plot_index
    }

    /// Generation the plot carried when this locator was minted.
    #[inline]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns false for locators that were never minted by an atlas.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.generation != crate::GenerationCounter::INVALID_GENERATION
    }
}

/// An integer rectangle in page pixels, `left..right` by `top..bottom`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AtlasRect {
    /// Left edge (inclusive).
    pub left: u16,
    /// Top edge (inclusive).
    pub top: u16,
    /// Right edge (exclusive).
    pub right: u16,
    /// Bottom edge (exclusive).
    pub bottom: u16,
}

impl AtlasRect {
    /// An empty rectangle at the origin.
    pub const EMPTY: Self = Self {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    /// Creates a rectangle from its origin and size.
    pub const fn from_xywh(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            left: x,
            top: y,
            right: x + width,
            bottom: y + height,
        }
    }

    /// Width in pixels.
    #[inline]
    pub const fn width(self) -> u16 {
        self.right.saturating_sub(self.left)
    }

    /// Height in pixels.
    #[inline]
    pub const fn height(self) -> u16 {
        self.bottom.saturating_sub(self.top)
    }

    /// True if the rectangle covers no pixels.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Returns the smallest rectangle containing both `self` and `other`.
    ///
    /// Empty rectangles do not contribute to the union.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Returns the rectangle translated by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: u16, dy: u16) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }
}

/// Where a sub-image landed: its plot plus the rectangle it occupies.
///
/// Created by a successful [`DrawAtlas::add_to_atlas`](crate::DrawAtlas::add_to_atlas)
/// and never mutated afterwards. Once the plot is evicted the locator goes
/// stale; the atlas does not track outstanding locators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AtlasLocator {
    plot_locator: PlotLocator,
    plot_origin: [u16; 2],
    rect: AtlasRect,
}

impl AtlasLocator {
    pub(crate) const fn new(
        plot_locator: PlotLocator,
        plot_origin: [u16; 2],
        rect: AtlasRect,
    ) -> Self {
        Self {
            plot_locator,
            plot_origin,
            rect,
        }
    }

    /// The plot that holds the sub-image.
    #[inline]
    pub const fn plot_locator(&self) -> PlotLocator {
        self.plot_locator
    }

    /// Index of the page (texture) holding the sub-image.
    #[inline]
    pub const fn page_index(&self) -> u32 {
        self.plot_locator.page_index
    }

    /// Index of the plot within its page.
    #[inline]
    pub const fn plot_index(&self) -> u32 {
        self.plot_locator.plot_index
    }

    /// Generation of the plot when the sub-image was inserted.
    #[inline]
    pub const fn generation(&self) -> u64 {
        self.plot_locator.generation
    }

    /// Origin of the sub-image relative to its plot's backing pixels.
    pub const fn top_left(&self) -> (u16, u16) {
        (
            self.rect.left - self.plot_origin[0],
            self.rect.top - self.plot_origin[1],
        )
    }

    /// Rectangle of the sub-image in page (texture) pixels.
    #[inline]
    pub const fn page_rect(&self) -> AtlasRect {
        self.rect
    }

    /// Width of the sub-image.
    #[inline]
    pub const fn width(&self) -> u16 {
        self.rect.width()
    }

    /// Height of the sub-image.
    #[inline]
    pub const fn height(&self) -> u16 {
        self.rect.height()
    }
}
