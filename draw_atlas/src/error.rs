// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

/// Error returned when an atlas cannot be built or cannot take a sub-image.
///
/// A failed insertion leaves the atlas exactly as it was. Running out of
/// reusable plots is not an error; see [`AddOutcome::TryAgain`](crate::AddOutcome::TryAgain).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasError {
    kind: AtlasErrorKind,
    width: u16,
    height: u16,
}

impl AtlasError {
    pub(crate) const fn new(kind: AtlasErrorKind, width: u16, height: u16) -> Self {
        Self {
            kind,
            width,
            height,
        }
    }

    /// The category of this error.
    pub const fn kind(self) -> AtlasErrorKind {
        self.kind
    }

    /// Width of the rejected request (sub-image, page or plot, depending on the kind).
    pub const fn width(self) -> u16 {
        self.width
    }

    /// Height of the rejected request (sub-image, page or plot, depending on the kind).
    pub const fn height(self) -> u16 {
        self.height
    }
}

impl fmt::Display for AtlasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self.kind {
            AtlasErrorKind::TooLarge => "sub-image does not fit in a plot",
            AtlasErrorKind::TextureAllocationFailed => "failed to allocate a page texture",
            AtlasErrorKind::PixelDataTooShort => "pixel data is shorter than the sub-image",
            AtlasErrorKind::InvalidDimensions => "page is not a whole grid of plots",
            AtlasErrorKind::InvalidPageCount => "unsupported number of pages",
        };
        write!(f, "{msg} ({}x{})", self.width, self.height)
    }
}

impl core::error::Error for AtlasError {}

/// The non-exhaustive category of an [`AtlasError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum AtlasErrorKind {
    /// The sub-image plus padding is larger than a plot.
    TooLarge,
    /// The texture provider could not back a new page.
    TextureAllocationFailed,
    /// Fewer bytes were supplied than `width * height * bytes_per_pixel`.
    PixelDataTooShort,
    /// Page or plot dimensions are zero, don't divide evenly, or yield too many plots.
    InvalidDimensions,
    /// The page budget is zero or above [`MAX_MULTITEXTURE_PAGES`](crate::MAX_MULTITEXTURE_PAGES).
    InvalidPageCount,
}
