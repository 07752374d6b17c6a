// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw Atlas packs many small images, such as rasterized glyphs, into a few
//! large GPU textures and manages their lifetime across frames.
//!
//! A [`DrawAtlas`] is split into up to [`MAX_MULTITEXTURE_PAGES`] pages, one
//! texture each, and every page into a grid of equally sized plots. Plots are
//! the unit of eviction: when space runs out the least recently used plot is
//! cleared as a whole, and any [`PlotEvictionCallback`] is told so caches
//! layered on top can drop their entries.
//!
//! Safe reuse of texture memory is driven by [`AtlasToken`]s. Each draw that
//! samples the atlas records its token on the plots it reads; a plot is only
//! recycled once that token has been flushed. Calling [`DrawAtlas::compact`]
//! once per flush ages idle plots and releases the highest page when it is no
//! longer needed.
//!
//! Stale handles are detected through generations drawn from a shared
//! [`GenerationCounter`]: every reset gives a plot a fresh generation, so an
//! old [`PlotLocator`] never matches again.
//!
//! ## Features
//!
//! - `std` (enabled by default): Forwards to `log/std`.

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod atlas;
mod config;
mod error;
mod eviction;
mod generation;
mod locator;
mod page;
mod plot;
mod token;

pub mod packer;
pub mod upload;

pub use atlas::{
    AddOutcome, AtlasDescriptor, AtlasStats, BulkUsePlotUpdater, DEFAULT_PADDING, DrawAtlas,
    MAX_MULTITEXTURE_PAGES, MAX_PLOTS,
};
pub use config::{AtlasConfig, CompactionPolicy, MAX_ATLAS_SIZE, MaskFormat};
pub use error::{AtlasError, AtlasErrorKind};
pub use eviction::PlotEvictionCallback;
pub use generation::GenerationCounter;
pub use locator::{AtlasLocator, AtlasRect, PlotLocator};
pub use token::{AtlasToken, TokenTracker};
