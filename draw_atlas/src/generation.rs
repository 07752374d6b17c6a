// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Process-wide generation counter shared between atlases.

use core::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing source of generation ids.
///
/// Every plot reset and every eviction draws a fresh value from the counter,
/// so a [`PlotLocator`](crate::PlotLocator) minted before a reset can never
/// compare equal to one minted after it. The counter is usually wrapped in an
/// [`Arc`](alloc::sync::Arc) and handed to every [`DrawAtlas`](crate::DrawAtlas)
/// that higher level caches want to observe together.
#[derive(Debug)]
pub struct GenerationCounter {
    generation: AtomicU64,
}

impl GenerationCounter {
    /// A generation value that is never handed out by [`next`](Self::next).
    pub const INVALID_GENERATION: u64 = 0;

    /// Creates a counter whose first [`next`](Self::next) call returns 1.
    pub const fn new() -> Self {
        Self {
            generation: AtomicU64::new(Self::INVALID_GENERATION + 1),
        }
    }

    /// Returns a fresh generation, strictly greater than every value returned before.
    pub fn next(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the value the next call to [`next`](Self::next) would produce.
    pub fn peek(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }
}

impl Default for GenerationCounter {
    fn default() -> Self {
        Self::new()
    }
}
