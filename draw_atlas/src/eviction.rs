// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Eviction notification for caches layered on top of an atlas.

use crate::PlotLocator;

/// Observer told about every plot the atlas evicts.
///
/// Callbacks run synchronously, before the plot's generation changes, so
/// `locator` still matches the locators handed out for the evicted content.
/// Implementations must not fail; they typically drop their own entries whose
/// [`AtlasLocator::plot_locator`](crate::AtlasLocator::plot_locator) equals
/// `locator`.
pub trait PlotEvictionCallback {
    /// Called once per evicted plot.
    fn evict(&mut self, locator: PlotLocator);
}

impl<F: FnMut(PlotLocator)> PlotEvictionCallback for F {
    fn evict(&mut self, locator: PlotLocator) {
        self(locator);
    }
}
