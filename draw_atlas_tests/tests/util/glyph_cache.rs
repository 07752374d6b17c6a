// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A minimal glyph cache that keeps its entries in sync with an atlas.

use std::cell::RefCell;
use std::rc::Rc;

use draw_atlas::{AtlasLocator, DrawAtlas, PlotLocator};
use foldhash::fast::FixedState;
use hashbrown::HashMap;

use super::FakeTexture;

/// Identifies one rasterized glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct GlyphKey {
    pub(crate) font_id: u32,
    pub(crate) glyph_id: u16,
    pub(crate) size_px: u16,
}

impl GlyphKey {
    pub(crate) fn new(glyph_id: u16) -> Self {
        Self {
            font_id: 0,
            glyph_id,
            size_px: 16,
        }
    }
}

/// Maps glyphs to their atlas location, dropping entries as plots are evicted.
#[derive(Debug, Default)]
pub(crate) struct GlyphCache {
    entries: HashMap<GlyphKey, AtlasLocator, FixedState>,
    purged: usize,
}

impl GlyphCache {
    /// Creates a cache and subscribes it to `atlas`'s evictions.
    pub(crate) fn attach(atlas: &mut DrawAtlas<FakeTexture>) -> Rc<RefCell<Self>> {
        let cache = Rc::new(RefCell::new(Self::default()));
        let listener = Rc::clone(&cache);
        atlas.add_eviction_callback(Box::new(move |plot: PlotLocator| {
            listener.borrow_mut().purge(plot);
        }));
        cache
    }

    pub(crate) fn insert(&mut self, key: GlyphKey, locator: AtlasLocator) {
        self.entries.insert(key, locator);
    }

    pub(crate) fn get(&self, key: &GlyphKey) -> Option<AtlasLocator> {
        self.entries.get(key).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries dropped because their plot was evicted.
    pub(crate) fn purged(&self) -> usize {
        self.purged
    }

    pub(crate) fn locators(&self) -> impl Iterator<Item = &AtlasLocator> + '_ {
        self.entries.values()
    }

    fn purge(&mut self, plot: PlotLocator) {
        let before = self.entries.len();
        self.entries
            .retain(|_, locator| locator.plot_locator() != plot);
        self.purged += before - self.entries.len();
    }
}
