// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An atlas bundled with the state a frame-building layer keeps around it.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use draw_atlas::{
    AddOutcome, AtlasDescriptor, AtlasError, AtlasLocator, AtlasToken, DrawAtlas,
    GenerationCounter, MaskFormat, PlotLocator, TokenTracker,
};

use super::{FakeTexture, FakeTextures, coverage_image};

pub(crate) struct TestAtlas {
    pub(crate) atlas: DrawAtlas<FakeTexture>,
    pub(crate) textures: FakeTextures,
    pub(crate) tokens: TokenTracker,
    /// Every plot reported to the eviction listener, in order.
    pub(crate) evicted: Rc<RefCell<Vec<PlotLocator>>>,
}

impl TestAtlas {
    pub(crate) fn new(descriptor: AtlasDescriptor) -> Self {
        Self::with_counter(descriptor, Arc::new(GenerationCounter::new()))
    }

    pub(crate) fn with_counter(
        descriptor: AtlasDescriptor,
        counter: Arc<GenerationCounter>,
    ) -> Self {
        let mut atlas = DrawAtlas::new(descriptor, counter).unwrap();
        let evicted: Rc<RefCell<Vec<PlotLocator>>> = Rc::default();
        let sink = Rc::clone(&evicted);
        atlas.add_eviction_callback(Box::new(move |plot: PlotLocator| {
            sink.borrow_mut().push(plot);
        }));
        Self {
            atlas,
            textures: FakeTextures::default(),
            tokens: TokenTracker::new(),
            evicted,
        }
    }

    /// Two pages of 2x2 unpadded 32px coverage plots.
    pub(crate) fn small() -> Self {
        Self::new(
            AtlasDescriptor::new(MaskFormat::A8, (64, 64), (32, 32))
                .with_max_pages(2)
                .with_padding(0),
        )
    }

    pub(crate) fn try_add(&mut self, width: u16, height: u16) -> Result<AddOutcome, AtlasError> {
        let pixels = coverage_image(width, height);
        self.add_pixels(width, height, &pixels)
    }

    pub(crate) fn add_pixels(
        &mut self,
        width: u16,
        height: u16,
        pixels: &[u8],
    ) -> Result<AddOutcome, AtlasError> {
        self.atlas
            .add_to_atlas(&mut self.textures, &self.tokens, width, height, pixels)
    }

    pub(crate) fn add(&mut self, width: u16, height: u16) -> AddOutcome {
        self.try_add(width, height).unwrap()
    }

    /// Inserts a coverage image that is expected to fit.
    pub(crate) fn insert(&mut self, width: u16, height: u16) -> AtlasLocator {
        match self.add(width, height) {
            AddOutcome::Succeeded(locator) => locator,
            AddOutcome::TryAgain => panic!("{width}x{height} insert asked to try again"),
        }
    }

    /// Records a draw that samples every locator in `locators`.
    pub(crate) fn draw(&mut self, locators: &[AtlasLocator]) -> AtlasToken {
        let token = self.tokens.issue_draw_token();
        for locator in locators {
            self.atlas.set_last_use_token(locator, token);
        }
        token
    }

    /// Executes everything recorded so far and compacts.
    pub(crate) fn flush(&mut self) {
        self.tokens.flush_all();
        self.atlas.compact(self.tokens.next_draw_token());
    }

    pub(crate) fn is_live(&self, locator: &AtlasLocator) -> bool {
        self.atlas.has_id(locator.plot_locator())
    }

    pub(crate) fn evicted_count(&self) -> usize {
        self.evicted.borrow().len()
    }
}
