// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The multi-page atlas: insertion, eviction, compaction and uploads.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};
use smallvec::SmallVec;

use crate::error::{AtlasError, AtlasErrorKind};
use crate::eviction::PlotEvictionCallback;
use crate::packer::{RectPacker, ShelfPacker};
use crate::page::Page;
use crate::upload::{TextureProvider, UploadRecorder};
use crate::{
    AtlasConfig, AtlasLocator, AtlasToken, CompactionPolicy, GenerationCounter, MaskFormat,
    PlotLocator, TokenTracker,
};

/// Upper bound on pages per atlas, matching common multitexture sampler limits.
pub const MAX_MULTITEXTURE_PAGES: u32 = 4;

/// Upper bound on plots per page, so that a page fits in a 32-bit use mask.
pub const MAX_PLOTS: u32 = 32;

/// Default padding added around every sub-image.
pub const DEFAULT_PADDING: u16 = 1;

/// Result of a sub-image insertion that did not fail outright.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum AddOutcome {
    /// The sub-image was stored at the given location.
    Succeeded(AtlasLocator),
    /// Every candidate plot is still read by unflushed work.
    ///
    /// Submit the pending draws (advancing the flush token) and retry.
    TryAgain,
}

impl AddOutcome {
    /// The locator, if the insertion succeeded.
    pub fn locator(self) -> Option<AtlasLocator> {
        match self {
            Self::Succeeded(locator) => Some(locator),
            Self::TryAgain => None,
        }
    }
}

/// Parameters for building a [`DrawAtlas`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasDescriptor {
    /// Pixel format of every page.
    pub format: MaskFormat,
    /// Page width in pixels; a multiple of `plot_width`.
    pub width: u16,
    /// Page height in pixels; a multiple of `plot_height`.
    pub height: u16,
    /// Plot width in pixels.
    pub plot_width: u16,
    /// Plot height in pixels.
    pub plot_height: u16,
    /// Most pages that may be active at once.
    pub max_pages: u32,
    /// Pixels of padding reserved on every side of each sub-image.
    pub padding: u16,
    /// Aging thresholds used by [`DrawAtlas::compact`].
    pub policy: CompactionPolicy,
}

impl AtlasDescriptor {
    /// Describes an atlas with the given page and plot sizes, the maximum
    /// page count and default padding and policy.
    pub fn new(
        format: MaskFormat,
        (width, height): (u16, u16),
        (plot_width, plot_height): (u16, u16),
    ) -> Self {
        Self {
            format,
            width,
            height,
            plot_width,
            plot_height,
            max_pages: MAX_MULTITEXTURE_PAGES,
            padding: DEFAULT_PADDING,
            policy: CompactionPolicy::default(),
        }
    }

    /// Describes an atlas sized by `config` for `format`.
    pub fn from_config(config: AtlasConfig, format: MaskFormat) -> Self {
        Self::new(
            format,
            config.atlas_dimensions(format),
            config.plot_dimensions(format),
        )
    }

    /// Sets the page budget.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Sets the padding around each sub-image.
    #[must_use]
    pub fn with_padding(mut self, padding: u16) -> Self {
        self.padding = padding;
        self
    }

    /// Sets the compaction policy.
    #[must_use]
    pub fn with_policy(mut self, policy: CompactionPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn validate(&self) -> Result<(u16, u16), AtlasError> {
        let invalid =
            || AtlasError::new(AtlasErrorKind::InvalidDimensions, self.width, self.height);
        if self.plot_width == 0 || self.plot_height == 0 || self.width == 0 || self.height == 0 {
            return Err(invalid());
        }
        if self.width % self.plot_width != 0 || self.height % self.plot_height != 0 {
            return Err(invalid());
        }
        let plots_x = self.width / self.plot_width;
        let plots_y = self.height / self.plot_height;
        if u32::from(plots_x) * u32::from(plots_y) > MAX_PLOTS {
            return Err(invalid());
        }
        if self.max_pages == 0 || self.max_pages > MAX_MULTITEXTURE_PAGES {
            return Err(AtlasError::new(
                AtlasErrorKind::InvalidPageCount,
                self.width,
                self.height,
            ));
        }
        Ok((plots_x, plots_y))
    }
}

/// Snapshot of an atlas's occupancy.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AtlasStats {
    /// Pages currently backed by a texture.
    pub active_pages: u32,
    /// Plots on active pages holding at least one sub-image.
    pub occupied_plots: u32,
    /// Plots on active pages with pixels not yet uploaded.
    pub dirty_plots: u32,
    /// Mean packer occupancy over the plots of active pages.
    pub mean_plot_occupancy: f32,
    /// The atlas generation.
    pub atlas_generation: u64,
}

/// Packs many small images into at most `max_pages` textures.
///
/// The atlas hands out [`AtlasLocator`]s for inserted pixels, keeps track of
/// which plots are read by in-flight draws through [`AtlasToken`]s, and, on
/// [`compact`](Self::compact), ages out idle plots and gives back trailing
/// pages. Pages are activated in index order and deactivated from the top.
///
/// `T` is the page texture type produced by the [`TextureProvider`]; `P` is
/// the per-plot rectangle packer.
pub struct DrawAtlas<T, P = ShelfPacker> {
    format: MaskFormat,
    width: u16,
    height: u16,
    plot_width: u16,
    plot_height: u16,
    padding: u16,
    plots_per_page: u32,
    max_pages: u32,
    num_active_pages: u32,
    pages: Vec<Page<T, P>>,
    generation_counter: Arc<GenerationCounter>,
    atlas_generation: u64,
    prev_flush_token: AtlasToken,
    flushes_since_last_use: u32,
    policy: CompactionPolicy,
    eviction_callbacks: Vec<Box<dyn PlotEvictionCallback>>,
}

impl<T> DrawAtlas<T, ShelfPacker> {
    /// Builds an atlas using the default shelf packer.
    ///
    /// Every plot of every page is created up front; textures are created as
    /// pages are activated.
    pub fn new(
        descriptor: AtlasDescriptor,
        generation_counter: Arc<GenerationCounter>,
    ) -> Result<Self, AtlasError> {
        Self::with_packer(descriptor, generation_counter)
    }
}

impl<T, P: RectPacker> DrawAtlas<T, P> {
    /// Builds an atlas whose plots use the packer `P`.
    pub fn with_packer(
        descriptor: AtlasDescriptor,
        generation_counter: Arc<GenerationCounter>,
    ) -> Result<Self, AtlasError> {
        let (plots_x, plots_y) = descriptor.validate()?;
        let bytes_per_pixel = descriptor.format.bytes_per_pixel();
        let pages = (0..descriptor.max_pages)
            .map(|page_index| {
                Page::new(
                    page_index,
                    plots_x,
                    plots_y,
                    descriptor.plot_width,
                    descriptor.plot_height,
                    bytes_per_pixel,
                    &generation_counter,
                )
            })
            .collect();
        let atlas_generation = generation_counter.next();

        Ok(Self {
            format: descriptor.format,
            width: descriptor.width,
            height: descriptor.height,
            plot_width: descriptor.plot_width,
            plot_height: descriptor.plot_height,
            padding: descriptor.padding,
            plots_per_page: u32::from(plots_x) * u32::from(plots_y),
            max_pages: descriptor.max_pages,
            num_active_pages: 0,
            pages,
            generation_counter,
            atlas_generation,
            prev_flush_token: AtlasToken::INVALID.next(),
            flushes_since_last_use: 0,
            policy: descriptor.policy,
            eviction_callbacks: Vec::new(),
        })
    }

    /// Registers an observer for plot evictions.
    ///
    /// Callbacks run in registration order.
    pub fn add_eviction_callback(&mut self, callback: Box<dyn PlotEvictionCallback>) {
        self.eviction_callbacks.push(callback);
    }

    /// Stores a `width` x `height` sub-image and returns where it landed.
    ///
    /// `pixels` holds tightly packed rows in the atlas's format. Lower pages
    /// are always preferred, both for fresh space and for eviction, so that
    /// the highest page drains and can be deactivated by [`compact`](Self::compact).
    ///
    /// Returns [`AddOutcome::TryAgain`] when every page is in use and the
    /// least recently used plot of each is still read by a draw that has not
    /// been flushed (its last use is not before `tokens.next_flush_token()`).
    pub fn add_to_atlas<Tp>(
        &mut self,
        provider: &mut Tp,
        tokens: &TokenTracker,
        width: u16,
        height: u16,
        pixels: &[u8],
    ) -> Result<AddOutcome, AtlasError>
    where
        Tp: TextureProvider<Texture = T> + ?Sized,
    {
        let padding = u32::from(self.padding) * 2;
        if u32::from(width) + padding > u32::from(self.plot_width)
            || u32::from(height) + padding > u32::from(self.plot_height)
        {
            return Err(AtlasError::new(AtlasErrorKind::TooLarge, width, height));
        }
        let required = usize::from(width)
            * usize::from(height)
            * usize::from(self.format.bytes_per_pixel());
        if pixels.len() < required {
            return Err(AtlasError::new(
                AtlasErrorKind::PixelDataTooShort,
                width,
                height,
            ));
        }

        for page_index in 0..self.num_active_pages as usize {
            if let Some(locator) = self.upload_to_page(page_index, width, height, pixels) {
                return Ok(AddOutcome::Succeeded(locator));
            }
        }

        if self.num_active_pages == self.max_pages {
            // Only plots that no pending draw reads may be recycled.
            let flush_token = tokens.next_flush_token();
            for page_index in 0..self.num_active_pages as usize {
                let Some(tail) = self.pages[page_index].plot_list.tail() else {
                    continue;
                };
                let plot_index = usize::from(tail);
                if self.pages[page_index].plots[plot_index].last_use_token() >= flush_token {
                    continue;
                }
                self.evict_plot(page_index, plot_index);
                let page = &mut self.pages[page_index];
                if let Some(locator) =
                    page.plots[plot_index].try_add_sub_image(width, height, pixels, self.padding)
                {
                    page.plot_list.make_mru(tail);
                    return Ok(AddOutcome::Succeeded(locator));
                }
            }
            return Ok(AddOutcome::TryAgain);
        }

        self.activate_new_page(provider)?;
        let page_index = self.num_active_pages as usize - 1;
        match self.upload_to_page(page_index, width, height, pixels) {
            Some(locator) => Ok(AddOutcome::Succeeded(locator)),
            None => Err(AtlasError::new(AtlasErrorKind::TooLarge, width, height)),
        }
    }

    fn upload_to_page(
        &mut self,
        page_index: usize,
        width: u16,
        height: u16,
        pixels: &[u8],
    ) -> Option<AtlasLocator> {
        let page = &mut self.pages[page_index];
        for plot_index in page.plot_list.order() {
            if let Some(locator) = page.plots[usize::from(plot_index)].try_add_sub_image(
                width,
                height,
                pixels,
                self.padding,
            ) {
                page.plot_list.make_mru(plot_index);
                return Some(locator);
            }
        }
        None
    }

    fn activate_new_page<Tp>(&mut self, provider: &mut Tp) -> Result<(), AtlasError>
    where
        Tp: TextureProvider<Texture = T> + ?Sized,
    {
        let page_index = self.num_active_pages as usize;
        let Some(texture) = provider.allocate(self.width, self.height, self.format) else {
            log::debug!(
                "failed to allocate {}x{} {:?} texture for atlas page {page_index}",
                self.width,
                self.height,
                self.format
            );
            return Err(AtlasError::new(
                AtlasErrorKind::TextureAllocationFailed,
                self.width,
                self.height,
            ));
        };
        self.pages[page_index].texture = Some(texture);
        self.num_active_pages += 1;
        log::debug!(
            "activated {:?} atlas page {page_index} ({} active)",
            self.format,
            self.num_active_pages
        );
        Ok(())
    }

    fn deactivate_last_page(&mut self) {
        let Some(last) = self.num_active_pages.checked_sub(1) else {
            return;
        };
        self.pages[last as usize].deactivate(&self.generation_counter);
        self.num_active_pages = last;
        log::debug!(
            "deactivated {:?} atlas page {last} ({last} active)",
            self.format
        );
    }

    /// Notifies listeners, then gives the plot and the atlas new generations.
    fn evict_plot(&mut self, page_index: usize, plot_index: usize) {
        let locator = self.pages[page_index].plots[plot_index].plot_locator();
        log::trace!("evicting plot {locator:?}");
        for callback in &mut self.eviction_callbacks {
            callback.evict(locator);
        }
        self.atlas_generation = self.generation_counter.next();
        self.pages[page_index].plots[plot_index].reset_rects(&self.generation_counter, false);
    }

    /// Returns true if `locator` still names the content of a plot on an
    /// active page.
    pub fn has_id(&self, locator: PlotLocator) -> bool {
        if !locator.is_valid() || locator.page_index() >= self.num_active_pages {
            return false;
        }
        self.pages[locator.page_index() as usize]
            .plots
            .get(locator.plot_index() as usize)
            .is_some_and(|plot| plot.generation() == locator.generation())
    }

    /// Records that a draw with `token` reads the sub-image at `locator`.
    ///
    /// Moves the plot to the front of its page's recency order. Stale
    /// locators are ignored, as are tokens older than the plot's current one.
    pub fn set_last_use_token(&mut self, locator: &AtlasLocator, token: AtlasToken) {
        self.mark_used(locator.plot_locator(), token);
    }

    /// Applies `token` to every plot collected in `updater`.
    pub fn set_last_use_token_bulk(&mut self, updater: &BulkUsePlotUpdater, token: AtlasToken) {
        for &locator in updater.plots() {
            self.mark_used(locator, token);
        }
    }

    fn mark_used(&mut self, locator: PlotLocator, token: AtlasToken) {
        if !self.has_id(locator) {
            return;
        }
        let page = &mut self.pages[locator.page_index() as usize];
        let plot_index = locator.plot_index() as usize;
        page.plots[plot_index].set_last_use_token(token);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "plot indices are below MAX_PLOTS"
        )]
        let list_index = plot_index as u8;
        page.plot_list.make_mru(list_index);
    }

    /// Ages plots at a flush boundary and gives back the highest page when it
    /// is no longer needed.
    ///
    /// `start_token_for_next_flush` is the first token that belongs to the
    /// next flush; the plots whose last use falls in
    /// `[previous call's token, start_token_for_next_flush)` count as used in
    /// the flush that just finished.
    pub fn compact(&mut self, start_token_for_next_flush: AtlasToken) {
        if self.num_active_pages == 0 {
            self.prev_flush_token = start_token_for_next_flush;
            return;
        }

        let prev_flush_token = self.prev_flush_token;
        let active = self.num_active_pages as usize;
        let mut atlas_used_this_flush = false;
        for page in &mut self.pages[..active] {
            for plot in &mut page.plots {
                if plot
                    .last_use_token()
                    .in_interval(prev_flush_token, start_token_for_next_flush)
                {
                    plot.reset_flushes_since_last_used();
                    atlas_used_this_flush = true;
                } else {
                    plot.inc_flushes_since_last_used();
                }
            }
        }

        if atlas_used_this_flush {
            self.flushes_since_last_use = 0;
        } else {
            self.flushes_since_last_use = self.flushes_since_last_use.saturating_add(1);
        }

        // A briefly idle atlas (think of a blinking cursor) is left alone.
        if atlas_used_this_flush
            || self.flushes_since_last_use > self.policy.atlas_recently_used_count
        {
            self.compact_pages();
        }

        self.prev_flush_token = start_token_for_next_flush;
    }

    fn compact_pages(&mut self) {
        let recently_used = self.policy.plot_recently_used_count;
        let last_page = self.num_active_pages as usize - 1;

        // Idle plots on lower pages can take over what still lives on the last page.
        let mut available: SmallVec<[(usize, usize); 32]> = SmallVec::new();
        for (page_index, page) in self.pages[..last_page].iter().enumerate() {
            for plot_index in page.plot_list.iter() {
                let plot_index = usize::from(plot_index);
                if page.plots[plot_index].flushes_since_last_used() > recently_used {
                    available.push((page_index, plot_index));
                }
            }
        }

        let order = self.pages[last_page].plot_list.order();
        let mut used_plots = 0_u32;
        for &plot_index in &order {
            let plot = &self.pages[last_page].plots[usize::from(plot_index)];
            if plot.flushes_since_last_used() <= recently_used {
                used_plots += 1;
            } else if plot.is_occupied() {
                self.evict_plot(last_page, usize::from(plot_index));
            }
        }

        let drain_limit = self.plots_per_page / self.policy.last_page_drain_divisor.max(1);
        if used_plots > 0 && used_plots <= drain_limit && !available.is_empty() {
            for &plot_index in &order {
                let plot_index = usize::from(plot_index);
                if self.pages[last_page].plots[plot_index].flushes_since_last_used() > recently_used
                {
                    continue;
                }
                let Some((page_index, available_index)) = available.pop() else {
                    break;
                };
                self.evict_plot(last_page, plot_index);
                self.evict_plot(page_index, available_index);
                used_plots -= 1;
                if used_plots == 0 {
                    break;
                }
            }
        }

        if used_plots == 0 {
            self.deactivate_last_page();
            self.flushes_since_last_use = 0;
        }
    }

    /// Evicts every plot on every active page, notifying listeners for each.
    ///
    /// Pages stay active; use this when the device reports memory pressure.
    pub fn evict_all_plots(&mut self) {
        for page_index in 0..self.num_active_pages as usize {
            for plot_index in 0..self.pages[page_index].plots.len() {
                self.evict_plot(page_index, plot_index);
            }
        }
    }

    /// Hands every dirty plot region to `recorder`.
    ///
    /// Each region is reported once; calling again without new insertions
    /// records nothing. Returns false as soon as the recorder refuses an upload.
    /// A refused region stays pending and is offered again on the next call.
    pub fn record_uploads<R>(&mut self, recorder: &mut R) -> bool
    where
        R: UploadRecorder<T> + ?Sized,
    {
        for page in &mut self.pages[..self.num_active_pages as usize] {
            let Some(texture) = page.texture.as_ref() else {
                continue;
            };
            for plot_index in page.plot_list.order() {
                let plot = &mut page.plots[usize::from(plot_index)];
                if !plot.needs_upload() {
                    continue;
                }
                let row_stride = plot.upload_row_stride();
                let (pixels, dst) = plot.prepare_for_upload();
                if dst.is_empty() {
                    continue;
                }
                log::trace!("uploading {dst:?} to {:?} atlas", self.format);
                if !recorder.record_upload(texture, pixels, row_stride, dst) {
                    log::debug!("upload of {dst:?} refused, keeping it pending");
                    return false;
                }
                plot.mark_uploaded();
            }
        }
        true
    }

    /// Number of pages currently backed by a texture.
    #[inline]
    pub fn num_active_pages(&self) -> u32 {
        self.num_active_pages
    }

    /// Largest number of pages this atlas may activate.
    #[inline]
    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Changes whenever any plot of this atlas is evicted.
    #[inline]
    pub fn atlas_generation(&self) -> u64 {
        self.atlas_generation
    }

    /// The counter shared with other atlases.
    pub fn generation_counter(&self) -> &Arc<GenerationCounter> {
        &self.generation_counter
    }

    /// Pixel format of every page.
    #[inline]
    pub fn format(&self) -> MaskFormat {
        self.format
    }

    /// Page dimensions in pixels.
    #[inline]
    pub fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Plot dimensions in pixels.
    #[inline]
    pub fn plot_dimensions(&self) -> (u16, u16) {
        (self.plot_width, self.plot_height)
    }

    /// Number of plots on each page.
    #[inline]
    pub fn plots_per_page(&self) -> u32 {
        self.plots_per_page
    }

    /// The texture backing page `page_index`, if that page is active.
    pub fn texture(&self, page_index: u32) -> Option<&T> {
        self.pages
            .get(page_index as usize)
            .and_then(|page| page.texture.as_ref())
    }

    /// How many consecutive [`compact`](Self::compact) calls found the plot
    /// unused, or `None` if `locator` is stale.
    pub fn flushes_since_last_used(&self, locator: PlotLocator) -> Option<u32> {
        if !self.has_id(locator) {
            return None;
        }
        Some(
            self.pages[locator.page_index() as usize].plots[locator.plot_index() as usize]
                .flushes_since_last_used(),
        )
    }

    /// Collects occupancy figures over the active pages.
    pub fn stats(&self) -> AtlasStats {
        let mut stats = AtlasStats {
            active_pages: self.num_active_pages,
            atlas_generation: self.atlas_generation,
            ..AtlasStats::default()
        };
        let mut occupancy_sum = 0.0;
        let mut plot_count = 0.0_f32;
        for page in self.pages.iter().filter(|page| page.is_active()) {
            for plot in &page.plots {
                plot_count += 1.0;
                occupancy_sum += plot.occupancy();
                stats.occupied_plots += u32::from(plot.is_occupied());
                stats.dirty_plots += u32::from(plot.needs_upload());
            }
        }
        if plot_count > 0.0 {
            stats.mean_plot_occupancy = occupancy_sum / plot_count;
        }
        stats
    }
}

impl<T, P> Debug for DrawAtlas<T, P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DrawAtlas")
            .field("format", &self.format)
            .field("dimensions", &(self.width, self.height))
            .field("plot_dimensions", &(self.plot_width, self.plot_height))
            .field("num_active_pages", &self.num_active_pages)
            .field("max_pages", &self.max_pages)
            .field("atlas_generation", &self.atlas_generation)
            .field("eviction_callbacks", &self.eviction_callbacks.len())
            .finish_non_exhaustive()
    }
}

/// Collects the distinct plots read by one draw.
///
/// A draw that references many sub-images usually hits the same few plots;
/// the updater records each plot once so that
/// [`DrawAtlas::set_last_use_token_bulk`] touches it once.
#[derive(Clone, Debug, Default)]
pub struct BulkUsePlotUpdater {
    plots: SmallVec<[PlotLocator; 4]>,
    already_updated: [u32; MAX_MULTITEXTURE_PAGES as usize],
}

impl BulkUsePlotUpdater {
    /// Creates an empty updater.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the plot holding `locator`. Returns false if it was already added.
    pub fn add(&mut self, locator: &AtlasLocator) -> bool {
        let page_index = locator.page_index() as usize;
        let plot_index = locator.plot_index();
        let Some(mask) = self.already_updated.get_mut(page_index) else {
            return false;
        };
        if plot_index >= MAX_PLOTS {
            return false;
        }
        let bit = 1_u32 << plot_index;
        if *mask & bit != 0 {
            return false;
        }
        *mask |= bit;
        self.plots.push(locator.plot_locator());
        true
    }

    /// The plots collected so far.
    pub fn plots(&self) -> &[PlotLocator] {
        &self.plots
    }

    /// Number of distinct plots collected.
    pub fn count(&self) -> usize {
        self.plots.len()
    }

    /// Forgets every plot.
    pub fn reset(&mut self) {
        self.plots.clear();
        self.already_updated = [0; MAX_MULTITEXTURE_PAGES as usize];
    }
}
