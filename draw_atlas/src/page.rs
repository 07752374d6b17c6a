// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pages: one texture's worth of plots, with their recency order.

use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};
use smallvec::SmallVec;

use crate::GenerationCounter;
use crate::packer::RectPacker;
use crate::plot::Plot;

#[derive(Clone, Copy, Debug, Default)]
struct Link {
    prev: Option<u8>,
    next: Option<u8>,
}

/// Most-recently-used order over the plots of one page.
///
/// An intrusive doubly linked list stored as prev/next indices, so plots can
/// be moved to the front in O(1) without the list owning them.
#[derive(Clone, Debug, Default)]
pub(crate) struct PlotList {
    head: Option<u8>,
    tail: Option<u8>,
    links: SmallVec<[Link; 32]>,
}

impl PlotList {
    /// Creates a list over `count` plots ordered `0, 1, ..., count - 1` from head to tail.
    pub(crate) fn new(count: u8) -> Self {
        let mut list = Self {
            head: None,
            tail: None,
            links: SmallVec::from_elem(Link::default(), usize::from(count)),
        };
        for index in 0..count {
            list.push_back(index);
        }
        list
    }

    fn push_back(&mut self, index: u8) {
        self.links[usize::from(index)] = Link {
            prev: self.tail,
            next: None,
        };
        match self.tail {
            Some(tail) => self.links[usize::from(tail)].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
    }

    fn unlink(&mut self, index: u8) {
        let Link { prev, next } = self.links[usize::from(index)];
        match prev {
            Some(prev) => self.links[usize::from(prev)].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.links[usize::from(next)].prev = prev,
            None => self.tail = prev,
        }
        self.links[usize::from(index)] = Link::default();
    }

    /// Moves `index` to the head of the list.
    pub(crate) fn make_mru(&mut self, index: u8) {
        if self.head == Some(index) {
            return;
        }
        self.unlink(index);
        self.links[usize::from(index)].next = self.head;
        if let Some(head) = self.head {
            self.links[usize::from(head)].prev = Some(index);
        }
        self.head = Some(index);
        if self.tail.is_none() {
            self.tail = Some(index);
        }
    }

    /// The least recently used plot.
    #[inline]
    pub(crate) fn tail(&self) -> Option<u8> {
        self.tail
    }

    /// Iterates from most to least recently used.
    pub(crate) fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        core::iter::successors(self.head, |&index| self.links[usize::from(index)].next)
    }

    /// Snapshot of the current order, for loops that mutate plots.
    pub(crate) fn order(&self) -> SmallVec<[u8; 32]> {
        self.iter().collect()
    }
}

/// A set of plots sharing one backing texture.
///
/// Plots exist for the lifetime of the atlas; the texture exists only while
/// the page is active.
pub(crate) struct Page<T, P> {
    pub(crate) plots: Vec<Plot<P>>,
    pub(crate) plot_list: PlotList,
    pub(crate) texture: Option<T>,
}

impl<T, P: RectPacker> Page<T, P> {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "a page holds at most MAX_PLOTS plots"
    )]
    pub(crate) fn new(
        page_index: u32,
        plots_x: u16,
        plots_y: u16,
        plot_width: u16,
        plot_height: u16,
        bytes_per_pixel: u8,
        counter: &GenerationCounter,
    ) -> Self {
        let mut plots = Vec::with_capacity(usize::from(plots_x) * usize::from(plots_y));
        for row in 0..plots_y {
            for column in 0..plots_x {
                let plot_index = u32::from(row) * u32::from(plots_x) + u32::from(column);
                plots.push(Plot::new(
                    page_index,
                    plot_index,
                    [column * plot_width, row * plot_height],
                    plot_width,
                    plot_height,
                    bytes_per_pixel,
                    counter,
                ));
            }
        }
        let plot_list = PlotList::new(plots.len() as u8);
        Self {
            plots,
            plot_list,
            texture: None,
        }
    }

    /// Resets every plot, frees their pixels and drops the texture.
    pub(crate) fn deactivate(&mut self, counter: &GenerationCounter) {
        for plot in &mut self.plots {
            plot.reset_rects(counter, true);
            plot.reset_flushes_since_last_used();
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "a page holds at most MAX_PLOTS plots"
        )]
        let count = self.plots.len() as u8;
        self.plot_list = PlotList::new(count);
        self.texture = None;
    }

    #[inline]
    pub(crate) fn is_active(&self) -> bool {
        self.texture.is_some()
    }
}

impl<T, P> Debug for Page<T, P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Page")
            .field("plots", &self.plots)
            .field("mru", &self.plot_list.order())
            .field("has_texture", &self.texture.is_some())
            .finish()
    }
}
