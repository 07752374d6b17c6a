// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Submission-ordering tokens.

/// An opaque, totally ordered marker of GPU submission progress.
///
/// Tokens are issued by a [`TokenTracker`] in draw-recording order. A plot
/// remembers the latest token of any draw that samples it; as long as that
/// token has not been flushed, the plot's pixels are still needed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AtlasToken(u64);

impl AtlasToken {
    /// A token that precedes every issued token.
    pub const INVALID: Self = Self(0);

    /// Creates a token from its raw sequence number.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw sequence number.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns the token issued immediately after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns true if `start <= self < end`.
    pub fn in_interval(self, start: Self, end: Self) -> bool {
        start <= self && self < end
    }
}

/// Issues draw tokens and tracks how far execution has progressed.
///
/// The frame-building layer owns one tracker. It calls
/// [`issue_draw_token`](Self::issue_draw_token) each time it records a draw
/// and [`flush_token`](Self::flush_token) each time a recorded draw executes.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenTracker {
    last_issued: AtlasToken,
    last_flushed: AtlasToken,
}

impl TokenTracker {
    /// Creates a tracker that has issued nothing.
    pub const fn new() -> Self {
        Self {
            last_issued: AtlasToken::INVALID,
            last_flushed: AtlasToken::INVALID,
        }
    }

    /// The token the next recorded draw will carry.
    pub fn next_draw_token(&self) -> AtlasToken {
        self.last_issued.next()
    }

    /// One past the last token whose draw has executed.
    ///
    /// Anything strictly before this token is no longer read by pending work.
    pub fn next_flush_token(&self) -> AtlasToken {
        self.last_flushed.next()
    }

    /// Records a draw and returns its token.
    pub fn issue_draw_token(&mut self) -> AtlasToken {
        self.last_issued = self.last_issued.next();
        self.last_issued
    }

    /// Marks the next recorded draw as executed and returns its token.
    pub fn flush_token(&mut self) -> AtlasToken {
        self.last_flushed = self.last_flushed.next();
        self.last_flushed
    }

    /// Marks every recorded draw as executed.
    pub fn flush_all(&mut self) {
        self.last_flushed = self.last_issued;
    }
}
