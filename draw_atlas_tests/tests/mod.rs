// Copyright 2025 the Draw Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate contains the integration test suite for `draw_atlas`.
//!
//! - The `util` module contains the fakes shared by different tests: a texture
//!   provider, an upload recorder and a small glyph cache layered on the atlas.
//! - We do not use the default Rust test harness, but instead use this `mod.rs` file as the
//!   entry point to run all other tests, so that the shared fakes are compiled once.
//! - If you want to add new tests, put them into the module for their topic
//!   (insertion, eviction, compaction, uploads, config), or create a new one.
//! - For test naming, put the topic at the start of the name, e.g.
//!   `compaction_idle_count` rather than `idle_count_compaction`.

#![allow(missing_docs, reason = "we don't need docs for testing")]
#![allow(clippy::cast_possible_truncation, reason = "not critical for testing")]

mod util;
