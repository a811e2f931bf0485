// src/scroll/mod.rs
// =============================================================================
// This module decides when a scrolling list should ask for more rows.
//
// The front end reports what is visible; the trigger compares that with
// the end of the content and calls a "load more" callback, once per
// approach, only while more data exists and nothing is loading.
// =============================================================================

mod trigger;

pub use trigger::{LoadFlags, ScrollTrigger, Viewport, DEFAULT_THRESHOLD};
