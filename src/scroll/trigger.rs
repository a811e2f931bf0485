// src/scroll/trigger.rs
// =============================================================================
// Calls "load more" when the end of a scrolling list comes into view.
//
// How it works:
// 1. attach() places a marker at the end of the content (in whatever unit
//    the front end measures rows in)
// 2. Every time the view scrolls, the front end calls observe() with the
//    visible range
// 3. If the marker is within `threshold` units of that range, we are
//    "near the end". Entering that zone fires the callback once; staying
//    in it does not fire again
// 4. After firing, the trigger waits: nothing fires again until the front
//    end re-attaches with new flags (a load started or finished, or another
//    page arrived) or the content grew
//
// The callback never fires while a load is running or when the list is
// known to be complete.
//
// Rust concepts:
// - Generic closures: ScrollTrigger<F: FnMut()> stores the callback inline
// - Drop: Detaching automatically when the trigger goes out of scope
// =============================================================================

use tracing::{debug, trace};

// Default "how close is close" distance
pub const DEFAULT_THRESHOLD: u32 = 200;

// What the list knows about further pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadFlags {
    pub has_more: bool,
    pub loading: bool,
    /// Last page loaded; a new page re-arms the trigger even when it added
    /// no rows
    pub page: u32,
}

impl LoadFlags {
    fn allow_load(self) -> bool {
        self.has_more && !self.loading
    }
}

// The visible part of the list: [offset, offset + height)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub offset: u32,
    pub height: u32,
}

// Sits at the very end of the content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Marker {
    position: u32,
}

pub struct ScrollTrigger<F: FnMut()> {
    threshold: u32,
    on_load_more: F,
    marker: Option<Marker>,
    flags: LoadFlags,
    /// The last observation found the marker inside the zone
    in_zone: bool,
    /// Fired and waiting for the list to change
    pending: bool,
}

impl<F: FnMut()> ScrollTrigger<F> {
    // Creates a detached trigger; call attach() once the list exists
    pub fn new(on_load_more: F) -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            on_load_more,
            marker: None,
            flags: LoadFlags::default(),
            in_zone: false,
            pending: false,
        }
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    // Puts a fresh marker at `content_end` and starts observing from scratch
    //
    // If the marker is already in view, the next observe() counts as a new
    // crossing.
    pub fn attach(&mut self, content_end: u32, flags: LoadFlags) {
        trace!(content_end, ?flags, "marker attached");
        self.marker = Some(Marker {
            position: content_end,
        });
        self.flags = flags;
        self.in_zone = false;
        self.pending = false;
    }

    // Re-attaches only if the list end or its flags moved since last time
    pub fn sync(&mut self, content_end: u32, flags: LoadFlags) {
        let moved = self.marker.map(|marker| marker.position) != Some(content_end);
        if moved || flags != self.flags {
            self.attach(content_end, flags);
        }
    }

    // Removes the marker; observe() is a no-op until the next attach()
    pub fn detach(&mut self) {
        if self.marker.take().is_some() {
            debug!("scroll trigger detached");
        }
        self.in_zone = false;
        self.pending = false;
    }

    // Feeds the current visible range; returns true if the callback fired
    pub fn observe(&mut self, viewport: Viewport) -> bool {
        let Some(marker) = self.marker else {
            return false;
        };

        let near = self.is_near(marker, viewport);
        let entered = near && !self.in_zone;
        self.in_zone = near;
        if !entered || self.pending || !self.flags.allow_load() {
            return false;
        }

        debug!(marker = marker.position, offset = viewport.offset, "end of list in reach");
        self.pending = true;
        (self.on_load_more)();
        true
    }

    // The marker counts as near if it lies within `threshold` of the
    // visible range on either side
    fn is_near(&self, marker: Marker, viewport: Viewport) -> bool {
        let top = viewport.offset.saturating_sub(self.threshold);
        let bottom = viewport
            .offset
            .saturating_add(viewport.height)
            .saturating_add(self.threshold);
        (top..=bottom).contains(&marker.position)
    }
}

impl<F: FnMut()> Drop for ScrollTrigger<F> {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const READY: LoadFlags = LoadFlags {
        has_more: true,
        loading: false,
        page: 1,
    };

    fn view(offset: u32) -> Viewport {
        Viewport {
            offset,
            height: 400,
        }
    }

    #[test]
    fn test_fires_once_per_crossing() {
        let calls = Cell::new(0);
        let mut trigger = ScrollTrigger::new(|| calls.set(calls.get() + 1));
        trigger.attach(2000, READY);

        assert!(!trigger.observe(view(0)), "far from the end");
        assert!(trigger.observe(view(1500)), "within 200 of the end");
        assert!(!trigger.observe(view(1550)), "still inside the zone");
        drop(trigger);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_second_crossing_before_load_resolves_does_not_fire() {
        let calls = Cell::new(0);
        let mut trigger = ScrollTrigger::new(|| calls.set(calls.get() + 1));
        trigger.attach(2000, READY);

        trigger.observe(view(1500));
        trigger.observe(view(0));
        trigger.observe(view(1500));
        drop(trigger);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_new_content_rearms() {
        let calls = Cell::new(0);
        let mut trigger = ScrollTrigger::new(|| calls.set(calls.get() + 1));
        trigger.attach(2000, READY);
        trigger.observe(view(1500));

        // load started, then finished with more rows
        trigger.sync(2000, LoadFlags { loading: true, ..READY });
        assert!(!trigger.observe(view(1500)));
        trigger.sync(4000, LoadFlags { page: 2, ..READY });
        assert!(!trigger.observe(view(1500)), "end moved out of reach");
        assert!(trigger.observe(view(3500)));
        drop(trigger);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_marker_already_in_view_fires_after_attach() {
        let calls = Cell::new(0);
        let mut trigger = ScrollTrigger::new(|| calls.set(calls.get() + 1));
        // short list: the end is visible right away
        trigger.attach(300, READY);
        assert!(trigger.observe(view(0)));
        drop(trigger);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_never_fires_without_more_or_while_loading() {
        let calls = Cell::new(0);
        let mut trigger = ScrollTrigger::new(|| calls.set(calls.get() + 1));

        trigger.attach(2000, LoadFlags { has_more: false, ..READY });
        assert!(!trigger.observe(view(1500)));

        trigger.attach(2000, LoadFlags { loading: true, ..READY });
        assert!(!trigger.observe(view(1500)));
        drop(trigger);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_sync_without_changes_keeps_pending() {
        let calls = Cell::new(0);
        let mut trigger = ScrollTrigger::new(|| calls.set(calls.get() + 1));
        trigger.attach(2000, READY);
        trigger.observe(view(1500));

        trigger.sync(2000, READY);
        trigger.observe(view(0));
        assert!(!trigger.observe(view(1500)));
        drop(trigger);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_page_without_new_rows_rearms() {
        let calls = Cell::new(0);
        let mut trigger = ScrollTrigger::new(|| calls.set(calls.get() + 1));
        trigger.attach(400, READY);
        assert!(trigger.observe(view(0)));

        // a cached page of duplicates: same end, same has_more, next page
        trigger.sync(400, LoadFlags { page: 2, ..READY });
        assert!(trigger.observe(view(0)));
        drop(trigger);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_custom_threshold() {
        let calls = Cell::new(0);
        let mut trigger = ScrollTrigger::new(|| calls.set(calls.get() + 1)).with_threshold(0);
        trigger.attach(2000, READY);
        assert!(!trigger.observe(view(1500)), "100 short of the end");
        assert!(trigger.observe(view(1600)));
        drop(trigger);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_detached_trigger_is_inert() {
        let calls = Cell::new(0);
        let mut trigger = ScrollTrigger::new(|| calls.set(calls.get() + 1));
        assert!(!trigger.observe(view(0)));

        trigger.attach(300, READY);
        trigger.detach();
        assert!(trigger.marker.is_none());
        assert!(!trigger.observe(view(0)));
        drop(trigger);
        assert_eq!(calls.get(), 0);
    }
}
