use core::num::NonZeroU32;

use crate::geometry::{self, DEFAULT_CROSSING_MULTIPLIER, DEFAULT_OVERSCAN};
use crate::RecycleError;

/// Inclusive range of logical indices currently materialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowBounds {
    pub start_index: usize,
    pub end_index: usize, // inclusive
}

impl WindowBounds {
    /// Number of indices in the window; never zero.
    pub fn count(&self) -> usize {
        self.end_index - self.start_index + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start_index..=self.end_index).contains(&index)
    }
}

/// Tuning for [`WindowState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowOptions {
    /// Slots added to the exact viewport fit to avoid pop-in during fast scroll.
    pub overscan: usize,
    /// Scroll distance, in item extents, that shifts the window by one item.
    pub crossing_multiplier: u32,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            overscan: DEFAULT_OVERSCAN,
            crossing_multiplier: DEFAULT_CROSSING_MULTIPLIER,
        }
    }
}

impl WindowOptions {
    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_crossing_multiplier(mut self, multiplier: u32) -> Self {
        self.crossing_multiplier = multiplier.max(1);
        self
    }
}

/// A serializable view of a [`WindowState`].
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowSnapshot {
    pub bounds: Option<WindowBounds>,
    pub collection_len: usize,
    pub item_extent: u32,
    pub capacity: usize,
    pub container_extent: u64,
    pub crossing_threshold: u64,
}

/// The authoritative windowing state for one watch cycle.
///
/// `item_extent` and `capacity` are fixed at [`WindowState::initialize`]; only the bounds move
/// afterwards, one item at a time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowState {
    collection_len: usize,
    item_extent: NonZeroU32,
    capacity: usize,
    container_extent: u64,
    crossing_threshold: u64,
    bounds: Option<WindowBounds>,
}

impl WindowState {
    /// Builds the initial window `[0, initial_end_index]`.
    pub fn initialize(
        collection_len: usize,
        viewport_extent: u32,
        item_extent: NonZeroU32,
        options: WindowOptions,
    ) -> Self {
        let capacity = geometry::capacity(viewport_extent, item_extent, options.overscan);
        let bounds = geometry::initial_end_index(collection_len, capacity).map(|end_index| {
            WindowBounds {
                start_index: 0,
                end_index,
            }
        });
        let state = Self {
            collection_len,
            item_extent,
            capacity,
            container_extent: geometry::container_extent(collection_len, item_extent),
            // A zero multiplier would collapse the deadband.
            crossing_threshold: geometry::crossing_threshold(
                item_extent,
                options.crossing_multiplier.max(1),
            ),
            bounds,
        };
        vdebug!(
            collection_len,
            viewport_extent,
            item_extent = item_extent.get(),
            capacity,
            "WindowState::initialize"
        );
        state
    }

    pub fn collection_len(&self) -> usize {
        self.collection_len
    }

    pub fn item_extent(&self) -> NonZeroU32 {
        self.item_extent
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn container_extent(&self) -> u64 {
        self.container_extent
    }

    pub fn crossing_threshold(&self) -> u64 {
        self.crossing_threshold
    }

    pub fn bounds(&self) -> Option<WindowBounds> {
        self.bounds
    }

    pub fn start_index(&self) -> Option<usize> {
        self.bounds.map(|b| b.start_index)
    }

    pub fn end_index(&self) -> Option<usize> {
        self.bounds.map(|b| b.end_index)
    }

    pub fn window_len(&self) -> usize {
        self.bounds.map_or(0, |b| b.count())
    }

    pub fn contains(&self, index: usize) -> bool {
        self.bounds.is_some_and(|b| b.contains(index))
    }

    pub fn offset_of(&self, index: usize) -> u64 {
        geometry::offset_of(index, self.item_extent)
    }

    /// Converts an absolute scroll position into the signed distance of the window's top node
    /// from the viewport top (negative once it has scrolled above it).
    pub fn scroll_delta_for(&self, scroll_top: u64) -> i64 {
        let top = self.start_index().map_or(0, |i| self.offset_of(i));
        clamp_i64(top as i128 - scroll_top as i128)
    }

    /// The window's top has moved up past the threshold and there is more content below.
    pub fn should_extend_forward(&self, scroll_delta: i64) -> bool {
        let Some(b) = self.bounds else {
            return false;
        };
        (scroll_delta as i128) <= -(self.crossing_threshold as i128)
            && b.end_index + 1 < self.collection_len
    }

    /// The user scrolled back up past the threshold and there is content above.
    pub fn should_retract_forward(&self, scroll_delta: i64) -> bool {
        let Some(b) = self.bounds else {
            return false;
        };
        (scroll_delta as i128) >= self.crossing_threshold as i128 && b.start_index > 0
    }

    /// Slides the window one item forward.
    pub fn advance_window(&mut self) -> Result<WindowBounds, RecycleError> {
        let len = self.collection_len;
        let b = self.bounds.as_mut().ok_or(RecycleError::NotInitialized)?;
        let next_end = b.end_index + 1;
        if next_end >= len {
            return Err(RecycleError::IndexOutOfRange {
                index: next_end as i64,
                len,
            });
        }
        b.end_index = next_end;
        b.start_index += 1;
        debug_assert!(b.start_index <= b.end_index);
        vtrace!(start = b.start_index, end = b.end_index, "advance_window");
        Ok(*b)
    }

    /// Slides the window one item backward.
    pub fn retreat_window(&mut self) -> Result<WindowBounds, RecycleError> {
        let len = self.collection_len;
        let b = self.bounds.as_mut().ok_or(RecycleError::NotInitialized)?;
        let Some(prev_start) = b.start_index.checked_sub(1) else {
            vwarn!(len, "retreat_window at the top of the collection");
            return Err(RecycleError::IndexOutOfRange {
                index: -1,
                len,
            });
        };
        b.start_index = prev_start;
        b.end_index -= 1;
        debug_assert!(b.start_index <= b.end_index);
        vtrace!(start = b.start_index, end = b.end_index, "retreat_window");
        Ok(*b)
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            bounds: self.bounds,
            collection_len: self.collection_len,
            item_extent: self.item_extent.get(),
            capacity: self.capacity,
            container_extent: self.container_extent,
            crossing_threshold: self.crossing_threshold,
        }
    }
}

fn clamp_i64(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}
