//! Stateless window math.
//!
//! Every function takes the item extent as a [`NonZeroU32`], so division by a zero height cannot
//! be expressed. Use [`item_extent_from_measurement`] to turn a raw host measurement into one.

use core::num::NonZeroU32;

use crate::RecycleError;

/// Extra item slots kept resident beyond the exact viewport fit.
pub const DEFAULT_OVERSCAN: usize = 4;

/// The crossing threshold, in item extents.
pub const DEFAULT_CROSSING_MULTIPLIER: u32 = 2;

/// Total scrollable height reported to the host container.
///
/// The extra item slot keeps the last item from being clipped at the bottom of the container.
pub fn container_extent(collection_len: usize, item_extent: NonZeroU32) -> u64 {
    (collection_len as u64)
        .saturating_add(1)
        .saturating_mul(item_extent.get() as u64)
}

/// Number of nodes kept resident: `ceil(viewport / item) + overscan`.
pub fn capacity(viewport_extent: u32, item_extent: NonZeroU32, overscan: usize) -> usize {
    (viewport_extent.div_ceil(item_extent.get()) as usize).saturating_add(overscan)
}

/// Inclusive end of the first window, or `None` when nothing fits (empty collection).
pub fn initial_end_index(collection_len: usize, capacity: usize) -> Option<usize> {
    collection_len.min(capacity).checked_sub(1)
}

pub fn crossing_threshold(item_extent: NonZeroU32, multiplier: u32) -> u64 {
    (item_extent.get() as u64).saturating_mul(multiplier as u64)
}

/// Absolute position of `index` inside the container. Never depends on sibling layout.
pub fn offset_of(index: usize, item_extent: NonZeroU32) -> u64 {
    (index as u64).saturating_mul(item_extent.get() as u64)
}

/// Rounds a host-reported height to whole pixels and rejects anything the window math cannot
/// divide by.
pub fn item_extent_from_measurement(height: f32) -> Result<NonZeroU32, RecycleError> {
    if !height.is_finite() {
        return Err(RecycleError::InvalidGeometry { measured: height });
    }
    let rounded = round_half_up(height);
    if rounded < 1.0 || rounded > u32::MAX as f32 {
        return Err(RecycleError::InvalidGeometry { measured: height });
    }
    NonZeroU32::new(rounded as u32).ok_or(RecycleError::InvalidGeometry { measured: height })
}

// `f32::round` lives in std; this keeps the crate usable without it.
fn round_half_up(x: f32) -> f32 {
    let shifted = x + 0.5;
    let truncated = shifted as i64 as f32;
    if truncated > shifted {
        truncated - 1.0
    } else {
        truncated
    }
}
