//! Bounds checks and neighborhood helpers shared by spatial stages.
//!
//! Crop needs to know whether a rectangular region fits inside the
//! image; convolution needs the range of pixels whose square window of a
//! given radius lies fully inside it. Both answers are computed up front,
//! so no stage ever reads outside the image.

use std::ops::Range;

use crate::types::{Axis, StageError};

/// Verify that `origin..origin + size` fits inside `0..bound`.
///
/// Overflow of `origin + size` is reported as out of bounds.
///
/// # Errors
///
/// Returns [`StageError::OutOfBounds`] naming the axis when the span
/// extends past `bound`.
pub const fn check_span(axis: Axis, origin: u32, size: u32, bound: u32) -> Result<(), StageError> {
    match origin.checked_add(size) {
        Some(end) if end <= bound => Ok(()),
        _ => Err(StageError::OutOfBounds {
            axis,
            origin,
            size,
            bound,
        }),
    }
}

/// Coordinates along an axis of length `len` whose window of `radius`
/// pixels on either side stays inside `0..len`.
///
/// Empty when the axis is shorter than the full window (`2 * radius + 1`).
#[must_use]
pub const fn interior(len: u32, radius: u32) -> Range<u32> {
    let end = len.saturating_sub(radius);
    if end > radius { radius..end } else { radius..radius }
}
