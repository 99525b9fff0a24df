//! Min-max contrast stretch.
//!
//! The intensity bounds come from a greyscale view of the image, but the
//! remap is applied to the original R, G and B channels so colour is
//! preserved. Each channel is mapped with
//!
//! ```text
//! new = round((old - min) / (max - min) * 255)   clamped to 0..=255
//! ```
//!
//! and alpha is forced to fully opaque.
//!
//! When `min == max` there is nothing to stretch. What happens then is
//! chosen by [`FlatPolicy`].

use std::fmt;
use std::str::FromStr;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::greyscale::intensity;
use crate::types::{RgbaImage, StageError};

/// What to do with an image whose intensity range is flat.
///
/// An image with no participating pixel at all (empty, or entirely
/// black with zeros excluded) counts as flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlatPolicy {
    /// Keep R, G and B unchanged; alpha is still forced opaque.
    #[default]
    Keep,
    /// Set R, G and B to zero; alpha forced opaque.
    Black,
    /// Fail with [`StageError::DegenerateRange`].
    Error,
}

impl FlatPolicy {
    /// Every policy.
    pub const ALL: [Self; 3] = [Self::Keep, Self::Black, Self::Error];

    /// Name used in pipeline files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Black => "black",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for FlatPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FlatPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|policy| policy.name() == s)
            .ok_or_else(|| "expected one of keep, black, error".to_string())
    }
}

/// Lowest and highest greyscale intensity in `image`.
///
/// With `include_zero == false`, pixels of intensity 0 take part in
/// neither scan. Returns `None` when no pixel participates.
#[must_use]
pub fn intensity_range(image: &RgbaImage, include_zero: bool) -> Option<(u8, u8)> {
    image
        .pixels()
        .map(intensity)
        .filter(|&v| include_zero || v > 0)
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Stretch the colour channels of `image` so the greyscale intensity
/// range maps onto `0..=255`.
///
/// # Errors
///
/// Returns [`StageError::DegenerateRange`] when the range is flat and
/// `flat` is [`FlatPolicy::Error`].
pub fn normalize(
    image: &RgbaImage,
    include_zero: bool,
    flat: FlatPolicy,
) -> Result<RgbaImage, StageError> {
    let (width, height) = image.dimensions();

    let (min, max) = match intensity_range(image, include_zero) {
        Some((lo, hi)) if lo < hi => (lo, hi),
        range => {
            tracing::debug!(?range, policy = %flat, "flat intensity range");
            return match flat {
                FlatPolicy::Keep => Ok(RgbaImage::from_fn(width, height, |x, y| {
                    let [r, g, b, _] = image.get_pixel(x, y).0;
                    Rgba([r, g, b, 255])
                })),
                FlatPolicy::Black => Ok(RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))),
                FlatPolicy::Error => Err(StageError::DegenerateRange {
                    min: range.map(|(lo, _)| lo),
                    max: range.map(|(_, hi)| hi),
                }),
            };
        }
    };

    let old_min = f32::from(min);
    let span = f32::from(max) - old_min;
    let stretch = |channel: u8| -> u8 {
        let v = ((f32::from(channel) - old_min) / span * 255.0).round();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let byte = v.clamp(0.0, 255.0) as u8;
        byte
    };

    Ok(RgbaImage::from_fn(width, height, |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        Rgba([stretch(r), stretch(g), stretch(b), 255])
    }))
}
