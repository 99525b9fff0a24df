//! Scale an image by independent width and height fractions.
//!
//! Target dimensions are `truncate(scale * dimension)` on each axis.
//! The truncation rule is part of the contract; the resampling filter is
//! not, and can be chosen per stage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, RgbaImage, StageError};

/// Largest output a resize may produce: 2^28 pixels, 1 GiB of RGBA.
pub const MAX_PIXELS: u64 = 1 << 28;

/// Resampling filter used when resizing.
///
/// Ordered from fastest/lowest-quality to slowest/highest-quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    /// Nearest-neighbor: fastest, blocky artifacts.
    Nearest,
    /// Bilinear interpolation: fast, decent quality.
    #[default]
    Triangle,
    /// Bicubic (Catmull-Rom): moderate speed, good quality.
    CatmullRom,
    /// Gaussian: moderate speed, smooth output.
    Gaussian,
    /// Lanczos with 3 lobes: slowest, sharpest.
    Lanczos3,
}

impl ResizeFilter {
    /// Every filter, in the order listed above.
    pub const ALL: [Self; 5] = [
        Self::Nearest,
        Self::Triangle,
        Self::CatmullRom,
        Self::Gaussian,
        Self::Lanczos3,
    ];

    /// Name used in pipeline files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Triangle => "triangle",
            Self::CatmullRom => "catmull-rom",
            Self::Gaussian => "gaussian",
            Self::Lanczos3 => "lanczos3",
        }
    }

    /// Convert to the `image` crate's `FilterType`.
    const fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            Self::Nearest => image::imageops::FilterType::Nearest,
            Self::Triangle => image::imageops::FilterType::Triangle,
            Self::CatmullRom => image::imageops::FilterType::CatmullRom,
            Self::Gaussian => image::imageops::FilterType::Gaussian,
            Self::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResizeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|filter| filter.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|f| f.name()).collect();
                format!("expected one of {}", names.join(", "))
            })
    }
}

/// Dimensions produced by scaling `dimensions` by `(width_scale, height_scale)`.
///
/// Each axis is truncated toward zero, never rounded: `0.5 * 5` is `2`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn scaled_dimensions(dimensions: Dimensions, width_scale: f32, height_scale: f32) -> Dimensions {
    // Computed in f64 so that e.g. 1.0 * 16_777_217 stays exact.
    let scale = |factor: f32, len: u32| (f64::from(factor) * f64::from(len)).trunc() as u32;
    Dimensions {
        width: scale(width_scale, dimensions.width),
        height: scale(height_scale, dimensions.height),
    }
}

/// Resize `image` by the given fractions using `filter`.
///
/// A target with a zero-length axis produces an empty image without
/// invoking the resampler.
///
/// # Errors
///
/// Returns [`StageError::TargetTooLarge`] when the target holds more than
/// [`MAX_PIXELS`] pixels. The check happens before any allocation.
pub fn resize(
    image: &RgbaImage,
    width_scale: f32,
    height_scale: f32,
    filter: ResizeFilter,
) -> Result<RgbaImage, StageError> {
    let target = scaled_dimensions(Dimensions::of(image), width_scale, height_scale);
    if target.pixel_count() > MAX_PIXELS {
        return Err(StageError::TargetTooLarge {
            dimensions: target,
            limit: MAX_PIXELS,
        });
    }
    if target.width == 0 || target.height == 0 || image.width() == 0 || image.height() == 0 {
        return Ok(RgbaImage::new(target.width, target.height));
    }
    Ok(image::imageops::resize(
        image,
        target.width,
        target.height,
        filter.to_image_filter(),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgba;

    use super::*;

    fn test_image(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([128, 128, 128, 255]))
    }

    #[test]
    fn default_filter_is_triangle() {
        assert_eq!(ResizeFilter::default(), ResizeFilter::Triangle);
    }

    #[test]
    fn unit_scale_keeps_dimensions() {
        let out = resize(&test_image(37, 21), 1.0, 1.0, ResizeFilter::Triangle).unwrap();
        assert_eq!(out.dimensions(), (37, 21));
    }

    #[test]
    fn half_scale_truncates() {
        let out = resize(&test_image(5, 7), 0.5, 0.5, ResizeFilter::Nearest).unwrap();
        assert_eq!(out.dimensions(), (2, 3));
    }

    #[test]
    fn independent_axis_scales() {
        let out = resize(&test_image(100, 80), 0.25, 2.0, ResizeFilter::CatmullRom).unwrap();
        assert_eq!(out.dimensions(), (25, 160));
    }

    #[test]
    fn tiny_scale_yields_empty_image() {
        let out = resize(&test_image(3, 3), 0.1, 1.0, ResizeFilter::Triangle).unwrap();
        assert_eq!(out.dimensions(), (0, 3));
    }

    #[test]
    fn empty_input_scales_to_empty() {
        let out = resize(&RgbaImage::new(0, 0), 2.0, 2.0, ResizeFilter::Lanczos3).unwrap();
        assert_eq!(out.dimensions(), (0, 0));
    }

    #[test]
    fn uniform_image_stays_uniform_with_nearest() {
        let out = resize(&test_image(10, 10), 0.5, 0.5, ResizeFilter::Nearest).unwrap();
        assert!(out.pixels().all(|p| *p == Rgba([128, 128, 128, 255])));
    }

    #[test]
    fn huge_scale_is_rejected_before_allocating() {
        let err = resize(&test_image(2, 2), 1e10, 1e10, ResizeFilter::Triangle).unwrap_err();
        assert_eq!(
            err,
            StageError::TargetTooLarge {
                dimensions: Dimensions {
                    width: u32::MAX,
                    height: u32::MAX,
                },
                limit: MAX_PIXELS,
            }
        );
    }

    #[test]
    fn one_row_past_the_limit_is_rejected() {
        let target = scaled_dimensions(
            Dimensions {
                width: 1,
                height: 1,
            },
            16_384.0,
            16_384.0,
        );
        assert_eq!(target.pixel_count(), MAX_PIXELS);
        let err = resize(&test_image(1, 1), 16_384.0, 16_385.0, ResizeFilter::Nearest).unwrap_err();
        assert!(matches!(err, StageError::TargetTooLarge { .. }));
    }

    #[test]
    fn huge_scale_on_zero_axis_stays_empty() {
        let out = resize(&test_image(0, 4), 1e10, 1.0, ResizeFilter::Triangle).unwrap();
        assert_eq!(out.dimensions(), (0, 4));
    }

    #[test]
    fn scaled_dimensions_truncate_not_round() {
        let d = scaled_dimensions(
            Dimensions {
                width: 9,
                height: 9,
            },
            0.99,
            0.3,
        );
        assert_eq!(
            d,
            Dimensions {
                width: 8,
                height: 2
            }
        );
    }

    #[test]
    fn filter_names_parse_back() {
        for filter in ResizeFilter::ALL {
            assert_eq!(filter.name().parse::<ResizeFilter>().unwrap(), filter);
        }
        assert!("bicubic".parse::<ResizeFilter>().is_err());
    }
}
