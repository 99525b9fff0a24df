//! Rectangular crop.

use crate::neighborhood::check_span;
use crate::types::{Axis, RgbaImage, StageError};

/// Copy the `width` x `height` region whose top-left corner is at
/// `(x, y)` into a new image.
///
/// Output pixel `(i, j)` is input pixel `(x + i, y + j)`.
///
/// # Errors
///
/// Returns [`StageError::OutOfBounds`] when the region extends past the
/// right or bottom edge of `image`. The horizontal axis is checked first.
pub fn crop(
    image: &RgbaImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<RgbaImage, StageError> {
    check_span(Axis::X, x, width, image.width())?;
    check_span(Axis::Y, y, height, image.height())?;

    Ok(image::imageops::crop_imm(image, x, y, width, height).to_image())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgba;

    use super::*;

    /// 6x4 image whose pixel encodes its own coordinates.
    fn coordinate_image() -> RgbaImage {
        RgbaImage::from_fn(6, 4, |x, y| {
            Rgba([
                u8::try_from(x).unwrap(),
                u8::try_from(y).unwrap(),
                0,
                255,
            ])
        })
    }

    #[test]
    fn crop_copies_offset_region() {
        let img = coordinate_image();
        let out = crop(&img, 2, 1, 3, 2).unwrap();
        assert_eq!(out.dimensions(), (3, 2));
        assert_eq!(out.get_pixel(0, 0), &Rgba([2, 1, 0, 255]));
        assert_eq!(out.get_pixel(2, 1), &Rgba([4, 2, 0, 255]));
    }

    #[test]
    fn full_bounds_crop_is_identity() {
        let img = coordinate_image();
        let out = crop(&img, 0, 0, 6, 4).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn region_touching_far_edge_is_allowed() {
        let img = coordinate_image();
        let out = crop(&img, 5, 3, 1, 1).unwrap();
        assert_eq!(out.get_pixel(0, 0), &Rgba([5, 3, 0, 255]));
    }

    #[test]
    fn zero_sized_crop_is_empty() {
        let img = coordinate_image();
        let out = crop(&img, 6, 4, 0, 0).unwrap();
        assert_eq!(out.dimensions(), (0, 0));
    }

    #[test]
    fn origin_overflow_is_rejected_before_copying() {
        let img = coordinate_image();
        let err = crop(&img, u32::MAX, 0, 2, 1).unwrap_err();
        assert!(matches!(
            err,
            StageError::OutOfBounds {
                axis: Axis::X,
                origin: u32::MAX,
                ..
            }
        ));
    }

    #[test]
    fn overflowing_width_is_rejected() {
        let img = coordinate_image();
        let err = crop(&img, 1, 0, 6, 4).unwrap_err();
        assert_eq!(
            err,
            StageError::OutOfBounds {
                axis: Axis::X,
                origin: 1,
                size: 6,
                bound: 6,
            }
        );
    }

    #[test]
    fn overflowing_height_is_rejected() {
        let img = coordinate_image();
        let err = crop(&img, 0, 2, 6, 3).unwrap_err();
        assert!(matches!(
            err,
            StageError::OutOfBounds { axis: Axis::Y, .. }
        ));
    }
}
