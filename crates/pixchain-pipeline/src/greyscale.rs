//! Greyscale conversion.
//!
//! Luminance is the plain mean of the three colour channels. No gamma or
//! perceptual weighting is applied, so `greyscale` is idempotent and a
//! pure grey pixel maps to itself.

use image::Rgba;

use crate::types::RgbaImage;

/// Luminance of a pixel: `floor((r + g + b) / 3)`.
#[must_use]
pub fn intensity(pixel: &Rgba<u8>) -> u8 {
    let [r, g, b, _] = pixel.0;
    let sum = u16::from(r) + u16::from(g) + u16::from(b);
    // At most 765 / 3 = 255.
    #[allow(clippy::cast_possible_truncation)]
    let mean = (sum / 3) as u8;
    mean
}

/// Replace R, G and B of every pixel with its [`intensity`], keeping alpha.
#[must_use = "returns the greyscale image"]
pub fn greyscale(image: &RgbaImage) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let pixel = image.get_pixel(x, y);
        let v = intensity(pixel);
        Rgba([v, v, v, pixel.0[3]])
    })
}
