//! Kernel convolution over the interior of an image.
//!
//! Only pixels whose whole kernel window lies inside the input are
//! computed. The border band of `radius` pixels on each edge is left at
//! the zero value of a fresh buffer (transparent black); no edge
//! extension or reflection is performed.
//!
//! The output is `max(input, kernel)` on each axis, so an image smaller
//! than the kernel grows to the kernel size and stays blank.
//!
//! Each channel sum is truncated toward zero and reduced to its low
//! eight bits. Sums outside `0..=255` therefore wrap rather than
//! saturate; the edge kernel in particular produces wrapped values on
//! dark-to-light transitions.
//!
//! Rows are computed in parallel with `rayon`. Every output pixel reads
//! only the immutable input, so the result matches a sequential loop.

use std::fmt;
use std::str::FromStr;

use image::Rgba;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::neighborhood::interior;
use crate::types::RgbaImage;

const EDGE_WEIGHTS: [f64; 9] = [0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0];

const SHARPEN_WEIGHTS: [f64; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

/// Binomial 5x5 weights, the outer product of `[1, 4, 6, 4, 1]` with itself.
const BLUR_WEIGHTS: [f64; 25] = [
    1.0, 4.0, 6.0, 4.0, 1.0, //
    4.0, 16.0, 24.0, 16.0, 4.0, //
    6.0, 24.0, 36.0, 24.0, 6.0, //
    4.0, 16.0, 24.0, 16.0, 4.0, //
    1.0, 4.0, 6.0, 4.0, 1.0,
];

/// `1 / 256`, exactly representable, so blur weights sum to exactly 1.
const BLUR_SCALE: f64 = 0.003_906_25;

/// The built-in convolution kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KernelPreset {
    /// 3x3 Laplacian edge detector.
    Edge,
    /// 3x3 sharpen.
    Sharpen,
    /// 5x5 binomial blur, normalized to sum 1.
    Blur,
}

impl KernelPreset {
    /// Every preset.
    pub const ALL: [Self; 3] = [Self::Edge, Self::Sharpen, Self::Blur];

    /// Name used in pipeline files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Edge => "edge",
            Self::Sharpen => "sharpen",
            Self::Blur => "blur",
        }
    }

    /// The weight matrix for this preset.
    #[must_use]
    pub const fn kernel(self) -> Kernel {
        match self {
            Self::Edge => Kernel {
                size: 3,
                weights: &EDGE_WEIGHTS,
                scale: 1.0,
            },
            Self::Sharpen => Kernel {
                size: 3,
                weights: &SHARPEN_WEIGHTS,
                scale: 1.0,
            },
            Self::Blur => Kernel {
                size: 5,
                weights: &BLUR_WEIGHTS,
                scale: BLUR_SCALE,
            },
        }
    }
}

impl fmt::Display for KernelPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KernelPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| "expected one of edge, sharpen, blur".to_string())
    }
}

/// A square, odd-sized weight matrix stored row-major.
///
/// Weights are kept as small integers plus a common `scale` so the blur
/// kernel is exact in binary floating point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel {
    size: u32,
    weights: &'static [f64],
    scale: f64,
}

impl Kernel {
    /// Side length of the matrix.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Distance from the centre to the edge of the window.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.size / 2
    }

    /// Weight at row `dy`, column `dx` of the matrix.
    #[must_use]
    pub fn weight(&self, dx: u32, dy: u32) -> f64 {
        self.weights[(dy * self.size + dx) as usize] * self.scale
    }
}

/// Truncate toward zero and keep the low eight bits.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn wrap_to_byte(value: f64) -> u8 {
    (value.trunc() as i64).rem_euclid(256) as u8
}

/// Weighted sum of the window centred on `(x, y)`; alpha is set opaque.
fn convolve_pixel(image: &RgbaImage, kernel: &Kernel, x: u32, y: u32) -> Rgba<u8> {
    let radius = kernel.radius();
    let mut sums = [0.0_f64; 3];
    for dy in 0..kernel.size() {
        for dx in 0..kernel.size() {
            let weight = kernel.weight(dx, dy);
            let pixel = image.get_pixel(x + dx - radius, y + dy - radius);
            for (sum, &channel) in sums.iter_mut().zip(&pixel.0[..3]) {
                *sum += weight * f64::from(channel);
            }
        }
    }
    Rgba([
        wrap_to_byte(sums[0]),
        wrap_to_byte(sums[1]),
        wrap_to_byte(sums[2]),
        255,
    ])
}

/// Convolve `image` with `kernel`.
#[must_use = "returns the convolved image"]
pub fn convolve(image: &RgbaImage, kernel: &Kernel) -> RgbaImage {
    let (in_width, in_height) = image.dimensions();
    let out_width = in_width.max(kernel.size());
    let out_height = in_height.max(kernel.size());

    if in_width < kernel.size() || in_height < kernel.size() {
        tracing::warn!(
            input = %format!("{in_width}x{in_height}"),
            kernel = kernel.size(),
            "image is smaller than the kernel window; output is blank",
        );
    }

    let columns = interior(in_width, kernel.radius());
    let rows = interior(in_height, kernel.radius());

    let mut output = RgbaImage::new(out_width, out_height);
    let stride = out_width as usize * 4;
    if stride == 0 {
        return output;
    }

    output
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let Ok(y) = u32::try_from(y) else {
                return;
            };
            if !rows.contains(&y) {
                return;
            }
            for x in columns.clone() {
                let offset = x as usize * 4;
                let pixel = convolve_pixel(image, kernel, x, y);
                row[offset..offset + 4].copy_from_slice(&pixel.0);
            }
        });

    output
}
