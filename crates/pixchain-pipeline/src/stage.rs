//! The closed set of transformation stages.
//!
//! A [`Stage`] is one parameterized transformation. It is built once
//! (from a pipeline file or JSON), validated, and then applied to as many
//! images as needed; applying never mutates the stage or its input.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::convolve::KernelPreset;
use crate::normalize::FlatPolicy;
use crate::resize::ResizeFilter;
use crate::types::{RgbaImage, SpecError, StageError};

/// Discriminant of a [`Stage`], used in error messages and file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    /// See [`Stage::Greyscale`].
    Greyscale,
    /// See [`Stage::Crop`].
    Crop,
    /// See [`Stage::Resize`].
    Resize,
    /// See [`Stage::Normalize`].
    Normalize,
    /// See [`Stage::Convolve`].
    Convolve,
}

impl StageKind {
    /// Name used in pipeline files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Greyscale => "greyscale",
            Self::Crop => "crop",
            Self::Resize => "resize",
            Self::Normalize => "normalise",
            Self::Convolve => "convolve",
        }
    }

    /// Progress label shown while the stage runs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Greyscale => "Greyscaling image",
            Self::Crop => "Cropping image",
            Self::Resize => "Resizing image",
            Self::Normalize => "Normalising image",
            Self::Convolve => "Convolving image",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One transformation in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "kebab-case")]
pub enum Stage {
    /// Replace colour with its channel-mean luminance.
    Greyscale,
    /// Copy out the `width` x `height` region at `(x, y)`.
    Crop {
        /// Left edge of the region.
        x: u32,
        /// Top edge of the region.
        y: u32,
        /// Region width.
        width: u32,
        /// Region height.
        height: u32,
    },
    /// Scale each axis by a positive fraction, truncating the result.
    Resize {
        /// Horizontal scale factor.
        width_scale: f32,
        /// Vertical scale factor.
        height_scale: f32,
        /// Resampling filter.
        #[serde(default)]
        filter: ResizeFilter,
    },
    /// Min-max contrast stretch.
    Normalize {
        /// Whether zero-intensity pixels take part in the min/max scan.
        include_zero: bool,
        /// Behaviour when the intensity range is flat.
        #[serde(default)]
        flat: FlatPolicy,
    },
    /// Convolve the interior with a built-in kernel.
    Convolve {
        /// Which kernel to use.
        kernel: KernelPreset,
    },
}

impl Stage {
    /// The stage's discriminant.
    #[must_use]
    pub const fn kind(&self) -> StageKind {
        match self {
            Self::Greyscale => StageKind::Greyscale,
            Self::Crop { .. } => StageKind::Crop,
            Self::Resize { .. } => StageKind::Resize,
            Self::Normalize { .. } => StageKind::Normalize,
            Self::Convolve { .. } => StageKind::Convolve,
        }
    }

    /// Progress label, e.g. `"Cropping image"`.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.kind().label()
    }

    /// Check parameters that can be rejected without an image.
    ///
    /// `line` is attached to any error; use 0 for stages that did not
    /// come from a text file.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidValue`] if a resize scale is not a
    /// positive finite number.
    pub fn validate(&self, line: usize) -> Result<(), SpecError> {
        if let Self::Resize {
            width_scale,
            height_scale,
            ..
        } = *self
        {
            for factor in [width_scale, height_scale] {
                if !(factor.is_finite() && factor > 0.0) {
                    return Err(SpecError::InvalidValue {
                        line,
                        key: "scale",
                        value: factor.to_string(),
                        reason: "scale factors must be positive and finite".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Apply this stage to `image`, producing a new image.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::OutOfBounds`] when a crop region does not fit
    /// the image, [`StageError::TargetTooLarge`] when a resize target
    /// exceeds [`MAX_PIXELS`](crate::resize::MAX_PIXELS), and
    /// [`StageError::DegenerateRange`] when normalization meets a flat
    /// image under [`FlatPolicy::Error`].
    pub fn apply(&self, image: &RgbaImage) -> Result<RgbaImage, StageError> {
        match *self {
            Self::Greyscale => Ok(crate::greyscale::greyscale(image)),
            Self::Crop {
                x,
                y,
                width,
                height,
            } => crate::crop::crop(image, x, y, width, height),
            Self::Resize {
                width_scale,
                height_scale,
                filter,
            } => crate::resize::resize(image, width_scale, height_scale, filter),
            Self::Normalize { include_zero, flat } => {
                crate::normalize::normalize(image, include_zero, flat)
            }
            Self::Convolve { kernel } => Ok(crate::convolve::convolve(image, &kernel.kernel())),
        }
    }
}

/// Formats the stage in pipeline-file syntax; the output parses back to
/// an equal stage.
impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())?;
        match *self {
            Self::Greyscale => Ok(()),
            Self::Crop {
                x,
                y,
                width,
                height,
            } => write!(f, " origin={x}x{y} size={width}x{height}"),
            Self::Resize {
                width_scale,
                height_scale,
                filter,
            } => {
                write!(f, " scale={width_scale}x{height_scale}")?;
                if filter != ResizeFilter::default() {
                    write!(f, " filter={filter}")?;
                }
                Ok(())
            }
            Self::Normalize { include_zero, flat } => {
                write!(f, " zero={}", if include_zero { "yes" } else { "no" })?;
                if flat != FlatPolicy::default() {
                    write!(f, " flat={flat}")?;
                }
                Ok(())
            }
            Self::Convolve { kernel } => write!(f, " kernel={kernel}"),
        }
    }
}
