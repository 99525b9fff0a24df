//! Shared types for the pixchain transformation pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stage::StageKind;

/// Re-export `RgbaImage` so downstream crates can hold decoded and
/// intermediate raster data without depending on `image` directly.
pub use image::RgbaImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an existing image.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total number of pixels.
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Image axis, used to name the offending coordinate of a bounds error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Horizontal axis (width, x coordinate).
    X,
    /// Vertical axis (height, y coordinate).
    Y,
}

impl Axis {
    /// Name of the image extent along this axis.
    #[must_use]
    pub const fn extent_name(self) -> &'static str {
        match self {
            Self::X => "width",
            Self::Y => "height",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("x"),
            Self::Y => f.write_str("y"),
        }
    }
}

/// Errors in a textual pipeline specification.
///
/// Every variant carries the 1-based line number so the user can find
/// the offending stage in the pipeline file. These are detected while
/// building a [`Pipeline`](crate::Pipeline), before any image is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    /// The stage name is not one of the recognized stages.
    #[error("line {line}: unknown stage `{name}`")]
    UnknownStage {
        /// Line number in the pipeline file.
        line: usize,
        /// The unrecognized stage name.
        name: String,
    },

    /// A token was not of the form `key=value`.
    #[error("line {line}: expected `key=value`, got `{token}`")]
    MalformedToken {
        /// Line number in the pipeline file.
        line: usize,
        /// The offending token.
        token: String,
    },

    /// The stage does not accept this key.
    #[error("line {line}: `{stage}` does not accept `{key}`")]
    UnknownKey {
        /// Line number in the pipeline file.
        line: usize,
        /// Stage the key was given to.
        stage: StageKind,
        /// The unexpected key.
        key: String,
    },

    /// The same key appeared twice on one line.
    #[error("line {line}: `{key}` given more than once")]
    DuplicateKey {
        /// Line number in the pipeline file.
        line: usize,
        /// The repeated key.
        key: String,
    },

    /// A required key is absent.
    #[error("line {line}: `{stage}` requires `{key}`")]
    MissingKey {
        /// Line number in the pipeline file.
        line: usize,
        /// Stage missing the key.
        stage: StageKind,
        /// The required key.
        key: &'static str,
    },

    /// A value could not be parsed or is outside its allowed range.
    #[error("line {line}: invalid {key} `{value}`: {reason}")]
    InvalidValue {
        /// Line number in the pipeline file, or the 1-based
        /// stage position when the stage was built in code or from JSON.
        line: usize,
        /// Key whose value is invalid.
        key: &'static str,
        /// The value as written.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Errors raised while applying a single stage to an image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    /// The requested region extends past the image bounds.
    #[error(
        "{axis} range {origin}+{size} exceeds image {extent} of {bound} pixels",
        extent = .axis.extent_name()
    )]
    OutOfBounds {
        /// Axis on which the region overflows.
        axis: Axis,
        /// Region origin on that axis.
        origin: u32,
        /// Region size on that axis.
        size: u32,
        /// Image size on that axis.
        bound: u32,
    },

    /// A resize would produce an image too large to allocate.
    #[error("target size {dimensions} exceeds the limit of {limit} pixels")]
    TargetTooLarge {
        /// The requested output size.
        dimensions: Dimensions,
        /// Largest pixel count a stage may produce.
        limit: u64,
    },

    /// Normalization found no dynamic range to stretch.
    #[error("intensity range is flat (min {min:?}, max {max:?}); nothing to stretch")]
    DegenerateRange {
        /// Lowest participating intensity (`None` if no pixel participated).
        min: Option<u8>,
        /// Highest participating intensity (`None` if no pixel participated).
        max: Option<u8>,
    },
}

/// Errors produced by running a [`Pipeline`](crate::Pipeline).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The pipeline specification is invalid.
    #[error("invalid pipeline specification: {0}")]
    Spec(#[from] SpecError),

    /// A stage failed on the current image.
    #[error("stage {index} (`{stage}`) failed: {source}")]
    Stage {
        /// 1-based position of the failing stage.
        index: usize,
        /// The failing stage in pipeline-file syntax.
        stage: String,
        /// What went wrong.
        #[source]
        source: StageError,
    },
}
