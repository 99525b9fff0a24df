//! pixchain-pipeline: Pure raster transformation pipeline (sans-IO).
//!
//! An RGBA image is passed through an ordered chain of stages:
//! greyscale, crop, resize, normalise (contrast stretch) and convolve
//! (edge, sharpen, blur). Pipelines are built from a short text format
//! (see [`spec`]) or deserialized from JSON, then run against any number
//! of images.
//!
//! This crate has **no I/O dependencies**: it operates on in-memory
//! [`RgbaImage`] buffers. Decoding, encoding and the filesystem live in
//! `pixchain-io`.

pub mod convolve;
pub mod crop;
pub mod diagnostics;
pub mod greyscale;
pub mod neighborhood;
pub mod normalize;
pub mod pipeline;
pub mod resize;
pub mod spec;
pub mod stage;
pub mod types;

pub use convolve::{Kernel, KernelPreset};
pub use normalize::FlatPolicy;
pub use pipeline::{Pipeline, StageObserver, StageStep};
pub use resize::ResizeFilter;
pub use stage::{Stage, StageKind};
pub use types::{Axis, Dimensions, PipelineError, RgbaImage, SpecError, StageError};
