//! PNG decoding and encoding.
//!
//! Images are always handled as 8-bit RGBA. Grey or RGB PNGs are
//! expanded on decode; encode writes RGBA so a decode of the written
//! file returns exactly the same pixels.

use std::path::Path;

use image::ImageFormat;
use pixchain_pipeline::{Dimensions, RgbaImage};

use crate::IoError;

/// Read the image at `path` as RGBA.
///
/// # Errors
///
/// Returns [`IoError::Decode`] if the file cannot be opened or is not a
/// decodable PNG.
pub fn decode(path: &Path) -> Result<RgbaImage, IoError> {
    let image = image::open(path)
        .map_err(|source| IoError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .into_rgba8();
    tracing::debug!(
        path = %path.display(),
        size = %Dimensions::of(&image),
        "decoded image",
    );
    Ok(image)
}

/// Write `image` to `path` as PNG.
///
/// The parent directory must already exist.
///
/// # Errors
///
/// Returns [`IoError::Encode`] if encoding or writing fails.
pub fn encode(image: &RgbaImage, path: &Path) -> Result<(), IoError> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| IoError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(
        path = %path.display(),
        size = %Dimensions::of(image),
        "encoded image",
    );
    Ok(())
}
