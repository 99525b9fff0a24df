//! Loading a pipeline from disk.
//!
//! A file ending in `.json` holds a JSON array of stages, e.g.
//! `[{"stage": "crop", "x": 0, "y": 0, "width": 64, "height": 64}]`.
//! Anything else is read as the line-oriented text format.

use std::path::Path;

use pixchain_pipeline::{Pipeline, Stage};

use crate::IoError;

/// Read and validate the pipeline stored at `path`.
///
/// # Errors
///
/// - [`IoError::Read`] if the file cannot be read.
/// - [`IoError::Json`] if a `.json` file is not a list of stages.
/// - [`IoError::Spec`] if the pipeline is invalid.
pub fn load_pipeline(path: &Path) -> Result<Pipeline, IoError> {
    let text = std::fs::read_to_string(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let pipeline = if is_json {
        let stages: Vec<Stage> = serde_json::from_str(&text).map_err(|source| IoError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Pipeline::new(stages)
    } else {
        Pipeline::parse(&text)
    }
    .map_err(|source| IoError::Spec {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(
        path = %path.display(),
        stages = pipeline.len(),
        "loaded pipeline",
    );
    Ok(pipeline)
}
