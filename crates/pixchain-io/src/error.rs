//! Error type for the I/O layer.

use std::path::PathBuf;

use pixchain_pipeline::{PipelineError, SpecError};

/// Errors raised while reading or writing pipeline files and images.
///
/// Every filesystem and codec failure names the path involved.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The input path does not exist.
    #[error("input {} does not exist", .path.display())]
    MissingInput {
        /// The path that was given.
        path: PathBuf,
    },

    /// An input directory holds no PNG images.
    #[error("no .png images found in {}", .path.display())]
    NoImages {
        /// The directory that was scanned.
        path: PathBuf,
    },

    /// A file or directory could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        /// What was being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A directory could not be created.
    #[error("cannot create directory {}: {source}", .path.display())]
    CreateDir {
        /// The directory.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An image file could not be opened or decoded.
    #[error("cannot decode {}: {source}", .path.display())]
    Decode {
        /// The image file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: image::ImageError,
    },

    /// An image could not be encoded or written.
    #[error("cannot encode {}: {source}", .path.display())]
    Encode {
        /// The destination file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: image::ImageError,
    },

    /// A JSON pipeline file is not a list of stages.
    #[error("invalid JSON pipeline {}: {source}", .path.display())]
    Json {
        /// The pipeline file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A pipeline file was read but describes an invalid pipeline.
    #[error("{}: {source}", .path.display())]
    Spec {
        /// The pipeline file.
        path: PathBuf,
        /// What is wrong with it.
        #[source]
        source: SpecError,
    },

    /// Running the pipeline failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
