//! Input discovery: one file, or every PNG in a directory.

use std::path::{Path, PathBuf};

use crate::IoError;

/// The images a run will process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inputs {
    /// A single image file.
    Single(PathBuf),
    /// The PNG files of a directory, sorted by path.
    Batch(Vec<PathBuf>),
}

impl Inputs {
    /// Every input path, in processing order.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Self::Single(path) => std::slice::from_ref(path),
            Self::Batch(paths) => paths,
        }
    }

    /// Whether the input was a directory.
    #[must_use]
    pub const fn is_batch(&self) -> bool {
        matches!(self, Self::Batch(_))
    }

    /// Number of images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths().len()
    }

    /// Always `false`; a directory without images is an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths().is_empty()
    }
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

/// Resolve `path` into the list of images to process.
///
/// A file is taken as-is whatever its extension. A directory contributes
/// its regular files with a `.png` extension (any case); subdirectories
/// are not searched.
///
/// # Errors
///
/// - [`IoError::MissingInput`] if `path` does not exist.
/// - [`IoError::Read`] if the directory cannot be listed.
/// - [`IoError::NoImages`] if the directory holds no PNG files.
pub fn collect_inputs(path: &Path) -> Result<Inputs, IoError> {
    if !path.exists() {
        return Err(IoError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    if !path.is_dir() {
        return Ok(Inputs::Single(path.to_path_buf()));
    }

    let read_err = |source| IoError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut images = Vec::new();
    for entry in std::fs::read_dir(path).map_err(read_err)? {
        let candidate = entry.map_err(read_err)?.path();
        if candidate.is_file() && is_png(&candidate) {
            images.push(candidate);
        }
    }

    if images.is_empty() {
        return Err(IoError::NoImages {
            path: path.to_path_buf(),
        });
    }
    images.sort();
    tracing::info!(dir = %path.display(), count = images.len(), "found input images");
    Ok(Inputs::Batch(images))
}
