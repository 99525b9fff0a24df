//! Where outputs and intermediate stage images are written.
//!
//! Single image:
//!
//! ```text
//! --output out/          ->  out/output.png   out/output-stages/
//! --output out/result    ->  out/result.png   out/result-stages/
//! --output art.png       ->  art.png          art-stages/
//! ```
//!
//! Batch (input is a directory):
//!
//! ```text
//! --output out           ->  out/output-1.png  out/output-1-stages/
//!                            out/output-2.png  out/output-2-stages/ ...
//! ```
//!
//! Intermediate files inside a stages directory are named
//! `<NN>-<stage>.png`, e.g. `02-crop.png`.

use std::path::{Path, PathBuf};

use pixchain_pipeline::StageKind;

use crate::IoError;

const DEFAULT_STEM: &str = "output";

/// Output paths for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLayout {
    /// One input image, one output file.
    Single {
        /// The final image.
        output: PathBuf,
        /// Directory for intermediate stage images.
        stages_dir: PathBuf,
    },
    /// Numbered outputs inside a directory.
    Batch {
        /// The directory holding every output.
        root: PathBuf,
    },
}

impl OutputLayout {
    /// Plan the layout for `output`.
    ///
    /// For a single image, an `output` that is an existing directory
    /// receives `output.png`; any other path is used as the file name,
    /// with `.png` appended when it has no extension.
    #[must_use]
    pub fn new(output: &Path, batch: bool) -> Self {
        if batch {
            return Self::Batch {
                root: output.to_path_buf(),
            };
        }

        let output = if output.is_dir() {
            output.join(DEFAULT_STEM).with_extension("png")
        } else if output.extension().is_none() {
            output.with_extension("png")
        } else {
            output.to_path_buf()
        };
        let stem = output
            .file_stem()
            .map_or_else(|| DEFAULT_STEM.into(), |s| s.to_string_lossy());
        let stages_dir = output.with_file_name(format!("{stem}-stages"));
        Self::Single { output, stages_dir }
    }

    /// Final output path for the `n`th image (1-based).
    #[must_use]
    pub fn output_path(&self, n: usize) -> PathBuf {
        match self {
            Self::Single { output, .. } => output.clone(),
            Self::Batch { root } => root.join(format!("{DEFAULT_STEM}-{n}.png")),
        }
    }

    /// Intermediate directory for the `n`th image (1-based).
    #[must_use]
    pub fn stages_dir(&self, n: usize) -> PathBuf {
        match self {
            Self::Single { stages_dir, .. } => stages_dir.clone(),
            Self::Batch { root } => root.join(format!("{DEFAULT_STEM}-{n}-stages")),
        }
    }

    /// Create the directories final outputs are written into.
    ///
    /// Stage directories are created on first use by
    /// [`IntermediateWriter`](crate::IntermediateWriter).
    ///
    /// # Errors
    ///
    /// Returns [`IoError::CreateDir`] if a directory cannot be created.
    pub fn prepare(&self) -> Result<(), IoError> {
        let dir = match self {
            Self::Single { output, .. } => match output.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => return Ok(()),
            },
            Self::Batch { root } => root.as_path(),
        };
        create_dir(dir)
    }
}

/// File name of the intermediate written after stage `index` (1-based).
#[must_use]
pub fn intermediate_name(index: usize, kind: StageKind) -> String {
    format!("{index:02}-{kind}.png")
}

pub(crate) fn create_dir(dir: &Path) -> Result<(), IoError> {
    std::fs::create_dir_all(dir).map_err(|source| IoError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}
