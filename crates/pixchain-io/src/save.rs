//! Persisting intermediate stage outputs.

use std::path::{Path, PathBuf};

use pixchain_pipeline::{RgbaImage, StageObserver, StageStep};

use crate::layout::{create_dir, intermediate_name};
use crate::{IoError, codec};

/// Writes every stage output of a run into one directory.
///
/// The directory is created when the first stage finishes, so a run
/// whose first stage fails leaves nothing behind.
#[derive(Debug)]
pub struct IntermediateWriter {
    dir: PathBuf,
    created: bool,
    written: Vec<PathBuf>,
}

impl IntermediateWriter {
    /// Write intermediates into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            created: false,
            written: Vec::new(),
        }
    }

    /// Target directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far, in stage order.
    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl StageObserver for IntermediateWriter {
    type Error = IoError;

    fn stage_finished(
        &mut self,
        step: &StageStep<'_>,
        output: &RgbaImage,
    ) -> Result<(), Self::Error> {
        if !self.created {
            create_dir(&self.dir)?;
            self.created = true;
        }
        let path = self
            .dir
            .join(intermediate_name(step.index, step.stage.kind()));
        codec::encode(output, &path)?;
        self.written.push(path);
        Ok(())
    }
}
