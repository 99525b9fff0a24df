//! Ordered chain of stages, evaluated head to tail.
//!
//! ```rust
//! # use pixchain_pipeline::{Pipeline, PipelineError, RgbaImage};
//! # fn run(image: RgbaImage) -> Result<(), PipelineError> {
//! let pipeline = Pipeline::parse("greyscale\nnormalise zero=yes")?;
//! let output = pipeline.run(image)?;
//! # Ok(())
//! # }
//! ```
//!
//! Evaluation is an iterative fold: the output of stage *n* becomes the
//! input of stage *n + 1*, and the first failing stage aborts the run.
//! Each intermediate image is dropped as soon as the next stage has
//! consumed it, unless an observer keeps it.
//!
//! # Observers
//!
//! Cross-cutting work that needs every intermediate (saving stage
//! outputs, timing) is injected through [`StageObserver`] and
//! [`Pipeline::run_with`]. The pipeline itself only logs, via `tracing`
//! at `debug` level.

use std::fmt;

use crate::spec::parse_stages;
use crate::stage::Stage;
use crate::types::{Dimensions, PipelineError, RgbaImage, SpecError};

/// Position of a stage within a running pipeline.
#[derive(Debug, Clone, Copy)]
pub struct StageStep<'a> {
    /// 1-based position of the stage.
    pub index: usize,
    /// Number of stages in the pipeline.
    pub total: usize,
    /// The stage being applied.
    pub stage: &'a Stage,
}

/// Hooks called around each stage of [`Pipeline::run_with`].
///
/// `Error` must absorb [`PipelineError`] so stage failures and observer
/// failures travel through one `Result`.
pub trait StageObserver {
    /// Error returned by [`stage_finished`](Self::stage_finished).
    type Error: From<PipelineError>;

    /// Called before the stage is applied to `input`.
    fn stage_started(&mut self, _step: &StageStep<'_>, _input: &RgbaImage) {}

    /// Called with the output of a stage that succeeded.
    ///
    /// # Errors
    ///
    /// Returning an error aborts the run.
    fn stage_finished(
        &mut self,
        step: &StageStep<'_>,
        output: &RgbaImage,
    ) -> Result<(), Self::Error>;
}

/// The no-op observer used by [`Pipeline::run`].
impl StageObserver for () {
    type Error = PipelineError;

    fn stage_finished(&mut self, _: &StageStep<'_>, _: &RgbaImage) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<O: StageObserver + ?Sized> StageObserver for &mut O {
    type Error = O::Error;

    fn stage_started(&mut self, step: &StageStep<'_>, input: &RgbaImage) {
        (**self).stage_started(step, input);
    }

    fn stage_finished(
        &mut self,
        step: &StageStep<'_>,
        output: &RgbaImage,
    ) -> Result<(), Self::Error> {
        (**self).stage_finished(step, output)
    }
}

/// An absent observer does nothing.
impl<O: StageObserver> StageObserver for Option<O> {
    type Error = O::Error;

    fn stage_started(&mut self, step: &StageStep<'_>, input: &RgbaImage) {
        if let Some(inner) = self {
            inner.stage_started(step, input);
        }
    }

    fn stage_finished(
        &mut self,
        step: &StageStep<'_>,
        output: &RgbaImage,
    ) -> Result<(), Self::Error> {
        self.as_mut()
            .map_or(Ok(()), |inner| inner.stage_finished(step, output))
    }
}

/// A validated, immutable sequence of stages.
///
/// The same pipeline can be run against any number of images; it holds
/// no per-image state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Build a pipeline from stages, validating each one.
    ///
    /// Errors name the offending stage by its 1-based position.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidValue`] for a stage whose parameters
    /// can never be valid.
    pub fn new(stages: Vec<Stage>) -> Result<Self, SpecError> {
        for (index, stage) in stages.iter().enumerate() {
            stage.validate(index + 1)?;
        }
        Ok(Self { stages })
    }

    /// Parse a pipeline from the text format described in [`crate::spec`].
    ///
    /// # Errors
    ///
    /// Returns the first [`SpecError`] in the text.
    pub fn parse(text: &str) -> Result<Self, SpecError> {
        Ok(Self {
            stages: parse_stages(text)?,
        })
    }

    /// The stages in application order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` for the identity pipeline.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage over `source` and return the final image.
    ///
    /// An empty pipeline returns `source` unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Stage`] for the first stage that fails.
    pub fn run(&self, source: RgbaImage) -> Result<RgbaImage, PipelineError> {
        self.run_with(source, &mut ())
    }

    /// Like [`run`](Self::run), calling `observer` around every stage.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure (converted into `O::Error`) or the
    /// first error returned by the observer.
    pub fn run_with<O: StageObserver>(
        &self,
        source: RgbaImage,
        observer: &mut O,
    ) -> Result<RgbaImage, O::Error> {
        let total = self.stages.len();
        let mut image = source;

        for (position, stage) in self.stages.iter().enumerate() {
            let step = StageStep {
                index: position + 1,
                total,
                stage,
            };
            tracing::debug!(
                index = step.index,
                total,
                label = stage.label(),
                input = %Dimensions::of(&image),
                "stage started",
            );
            observer.stage_started(&step, &image);

            let output = stage
                .apply(&image)
                .map_err(|source| PipelineError::Stage {
                    index: step.index,
                    stage: stage.to_string(),
                    source,
                })?;

            tracing::debug!(
                index = step.index,
                output = %Dimensions::of(&output),
                "stage finished",
            );
            observer.stage_finished(&step, &output)?;
            image = output;
        }

        Ok(image)
    }
}

/// Formats the pipeline as a pipeline file, one stage per line.
impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stage in &self.stages {
            writeln!(f, "{stage}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::convolve::KernelPreset;
    use crate::normalize::FlatPolicy;
    use crate::resize::ResizeFilter;
    use crate::stage::StageKind;
    use crate::types::StageError;

    fn checker(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([250, 20, 40, 255])
            } else {
                Rgba([10, 90, 200, 255])
            }
        })
    }

    /// Records what it sees; fails on a chosen stage.
    #[derive(Default)]
    struct Recorder {
        started: Vec<(usize, StageKind, (u32, u32))>,
        finished: Vec<(usize, (u32, u32))>,
        fail_on: Option<usize>,
    }

    #[derive(Debug)]
    enum RecorderError {
        Pipeline(PipelineError),
        Refused(usize),
    }

    impl From<PipelineError> for RecorderError {
        fn from(err: PipelineError) -> Self {
            Self::Pipeline(err)
        }
    }

    impl StageObserver for Recorder {
        type Error = RecorderError;

        fn stage_started(&mut self, step: &StageStep<'_>, input: &RgbaImage) {
            self.started
                .push((step.index, step.stage.kind(), input.dimensions()));
        }

        fn stage_finished(
            &mut self,
            step: &StageStep<'_>,
            output: &RgbaImage,
        ) -> Result<(), Self::Error> {
            if self.fail_on == Some(step.index) {
                return Err(RecorderError::Refused(step.index));
            }
            self.finished.push((step.index, output.dimensions()));
            Ok(())
        }
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let img = checker(5, 3);
        let out = Pipeline::default().run(img.clone()).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn stages_apply_head_first() {
        // Crop then resize gives 2x2; resize then crop would fail.
        let pipeline = Pipeline::parse(
            "crop origin=0x0 size=4x4\nresize scale=0.5x0.5 filter=nearest",
        )
        .unwrap();
        let out = pipeline.run(checker(10, 10)).unwrap();
        assert_eq!(out.dimensions(), (2, 2));

        let reversed = Pipeline::parse(
            "resize scale=0.3x0.3 filter=nearest\ncrop origin=0x0 size=4x4",
        )
        .unwrap();
        assert!(reversed.run(checker(10, 10)).is_err());
    }

    #[test]
    fn stage_error_names_position_and_stage() {
        let pipeline = Pipeline::parse("greyscale\ncrop origin=5x5 size=10x10").unwrap();
        let err = pipeline.run(checker(10, 10)).unwrap_err();
        match err {
            PipelineError::Stage {
                index,
                stage,
                source,
            } => {
                assert_eq!(index, 2);
                assert_eq!(stage, "crop origin=5x5 size=10x10");
                assert!(matches!(source, StageError::OutOfBounds { .. }));
            }
            PipelineError::Spec(e) => unreachable!("unexpected spec error {e}"),
        }
    }

    #[test]
    fn observer_sees_every_stage_in_order() {
        let pipeline = Pipeline::new(vec![
            Stage::Greyscale,
            Stage::Resize {
                width_scale: 0.5,
                height_scale: 1.0,
                filter: ResizeFilter::Nearest,
            },
            Stage::Convolve {
                kernel: KernelPreset::Sharpen,
            },
        ])
        .unwrap();
        let mut recorder = Recorder::default();
        let out = pipeline.run_with(checker(8, 2), &mut recorder).unwrap();

        assert_eq!(out.dimensions(), (4, 3));
        assert_eq!(
            recorder.started,
            vec![
                (1, StageKind::Greyscale, (8, 2)),
                (2, StageKind::Resize, (8, 2)),
                (3, StageKind::Convolve, (4, 2)),
            ]
        );
        assert_eq!(recorder.finished, vec![(1, (8, 2)), (2, (4, 2)), (3, (4, 3))]);
    }

    #[test]
    fn observer_error_aborts_run() {
        let pipeline = Pipeline::parse("greyscale\ngreyscale\ngreyscale").unwrap();
        let mut recorder = Recorder {
            fail_on: Some(2),
            ..Recorder::default()
        };
        let err = pipeline.run_with(checker(3, 3), &mut recorder).unwrap_err();
        assert!(matches!(err, RecorderError::Refused(2)));
        assert_eq!(recorder.started.len(), 2);
        assert_eq!(recorder.finished.len(), 1);
    }

    #[test]
    fn stage_failure_reaches_observer_error_type() {
        let pipeline = Pipeline::parse("normalise zero=yes flat=error").unwrap();
        let mut recorder = Recorder::default();
        let flat = RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255]));
        let err = pipeline.run_with(flat, &mut recorder).unwrap_err();
        assert!(matches!(
            err,
            RecorderError::Pipeline(PipelineError::Stage { index: 1, .. })
        ));
        assert!(recorder.finished.is_empty());
    }

    #[test]
    fn absent_observer_is_noop() {
        let pipeline = Pipeline::parse("greyscale").unwrap();
        let mut none: Option<Recorder> = None;
        assert!(pipeline.run_with(checker(2, 2), &mut none).is_ok());
    }

    #[test]
    fn new_validates_by_position() {
        let err = Pipeline::new(vec![
            Stage::Greyscale,
            Stage::Resize {
                width_scale: -1.0,
                height_scale: 1.0,
                filter: ResizeFilter::Triangle,
            },
        ])
        .unwrap_err();
        assert!(matches!(err, SpecError::InvalidValue { line: 2, .. }));
    }

    #[test]
    fn display_round_trips() {
        let pipeline = Pipeline::new(vec![
            Stage::Crop {
                x: 1,
                y: 2,
                width: 3,
                height: 4,
            },
            Stage::Normalize {
                include_zero: false,
                flat: FlatPolicy::Black,
            },
        ])
        .unwrap();
        let text = pipeline.to_string();
        assert_eq!(text, "crop origin=1x2 size=3x4\nnormalise zero=no flat=black\n");
        assert_eq!(Pipeline::parse(&text).unwrap(), pipeline);
    }
}
