//! Per-stage timing and size diagnostics.
//!
//! [`DiagnosticsObserver`] wraps another [`StageObserver`] and records,
//! for every stage, the input and output dimensions and the wall-clock
//! time spent in it. Time is read through the [`Clock`] trait so the
//! library stays free of any particular time source; the binary supplies
//! one backed by `std::time::Instant`.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::{StageObserver, StageStep};
use crate::stage::StageKind;
use crate::types::{Dimensions, RgbaImage};

/// Source of timestamps for diagnostics.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics for a single stage of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// 1-based position of the stage.
    pub index: usize,
    /// Which stage ran.
    pub kind: StageKind,
    /// The stage in pipeline-file syntax.
    pub stage: String,
    /// Dimensions of the image the stage received.
    pub input: Dimensions,
    /// Dimensions of the image the stage produced.
    pub output: Dimensions,
    /// Wall-clock duration of the stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

/// Diagnostics collected from one image passing through a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    /// One entry per completed stage, in order.
    pub stages: Vec<StageDiagnostics>,
    /// Sum of the stage durations (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

impl RunDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        if let (Some(first), Some(last)) = (self.stages.first(), self.stages.last()) {
            lines.push(format!("Image: {} -> {}", first.input, last.output));
        }
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<4} {:<32} {:>10} {:>8}  {}",
            "#", "Stage", "Duration", "% Total", "Size"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for diag in &self.stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "{:<4} {:<32} {ms:>8.3}ms {pct:>7.1}%  {} -> {}",
                diag.index, diag.stage, diag.input, diag.output,
            ));
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Observer that times every stage, then forwards to `inner`.
pub struct DiagnosticsObserver<'c, C: Clock, O> {
    clock: &'c C,
    inner: O,
    started: Option<(C::Instant, Dimensions)>,
    diagnostics: RunDiagnostics,
}

impl<'c, C: Clock, O: StageObserver> DiagnosticsObserver<'c, C, O> {
    /// Wrap `inner`, reading time from `clock`.
    pub fn new(clock: &'c C, inner: O) -> Self {
        Self {
            clock,
            inner,
            started: None,
            diagnostics: RunDiagnostics::default(),
        }
    }

    /// Diagnostics recorded so far.
    #[must_use]
    pub const fn diagnostics(&self) -> &RunDiagnostics {
        &self.diagnostics
    }

    /// Consume the observer, returning the diagnostics and the inner observer.
    pub fn into_parts(self) -> (RunDiagnostics, O) {
        (self.diagnostics, self.inner)
    }
}

impl<C: Clock> DiagnosticsObserver<'_, C, ()> {
    /// Consume the observer, returning the recorded diagnostics.
    #[must_use]
    pub fn into_diagnostics(self) -> RunDiagnostics {
        self.diagnostics
    }
}

impl<C: Clock, O: StageObserver> StageObserver for DiagnosticsObserver<'_, C, O> {
    type Error = O::Error;

    fn stage_started(&mut self, step: &StageStep<'_>, input: &RgbaImage) {
        self.inner.stage_started(step, input);
        self.started = Some((self.clock.now(), Dimensions::of(input)));
    }

    fn stage_finished(
        &mut self,
        step: &StageStep<'_>,
        output: &RgbaImage,
    ) -> Result<(), Self::Error> {
        let output_dims = Dimensions::of(output);
        let (duration, input) = self.started.take().map_or(
            (Duration::ZERO, output_dims),
            |(instant, input)| (self.clock.elapsed(&instant), input),
        );

        self.diagnostics.total_duration += duration;
        self.diagnostics.stages.push(StageDiagnostics {
            index: step.index,
            kind: step.stage.kind(),
            stage: step.stage.to_string(),
            input,
            output: output_dims,
            duration,
        });

        self.inner.stage_finished(step, output)
    }
}
