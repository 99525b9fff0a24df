//! pixchain: apply an ordered chain of raster transformations to PNG
//! images.
//!
//! Reads a pipeline file, then runs every input image through it. The
//! input may be a single image or a directory of `*.png` files; in the
//! latter case outputs are numbered in sorted input order.
//!
//! # Usage
//!
//! ```text
//! pixchain --pipe pipe.txt --input photo.png --output out/ [--verbose] [--save-all]
//! pixchain --pipe pipe.json --input frames/ --output renders --json
//! pixchain --pipe pipe.txt --print-pipeline
//! ```
//!
//! A failure on one image is logged and the batch continues; the exit
//! status is non-zero if any image failed. An invalid pipeline aborts
//! before any image is read.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod logger;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use pixchain_io::{IntermediateWriter, IoError, OutputLayout, codec, collect_inputs, load_pipeline};
use pixchain_pipeline::diagnostics::{Clock, DiagnosticsObserver, RunDiagnostics};
use pixchain_pipeline::{Dimensions, Pipeline};
use serde::Serialize;

/// Apply a raster transformation pipeline to PNG images.
#[derive(Parser, Debug)]
#[command(name = "pixchain", version)]
struct Cli {
    /// Pipeline file: one stage per line, or a JSON list of stages when
    /// the name ends in `.json`.
    #[arg(long, value_name = "PATH")]
    pipe: PathBuf,

    /// Input PNG, or a directory whose `*.png` files are all processed.
    #[arg(long, value_name = "PATH", required_unless_present = "print_pipeline")]
    input: Option<PathBuf>,

    /// Output file, or directory for batch runs (created if missing).
    #[arg(long, value_name = "PATH", required_unless_present = "print_pipeline")]
    output: Option<PathBuf>,

    /// Log each stage with its number, label, and input and output size,
    /// and print a timing report per image.
    #[arg(short, long)]
    verbose: bool,

    /// Save the output of every stage next to the final image.
    #[arg(long)]
    save_all: bool,

    /// Print per-image diagnostics to stdout as JSON lines.
    #[arg(long)]
    json: bool,

    /// Print the parsed pipeline in normalized text form and exit.
    #[arg(long)]
    print_pipeline: bool,
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// One line of `--json` output.
#[derive(Serialize)]
struct ImageReport<'a> {
    input: &'a Path,
    output: PathBuf,
    diagnostics: RunDiagnostics,
}

/// Outcome counts of a batch.
#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    succeeded: usize,
    failed: usize,
}

/// Decode, transform and encode one image.
fn process_image(
    pipeline: &Pipeline,
    input: &Path,
    output: &Path,
    stages_dir: Option<PathBuf>,
) -> Result<RunDiagnostics, IoError> {
    let image = codec::decode(input)?;
    let input_size = Dimensions::of(&image);

    let writer = stages_dir.map(IntermediateWriter::new);
    let mut observer = DiagnosticsObserver::new(&StdClock, writer);
    let result = pipeline.run_with(image, &mut observer)?;
    let (diagnostics, writer) = observer.into_parts();
    if let Some(writer) = writer {
        tracing::debug!(
            dir = %writer.dir().display(),
            files = writer.written().len(),
            "saved intermediate images",
        );
    }

    codec::encode(&result, output)?;
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        from = %input_size,
        to = %Dimensions::of(&result),
        "image done",
    );
    Ok(diagnostics)
}

/// Run every input through `pipeline`, continuing past failures.
fn run(cli: &Cli, pipeline: &Pipeline, input: &Path, output: &Path) -> Result<Summary, IoError> {
    let inputs = collect_inputs(input)?;
    let layout = OutputLayout::new(output, inputs.is_batch());
    layout.prepare()?;

    let mut summary = Summary::default();
    for (i, path) in inputs.paths().iter().enumerate() {
        let n = i + 1;
        let destination = layout.output_path(n);
        let stages_dir = cli.save_all.then(|| layout.stages_dir(n));

        match process_image(pipeline, path, &destination, stages_dir) {
            Ok(diagnostics) => {
                summary.succeeded += 1;
                if cli.json {
                    let report = ImageReport {
                        input: path,
                        output: destination,
                        diagnostics,
                    };
                    match serde_json::to_string(&report) {
                        Ok(line) => println!("{line}"),
                        Err(e) => tracing::error!("cannot serialize diagnostics: {e}"),
                    }
                } else if cli.verbose {
                    println!("{}\n", diagnostics.report());
                }
            }
            Err(e) => {
                summary.failed += 1;
                tracing::error!(input = %path.display(), "{e}");
            }
        }
    }

    if inputs.is_batch() {
        tracing::info!(
            images = inputs.len(),
            succeeded = summary.succeeded,
            failed = summary.failed,
            "batch finished",
        );
    }
    Ok(summary)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let pipeline = match load_pipeline(&cli.pipe) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.print_pipeline {
        print!("{pipeline}");
        return ExitCode::SUCCESS;
    }

    let (Some(input), Some(output)) = (cli.input.as_deref(), cli.output.as_deref()) else {
        eprintln!("--input and --output are required");
        return ExitCode::FAILURE;
    };

    match run(&cli, &pipeline, input, output) {
        Ok(summary) if summary.failed == 0 => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
