//! Text format for pipeline files.
//!
//! One stage per line, a stage name followed by `key=value` tokens
//! separated by whitespace:
//!
//! ```text
//! # trim the border, then sharpen
//! crop origin=10x20 size=100x50
//! greyscale
//! resize scale=0.5x0.5 filter=lanczos3
//! normalise zero=no flat=keep
//! convolve kernel=sharpen
//! ```
//!
//! Pair values are written `AxB`. Blank lines and lines starting with
//! `#` are ignored. `grayscale` and `normalize` are accepted as
//! spellings of `greyscale` and `normalise`.

use std::collections::HashMap;
use std::str::FromStr;

use crate::convolve::KernelPreset;
use crate::normalize::FlatPolicy;
use crate::resize::ResizeFilter;
use crate::stage::{Stage, StageKind};
use crate::types::SpecError;

/// Parse a whole pipeline file into stages, validating each one.
///
/// # Errors
///
/// Returns the first [`SpecError`] encountered, tagged with its 1-based
/// line number.
pub fn parse_stages(text: &str) -> Result<Vec<Stage>, SpecError> {
    let mut stages = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.trim();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }
        let stage = parse_stage(content, line)?;
        stage.validate(line)?;
        stages.push(stage);
    }
    Ok(stages)
}

/// Parse a single non-empty stage line.
///
/// # Errors
///
/// See [`SpecError`] for the possible failures.
pub fn parse_stage(content: &str, line: usize) -> Result<Stage, SpecError> {
    let mut tokens = content.split_whitespace();
    let name = tokens.next().unwrap_or_default();
    let kind = stage_kind(name).ok_or_else(|| SpecError::UnknownStage {
        line,
        name: name.to_string(),
    })?;
    let mut fields = Fields::collect(kind, line, tokens)?;

    let stage = match kind {
        StageKind::Greyscale => Stage::Greyscale,
        StageKind::Crop => {
            let (x, y) = fields.required("origin", parse_pair::<u32>)?;
            let (width, height) = fields.required("size", parse_pair::<u32>)?;
            Stage::Crop {
                x,
                y,
                width,
                height,
            }
        }
        StageKind::Resize => {
            let (width_scale, height_scale) = fields.required("scale", parse_pair::<f32>)?;
            let filter = fields
                .optional("filter", ResizeFilter::from_str)?
                .unwrap_or_default();
            Stage::Resize {
                width_scale,
                height_scale,
                filter,
            }
        }
        StageKind::Normalize => {
            let include_zero = fields.required("zero", parse_yes_no)?;
            let flat = fields
                .optional("flat", FlatPolicy::from_str)?
                .unwrap_or_default();
            Stage::Normalize { include_zero, flat }
        }
        StageKind::Convolve => {
            let kernel = fields.required("kernel", KernelPreset::from_str)?;
            Stage::Convolve { kernel }
        }
    };

    fields.finish()?;
    Ok(stage)
}

fn stage_kind(name: &str) -> Option<StageKind> {
    match name {
        "greyscale" | "grayscale" => Some(StageKind::Greyscale),
        "crop" => Some(StageKind::Crop),
        "resize" => Some(StageKind::Resize),
        "normalise" | "normalize" => Some(StageKind::Normalize),
        "convolve" => Some(StageKind::Convolve),
        _ => None,
    }
}

/// Parse `AxB` into a pair of numbers.
fn parse_pair<T>(value: &str) -> Result<(T, T), String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let (a, b) = value
        .split_once('x')
        .ok_or_else(|| "expected a pair written AxB".to_string())?;
    let a = a.parse().map_err(|e| format!("`{a}`: {e}"))?;
    let b = b.parse().map_err(|e| format!("`{b}`: {e}"))?;
    Ok((a, b))
}

fn parse_yes_no(value: &str) -> Result<bool, String> {
    match value {
        "yes" => Ok(true),
        "no" => Ok(false),
        _ => Err("expected yes or no".to_string()),
    }
}

/// The `key=value` tokens of one line, consumed as the stage reads them.
struct Fields<'a> {
    kind: StageKind,
    line: usize,
    values: HashMap<&'a str, &'a str>,
}

impl<'a> Fields<'a> {
    fn collect(
        kind: StageKind,
        line: usize,
        tokens: impl Iterator<Item = &'a str>,
    ) -> Result<Self, SpecError> {
        let mut values = HashMap::new();
        for token in tokens {
            let (key, value) = token
                .split_once('=')
                .filter(|(k, v)| !k.is_empty() && !v.is_empty())
                .ok_or_else(|| SpecError::MalformedToken {
                    line,
                    token: token.to_string(),
                })?;
            if values.insert(key, value).is_some() {
                return Err(SpecError::DuplicateKey {
                    line,
                    key: key.to_string(),
                });
            }
        }
        Ok(Self { kind, line, values })
    }

    fn optional<T, E>(
        &mut self,
        key: &'static str,
        parse: impl FnOnce(&str) -> Result<T, E>,
    ) -> Result<Option<T>, SpecError>
    where
        E: std::fmt::Display,
    {
        let Some(value) = self.values.remove(key) else {
            return Ok(None);
        };
        parse(value)
            .map(Some)
            .map_err(|e| SpecError::InvalidValue {
                line: self.line,
                key,
                value: value.to_string(),
                reason: e.to_string(),
            })
    }

    fn required<T, E>(
        &mut self,
        key: &'static str,
        parse: impl FnOnce(&str) -> Result<T, E>,
    ) -> Result<T, SpecError>
    where
        E: std::fmt::Display,
    {
        self.optional(key, parse)?.ok_or(SpecError::MissingKey {
            line: self.line,
            stage: self.kind,
            key,
        })
    }

    /// Reject keys the stage did not read.
    fn finish(self) -> Result<(), SpecError> {
        let mut leftover: Vec<&str> = self.values.into_keys().collect();
        leftover.sort_unstable();
        match leftover.first() {
            Some(key) => Err(SpecError::UnknownKey {
                line: self.line,
                stage: self.kind,
                key: (*key).to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_stage() {
        let text = "\
greyscale
crop origin=10x20 size=100x50
resize scale=0.5x0.75
normalise zero=yes
convolve kernel=blur
";
        let stages = parse_stages(text).unwrap();
        assert_eq!(
            stages,
            vec![
                Stage::Greyscale,
                Stage::Crop {
                    x: 10,
                    y: 20,
                    width: 100,
                    height: 50
                },
                Stage::Resize {
                    width_scale: 0.5,
                    height_scale: 0.75,
                    filter: ResizeFilter::Triangle
                },
                Stage::Normalize {
                    include_zero: true,
                    flat: FlatPolicy::Keep
                },
                Stage::Convolve {
                    kernel: KernelPreset::Blur
                },
            ]
        );
    }

    #[test]
    fn skips_blank_lines_and_comments() {
        let text = "\n# first\n  greyscale  \n\n   # indented comment\nconvolve kernel=edge\n";
        let stages = parse_stages(text).unwrap();
        assert_eq!(stages.len(), 2);
    }

    #[test]
    fn empty_text_is_empty_pipeline() {
        assert!(parse_stages("").unwrap().is_empty());
    }

    #[test]
    fn accepts_alternate_spellings() {
        let stages = parse_stages("grayscale\nnormalize zero=no").unwrap();
        assert_eq!(stages[0], Stage::Greyscale);
        assert_eq!(stages[1].kind(), StageKind::Normalize);
    }

    #[test]
    fn key_order_does_not_matter() {
        let a = parse_stage("crop size=3x4 origin=1x2", 1).unwrap();
        let b = parse_stage("crop origin=1x2 size=3x4", 1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn optional_keys_are_read() {
        let stage = parse_stage("resize scale=2x2 filter=nearest", 1).unwrap();
        assert!(matches!(
            stage,
            Stage::Resize {
                filter: ResizeFilter::Nearest,
                ..
            }
        ));
        let stage = parse_stage("normalise zero=no flat=black", 1).unwrap();
        assert!(matches!(
            stage,
            Stage::Normalize {
                include_zero: false,
                flat: FlatPolicy::Black
            }
        ));
    }

    #[test]
    fn unknown_stage_reports_line() {
        let err = parse_stages("greyscale\n\nsepia tone=warm").unwrap_err();
        assert_eq!(
            err,
            SpecError::UnknownStage {
                line: 3,
                name: "sepia".to_string()
            }
        );
    }

    #[test]
    fn unknown_kernel_is_invalid_value() {
        let err = parse_stages("convolve kernel=emboss").unwrap_err();
        assert!(matches!(
            err,
            SpecError::InvalidValue {
                line: 1,
                key: "kernel",
                ..
            }
        ));
    }

    #[test]
    fn missing_key_is_reported() {
        let err = parse_stages("crop origin=1x1").unwrap_err();
        assert_eq!(
            err,
            SpecError::MissingKey {
                line: 1,
                stage: StageKind::Crop,
                key: "size"
            }
        );
    }

    #[test]
    fn unexpected_key_is_reported() {
        let err = parse_stages("greyscale strength=2").unwrap_err();
        assert!(matches!(err, SpecError::UnknownKey { ref key, .. } if key == "strength"));
    }

    #[test]
    fn duplicate_key_is_reported() {
        let err = parse_stages("convolve kernel=edge kernel=blur").unwrap_err();
        assert!(matches!(err, SpecError::DuplicateKey { ref key, .. } if key == "kernel"));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        for text in ["crop origin", "crop =1x1", "crop origin="] {
            let err = parse_stages(text).unwrap_err();
            assert!(
                matches!(err, SpecError::MalformedToken { .. }),
                "{text}: {err:?}"
            );
        }
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        for text in [
            "crop origin=1x size=1x1",
            "crop origin=-1x0 size=1x1",
            "crop origin=1,1 size=1x1",
            "resize scale=halfx1",
        ] {
            let err = parse_stages(text).unwrap_err();
            assert!(
                matches!(err, SpecError::InvalidValue { .. }),
                "{text}: {err:?}"
            );
        }
    }

    #[test]
    fn non_positive_scale_is_rejected_at_parse_time() {
        let err = parse_stages("resize scale=0x1").unwrap_err();
        assert!(matches!(err, SpecError::InvalidValue { key: "scale", .. }));
    }

    #[test]
    fn bad_yes_no_is_rejected() {
        let err = parse_stages("normalise zero=true").unwrap_err();
        assert!(matches!(err, SpecError::InvalidValue { key: "zero", .. }));
    }

    #[test]
    fn display_output_parses_back() {
        let text = "crop origin=3x4 size=5x6\nresize scale=0.3x1.5 filter=gaussian\nnormalise zero=no flat=error";
        let stages = parse_stages(text).unwrap();
        let rendered: Vec<String> = stages.iter().map(ToString::to_string).collect();
        assert_eq!(parse_stages(&rendered.join("\n")).unwrap(), stages);
    }
}
