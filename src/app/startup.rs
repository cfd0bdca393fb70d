use std::path::PathBuf;

use thiserror::Error;

use crate::editor::FilterPreset;

pub const USAGE: &str = "usage: phantasia <input> [--preset NAME] [--rotate DEG] [--flip-h] [--flip-v] \
[--enhance] [--erase-background] [--out DIR]";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupError {
    #[error("missing input image\n{USAGE}")]
    MissingInput,
    #[error("unexpected argument {argument}\n{USAGE}")]
    UnexpectedArgument { argument: String },
    #[error("{flag} expects a value\n{USAGE}")]
    MissingValue { flag: &'static str },
    #[error("unknown filter preset {name}")]
    UnknownPreset { name: String },
    #[error("rotation must be a number of degrees, got {value}")]
    InvalidRotation { value: String },
}

/// Remote transforms requested on the command line, run before export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoteSteps {
    pub enhance: bool,
    pub erase_background: bool,
}

impl RemoteSteps {
    pub const fn any(self) -> bool {
        self.enhance || self.erase_background
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartupConfig {
    pub input: PathBuf,
    pub preset: Option<FilterPreset>,
    pub rotate: f64,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub remote: RemoteSteps,
    pub out_dir: Option<PathBuf>,
}

impl StartupConfig {
    pub fn from_args() -> Result<Self, StartupError> {
        Self::parse(std::env::args().skip(1))
    }

    pub fn parse<I>(args: I) -> Result<Self, StartupError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut input = None;
        let mut preset = None;
        let mut rotate = 0.0;
        let mut flip_horizontal = false;
        let mut flip_vertical = false;
        let mut remote = RemoteSteps::default();
        let mut out_dir = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--preset" => {
                    let name = args.next().ok_or(StartupError::MissingValue { flag: "--preset" })?;
                    preset = Some(
                        FilterPreset::from_label(&name)
                            .ok_or(StartupError::UnknownPreset { name })?,
                    );
                }
                "--rotate" => {
                    let value = args.next().ok_or(StartupError::MissingValue { flag: "--rotate" })?;
                    rotate = value
                        .parse::<f64>()
                        .ok()
                        .filter(|degrees| degrees.is_finite())
                        .ok_or(StartupError::InvalidRotation { value })?;
                }
                "--flip-h" => flip_horizontal = true,
                "--flip-v" => flip_vertical = true,
                "--enhance" => remote.enhance = true,
                "--erase-background" => remote.erase_background = true,
                "--out" => {
                    let dir = args.next().ok_or(StartupError::MissingValue { flag: "--out" })?;
                    out_dir = Some(PathBuf::from(dir));
                }
                _ if arg.starts_with("--") || input.is_some() => {
                    return Err(StartupError::UnexpectedArgument { argument: arg });
                }
                _ => input = Some(PathBuf::from(arg)),
            }
        }

        Ok(Self {
            input: input.ok_or(StartupError::MissingInput)?,
            preset,
            rotate,
            flip_horizontal,
            flip_vertical,
            remote,
            out_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_full_argument_set() {
        let config = StartupConfig::parse(args(&[
            "photo.jpg",
            "--preset",
            "sin-city",
            "--rotate",
            "-90",
            "--flip-h",
            "--erase-background",
            "--out",
            "/tmp/out",
        ]))
        .expect("arguments should parse");

        assert_eq!(config.input, PathBuf::from("photo.jpg"));
        assert_eq!(config.preset, Some(FilterPreset::SinCity));
        assert_eq!(config.rotate, -90.0);
        assert!(config.flip_horizontal);
        assert!(!config.flip_vertical);
        assert!(config.remote.erase_background);
        assert!(!config.remote.enhance);
        assert_eq!(config.out_dir, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn input_is_required() {
        assert_eq!(
            StartupConfig::parse(args(&["--flip-v"])),
            Err(StartupError::MissingInput)
        );
    }

    #[test]
    fn rejects_bad_values_and_stray_arguments() {
        assert_eq!(
            StartupConfig::parse(args(&["a.png", "--preset", "noir"])),
            Err(StartupError::UnknownPreset {
                name: "noir".to_string()
            })
        );
        assert_eq!(
            StartupConfig::parse(args(&["a.png", "--rotate", "left"])),
            Err(StartupError::InvalidRotation {
                value: "left".to_string()
            })
        );
        assert_eq!(
            StartupConfig::parse(args(&["a.png", "--out"])),
            Err(StartupError::MissingValue { flag: "--out" })
        );
        assert_eq!(
            StartupConfig::parse(args(&["a.png", "b.png"])),
            Err(StartupError::UnexpectedArgument {
                argument: "b.png".to_string()
            })
        );
    }
}
