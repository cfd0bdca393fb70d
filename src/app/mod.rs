//! Headless driver behind the `phantasia` binary: load one image, run the
//! requested edits through an [`EditorSession`] and write the export.

mod startup;

use std::path::{Path, PathBuf};

use crate::ai::{HttpTransformService, TransformServiceError};
use crate::config::AppConfig;
use crate::editor::EditorSession;
use crate::error::{AppError, AppResult};
use crate::media::{DataUri, MediaError};
use crate::text::FontBook;

pub use startup::{RemoteSteps, StartupConfig, StartupError, USAGE};

const DEFAULT_EXPORT_DIR: &str = ".";

/// Reads `path` and wraps it as a data URI carrying its sniffed MIME type.
pub fn read_input_data_uri(path: &Path) -> AppResult<String> {
    let bytes = std::fs::read(path).map_err(|source| AppError::ReadInput {
        path: path.display().to_string(),
        source,
    })?;
    let format = image::guess_format(&bytes).map_err(MediaError::Decode)?;
    Ok(DataUri {
        mime: format.to_mime_type().to_string(),
        bytes,
    }
    .to_uri_string())
}

fn export_dir(startup: &StartupConfig, config: &AppConfig) -> PathBuf {
    startup
        .out_dir
        .clone()
        .or_else(|| config.export_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_DIR))
}

async fn run_remote_steps(
    session: &mut EditorSession,
    startup: &StartupConfig,
    config: &AppConfig,
) -> AppResult<()> {
    if !startup.remote.any() {
        return Ok(());
    }
    let endpoint = config
        .ai_endpoint
        .as_deref()
        .ok_or(TransformServiceError::NotConfigured)?;
    let service = HttpTransformService::new(endpoint)?.with_flows(config.ai_flows.clone());

    if startup.remote.enhance {
        let reasoning = session.enhance(&service).await?;
        tracing::info!(%reasoning, "photo enhanced");
    }
    if startup.remote.erase_background {
        session.erase_background(&service).await?;
        tracing::info!("background removed");
    }
    Ok(())
}

/// Runs one headless edit and returns the written export path.
pub async fn run_headless(startup: &StartupConfig, config: &AppConfig) -> AppResult<PathBuf> {
    let data_uri = read_input_data_uri(&startup.input)?;
    let fonts = FontBook::load_paths(&config.font_paths);
    let mut session = EditorSession::open(data_uri, fonts)
        .await?
        .with_brush_size(config.brush_size);

    run_remote_steps(&mut session, startup, config).await?;

    if let Some(preset) = startup.preset {
        session.apply_preset(preset)?;
    }
    {
        let transform = session.pending_transform_mut()?;
        transform.rotate_by(startup.rotate);
        if startup.flip_horizontal {
            transform.flip_horizontal();
        }
        if startup.flip_vertical {
            transform.flip_vertical();
        }
    }

    let artifact = session.export()?;
    let path = artifact.write_to_dir(&export_dir(startup, config))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::compositor::EXPORT_PREFIX;
    use crate::editor::FilterPreset;

    fn write_input(dir: &Path) -> PathBuf {
        let path = dir.join("input.png");
        RgbaImage::from_fn(4, 2, |x, _| Rgba([if x == 0 { 255 } else { 0 }, 0, 0, 255]))
            .save(&path)
            .expect("input should be written");
        path
    }

    fn startup(input: PathBuf, out_dir: &Path) -> StartupConfig {
        StartupConfig {
            input,
            preset: None,
            rotate: 0.0,
            flip_horizontal: false,
            flip_vertical: false,
            remote: RemoteSteps::default(),
            out_dir: Some(out_dir.to_path_buf()),
        }
    }

    #[test]
    fn input_is_wrapped_with_sniffed_mime_type() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let uri = read_input_data_uri(&write_input(dir.path())).expect("input should be read");
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn missing_input_reports_path() {
        let err = read_input_data_uri(Path::new("/nonexistent/photo.png"))
            .expect_err("missing file should fail");
        assert!(matches!(err, AppError::ReadInput { .. }));
    }

    #[tokio::test]
    async fn headless_run_bakes_rotation_and_flip_into_export() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let mut startup = startup(write_input(dir.path()), &dir.path().join("out"));
        startup.rotate = 90.0;
        startup.flip_horizontal = true;
        startup.preset = Some(FilterPreset::Grayscale);

        let path = run_headless(&startup, &AppConfig::default())
            .await
            .expect("headless run should succeed");

        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .expect("export should have a name");
        assert!(name.starts_with(EXPORT_PREFIX));
        let output = image::open(&path).expect("export should decode").to_rgba8();
        assert_eq!(output.dimensions(), (2, 4));
    }

    #[tokio::test]
    async fn remote_steps_without_endpoint_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let mut startup = startup(write_input(dir.path()), dir.path());
        startup.remote.enhance = true;

        let err = run_headless(&startup, &AppConfig::default())
            .await
            .expect_err("enhance needs an endpoint");
        assert!(matches!(
            err,
            AppError::TransformService(TransformServiceError::NotConfigured)
        ));
    }
}
