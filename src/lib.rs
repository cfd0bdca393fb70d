pub mod ai;
pub mod app;
pub mod compositor;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod history;
pub mod logging;
pub mod media;
pub mod state;
pub mod text;
pub use error::{AppError, AppResult};

use std::path::PathBuf;

use app::StartupConfig;

/// Entrypoint used by the CLI binding: one headless edit, returning the export path.
pub async fn run(startup: StartupConfig) -> AppResult<PathBuf> {
    tracing::info!(input = %startup.input.display(), "starting Phantasia");

    let config = config::load_app_config();
    tracing::info!(
        fonts = config.font_paths.len(),
        brush_size = config.brush_size,
        remote = config.ai_endpoint.is_some(),
        "loaded app config"
    );

    let path = app::run_headless(&startup, &config).await?;
    tracing::info!(path = %path.display(), "edit complete");
    Ok(path)
}
