use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::ai::FlowNames;
use crate::editor::mask::{clamp_brush_size, DEFAULT_BRUSH_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "phantasia";
const APP_CONFIG_FILE: &str = "config.json";

fn default_brush_size() -> u32 {
    DEFAULT_BRUSH_SIZE
}

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Base URL of the image-transform flow server.
    #[serde(default)]
    pub ai_endpoint: Option<String>,
    /// Font files loaded for text, sticker and watermark rendering.
    #[serde(default)]
    pub font_paths: Vec<PathBuf>,
    #[serde(default = "default_brush_size")]
    pub brush_size: u32,
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
    /// Per-operation flow names on the transform server.
    #[serde(default)]
    pub ai_flows: FlowNames,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ai_endpoint: None,
            font_paths: Vec::new(),
            brush_size: DEFAULT_BRUSH_SIZE,
            export_dir: None,
            ai_flows: FlowNames::default(),
        }
    }
}

impl AppConfig {
    fn normalized(mut self) -> Self {
        self.brush_size = clamp_brush_size(self.brush_size);
        self.ai_endpoint = self
            .ai_endpoint
            .map(|endpoint| endpoint.trim().to_string())
            .filter(|endpoint| !endpoint.is_empty());
        self
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    load_app_config_from(&path)
}

pub fn load_app_config_from(path: &Path) -> AppConfig {
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str::<AppConfig>(&contents)
            .map(AppConfig::normalized)
            .unwrap_or_else(|err| {
                tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
                AppConfig::default()
            }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "phantasia",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/phantasia/config.json"));
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path("phantasia", "config.json", None, Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/phantasia/config.json"));
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path("phantasia", "config.json", None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn config_file_fields_are_parsed_and_normalized() {
        let root = tempfile::tempdir().expect("tempdir should be created");
        let dir = root.path().join(APP_DIR);
        std::fs::create_dir_all(&dir).expect("config dir should be created");
        std::fs::write(
            dir.join(APP_CONFIG_FILE),
            r#"{"ai_endpoint":" http://localhost:3400 ","brush_size":900,"font_paths":["/fonts/a.ttf"]}"#,
        )
        .expect("config should be written");

        let config = load_app_config_with(Some(root.path()), None);
        assert_eq!(config.ai_endpoint.as_deref(), Some("http://localhost:3400"));
        assert_eq!(config.brush_size, 200);
        assert_eq!(config.font_paths, vec![PathBuf::from("/fonts/a.ttf")]);
        assert_eq!(config.export_dir, None);
        assert_eq!(config.ai_flows, FlowNames::default());
    }

    #[test]
    fn flow_names_can_be_overridden_individually() {
        let root = tempfile::tempdir().expect("tempdir should be created");
        let path = root.path().join(APP_CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{"ai_endpoint":"http://flows","ai_flows":{"inpaint":"fillFlow"}}"#,
        )
        .expect("config should be written");

        let config = load_app_config_from(&path);
        assert_eq!(config.ai_flows.inpaint, "fillFlow");
        assert_eq!(config.ai_flows.enhance, FlowNames::default().enhance);
        assert_eq!(
            config.ai_flows.erase_background,
            FlowNames::default().erase_background
        );
    }

    #[test]
    fn malformed_or_missing_config_falls_back_to_defaults() {
        let root = tempfile::tempdir().expect("tempdir should be created");
        assert_eq!(load_app_config_with(Some(root.path()), None), AppConfig::default());

        let dir = root.path().join(APP_DIR);
        std::fs::create_dir_all(&dir).expect("config dir should be created");
        std::fs::write(dir.join(APP_CONFIG_FILE), "{not json").expect("config should be written");
        let config = load_app_config_with(Some(root.path()), None);
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.brush_size, DEFAULT_BRUSH_SIZE);
    }
}
