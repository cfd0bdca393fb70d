use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbaImage;

use super::filters::apply_filters;
use super::transform::apply_transform_state;
use super::{CompositorError, CompositorResult};
use crate::editor::adjustments::{EditorAdjustments, TransformState};
use crate::media::{encode_png, DataUri};

pub const EXPORT_PREFIX: &str = "phantasia-edit-";

/// Encoded PNG ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn to_data_uri(&self) -> String {
        DataUri::png(self.bytes.clone()).to_uri_string()
    }

    /// Writes the artifact into `dir` (created if missing) and returns its path.
    pub fn write_to_dir(&self, dir: &Path) -> CompositorResult<PathBuf> {
        let path = dir.join(&self.filename);
        std::fs::create_dir_all(dir)
            .and_then(|()| std::fs::write(&path, &self.bytes))
            .map_err(|source| CompositorError::Write {
                path: path.clone(),
                source,
            })?;
        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "export written");
        Ok(path)
    }
}

/// `phantasia-edit-<unix millis>.png`.
pub fn export_filename(at: SystemTime) -> String {
    let millis = at
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("{EXPORT_PREFIX}{millis}.png")
}

/// Final output path: filters, then the pending flips and rotation, encoded as PNG.
pub fn bake_export(
    bitmap: &RgbaImage,
    transform: &TransformState,
    adjustments: &EditorAdjustments,
) -> CompositorResult<ExportArtifact> {
    let filtered = apply_filters(bitmap, adjustments);
    let output = apply_transform_state(&filtered, transform);
    let bytes = encode_png(&output)?;
    Ok(ExportArtifact {
        filename: export_filename(SystemTime::now()),
        width: output.width(),
        height: output.height(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use image::Rgba;

    use super::*;
    use crate::media::decode_data_uri;

    #[test]
    fn filename_uses_unix_millis() {
        let at = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        assert_eq!(export_filename(at), "phantasia-edit-1700000000123.png");
    }

    #[test]
    fn bake_export_applies_filters_then_rotation() {
        let bitmap = RgbaImage::from_pixel(4, 2, Rgba([200, 100, 50, 255]));
        let mut transform = TransformState::default();
        transform.rotate_by(90.0);
        let mut adjustments = EditorAdjustments::NEUTRAL;
        adjustments.set_brightness(50.0);

        let artifact = bake_export(&bitmap, &transform, &adjustments).expect("export should bake");
        assert_eq!((artifact.width, artifact.height), (2, 4));
        assert!(artifact.filename.starts_with(EXPORT_PREFIX));

        let decoded = decode_data_uri(&artifact.to_data_uri()).expect("artifact should decode");
        assert_eq!(decoded.dimensions(), (2, 4));
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([100, 50, 25, 255]));
    }

    #[test]
    fn write_to_dir_creates_the_file() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let target = dir.path().join("exports");
        let artifact = ExportArtifact {
            filename: "phantasia-edit-1.png".to_string(),
            width: 1,
            height: 1,
            bytes: vec![1, 2, 3],
        };
        let path = artifact.write_to_dir(&target).expect("export should be written");
        assert_eq!(path, target.join("phantasia-edit-1.png"));
        assert_eq!(std::fs::read(path).expect("file should exist"), vec![1, 2, 3]);
    }
}
