//! Raster operations that turn the current bitmap plus one pending edit into
//! the next history state.

mod export;
mod filters;
mod objects;
mod transform;

use image::{imageops, Rgba, RgbaImage};
use thiserror::Error;

use crate::geometry::{CropRegion, Size};
use crate::media::MediaError;

pub use export::{bake_export, export_filename, ExportArtifact, EXPORT_PREFIX};
pub use filters::apply_filters;
pub use objects::{apply_object_layer, LayerScale};
pub use transform::{apply_transform, apply_transform_state, TransformKind};

#[derive(Debug, Error)]
pub enum CompositorError {
    #[error("crop resolves to an empty {width}x{height} rectangle")]
    DegenerateCrop { width: u32, height: u32 },
    #[error("no font available to render {family}")]
    MissingFont { family: String },
    #[error("mask has no painted pixels")]
    EmptyMask,
    #[error("failed to encode image: {0}")]
    Encode(#[from] MediaError),
    #[error("failed to write export {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type CompositorResult<T> = std::result::Result<T, CompositorError>;

const MASK_ON: Rgba<u8> = Rgba([255, 255, 255, 255]);
const MASK_OFF: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Copies the source pixels under `region`, which is expressed in percent
/// of the image as displayed at `displayed`.
pub fn apply_crop(source: &RgbaImage, region: &CropRegion, displayed: Size) -> CompositorResult<RgbaImage> {
    let natural = Size::new(source.width(), source.height());
    let rect = region.to_source_rect(displayed, natural);
    if rect.width == 0 || rect.height == 0 {
        tracing::warn!(?region, ?displayed, "rejecting degenerate crop");
        return Err(CompositorError::DegenerateCrop {
            width: rect.width,
            height: rect.height,
        });
    }
    tracing::debug!(?rect, "cropping");
    Ok(imageops::crop_imm(source, rect.x, rect.y, rect.width, rect.height).to_image())
}

/// Hard binary mask: any painted pixel becomes opaque white, the rest
/// transparent black.
pub fn rasterize_mask(preview: &RgbaImage) -> RgbaImage {
    RgbaImage::from_fn(preview.width(), preview.height(), |x, y| {
        if preview.get_pixel(x, y)[3] > 0 {
            MASK_ON
        } else {
            MASK_OFF
        }
    })
}

/// Fails with [`CompositorError::EmptyMask`] when nothing is painted.
pub fn ensure_painted(preview: &RgbaImage) -> CompositorResult<()> {
    if preview.pixels().any(|pixel| pixel[3] > 0) {
        Ok(())
    } else {
        Err(CompositorError::EmptyMask)
    }
}

/// Brings `mask` to `size`, nearest-neighbour so coverage stays binary.
pub fn scale_mask(mask: &RgbaImage, size: Size) -> RgbaImage {
    if mask.dimensions() == (size.width, size.height) {
        mask.clone()
    } else {
        imageops::resize(mask, size.width, size.height, imageops::FilterType::Nearest)
    }
}

/// Clears alpha wherever `mask_preview` has coverage; other pixels are unchanged.
pub fn apply_erase(base: &RgbaImage, mask_preview: &RgbaImage) -> RgbaImage {
    let mask = scale_mask(mask_preview, Size::new(base.width(), base.height()));
    let mut output = base.clone();
    for (pixel, coverage) in output.pixels_mut().zip(mask.pixels()) {
        if coverage[3] > 0 {
            pixel[3] = 0;
        }
    }
    output
}
