use std::sync::Arc;

use image::RgbaImage;

use super::{ObjectId, Point, Size};

pub const IMAGE_MIN_SIZE: f64 = 20.0;
/// Neither side of a placed image may exceed this.
pub const IMAGE_MAX_SIZE: f64 = 8192.0;
/// Newly placed images fit within this fraction of the canvas width.
const IMAGE_INITIAL_CANVAS_FRACTION: f64 = 0.5;

/// An embedded bitmap placed on the canvas. `bitmap` is the decoded `src`,
/// cached so compositing never decodes again.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageElement {
    pub id: ObjectId,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub src: String,
    pub bitmap: Arc<RgbaImage>,
    pub width: f64,
    pub height: f64,
}

impl ImageElement {
    pub fn new(id: ObjectId, anchor: Point, src: String, bitmap: Arc<RgbaImage>, canvas: Size) -> Self {
        let (width, height) = initial_image_size(
            Size::new(bitmap.width(), bitmap.height()),
            canvas,
        );
        Self {
            id,
            x: anchor.x,
            y: anchor.y,
            rotation: 0.0,
            src,
            bitmap,
            width,
            height,
        }
    }

    /// Resizes proportionally. The width floor wins over the side cap for
    /// extreme aspect ratios; NaN is ignored.
    pub fn set_width(&mut self, width: f64) {
        if width.is_nan() {
            return;
        }
        let aspect = self.height / self.width.max(f64::EPSILON);
        let widest = (IMAGE_MAX_SIZE / aspect.max(1.0)).max(IMAGE_MIN_SIZE);
        let width = width.clamp(IMAGE_MIN_SIZE, widest);
        self.width = width;
        self.height = width * aspect;
    }

    pub fn apply(&mut self, patch: ImagePatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if let Some(width) = patch.width {
            self.set_width(width);
        }
    }
}

fn initial_image_size(natural: Size, canvas: Size) -> (f64, f64) {
    let natural_width = f64::from(natural.width.max(1));
    let natural_height = f64::from(natural.height.max(1));
    let max_width = (f64::from(canvas.width) * IMAGE_INITIAL_CANVAS_FRACTION).max(IMAGE_MIN_SIZE);
    let width = natural_width.min(max_width).max(IMAGE_MIN_SIZE);
    (width, width / natural_width * natural_height)
}

/// Image objects only move, rotate or resize proportionally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImagePatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rotation: Option<f64>,
    pub width: Option<f64>,
}
