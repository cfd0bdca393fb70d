use super::{Color, ObjectId, Point};

/// The watermark is a singleton and always carries this id.
pub const WATERMARK_ID: ObjectId = 0;
pub const DEFAULT_WATERMARK_TEXT: &str = "Phantasia";
const DEFAULT_WATERMARK_OPACITY: f64 = 50.0;
const DEFAULT_WATERMARK_SIZE: f64 = 24.0;
const WATERMARK_MIN_SIZE: f64 = 8.0;
const WATERMARK_MAX_SIZE: f64 = 500.0;

/// Drag-only text stamp. The CSS font and rgba color strings are derived on
/// every read from `size`/`font` and `color`/`opacity`; nothing is cached.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkElement {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub color: Color,
    /// Percent in `0..=100`.
    pub opacity: f64,
    pub size: f64,
    pub font: String,
}

impl WatermarkElement {
    pub fn new(anchor: Point) -> Self {
        Self {
            x: anchor.x,
            y: anchor.y,
            text: DEFAULT_WATERMARK_TEXT.to_string(),
            color: Color::WHITE,
            opacity: DEFAULT_WATERMARK_OPACITY,
            size: DEFAULT_WATERMARK_SIZE,
            font: super::text::DEFAULT_TEXT_FONT_FAMILY.to_string(),
        }
    }

    pub const fn id(&self) -> ObjectId {
        WATERMARK_ID
    }

    pub fn font_string(&self) -> String {
        format!("{}px {}", self.size, self.font)
    }

    pub fn rgba_color(&self) -> String {
        self.color.to_rgba_string(self.alpha())
    }

    /// Opacity as a `0.0..=1.0` factor.
    pub fn alpha(&self) -> f64 {
        self.opacity.clamp(0.0, 100.0) / 100.0
    }

    pub fn apply(&mut self, patch: WatermarkPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(text) = patch.text {
            self.text = text;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity.clamp(0.0, 100.0);
        }
        if let Some(size) = patch.size {
            if !size.is_nan() {
                self.size = size.clamp(WATERMARK_MIN_SIZE, WATERMARK_MAX_SIZE);
            }
        }
        if let Some(font) = patch.font {
            self.font = font;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatermarkPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub text: Option<String>,
    pub color: Option<Color>,
    pub opacity: Option<f64>,
    pub size: Option<f64>,
    pub font: Option<String>,
}
