use super::{Color, ObjectId, Point};

pub const DEFAULT_TEXT: &str = "Hello World";
pub const DEFAULT_TEXT_FONT_SIZE: f64 = 50.0;
pub const DEFAULT_TEXT_FONT_FAMILY: &str = "Arial";
pub const TEXT_MIN_FONT_SIZE: f64 = 10.0;
pub const TEXT_MAX_FONT_SIZE: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    pub id: ObjectId,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub text: String,
    pub font_family: String,
    pub font_size: f64,
    pub color: Color,
    pub bold: bool,
    pub italic: bool,
    pub shadow: bool,
    pub stroke: bool,
}

impl TextElement {
    pub fn new(id: ObjectId, anchor: Point) -> Self {
        Self {
            id,
            x: anchor.x,
            y: anchor.y,
            rotation: 0.0,
            text: DEFAULT_TEXT.to_string(),
            font_family: DEFAULT_TEXT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_TEXT_FONT_SIZE,
            color: Color::WHITE,
            bold: false,
            italic: false,
            shadow: false,
            stroke: false,
        }
    }

    pub fn set_font_size(&mut self, font_size: f64) {
        self.font_size = clamp_text_size(font_size);
    }

    pub fn apply(&mut self, patch: TextPatch) {
        let TextPatch {
            x,
            y,
            rotation,
            text,
            font_family,
            font_size,
            color,
            bold,
            italic,
            shadow,
            stroke,
        } = patch;
        if let Some(x) = x {
            self.x = x;
        }
        if let Some(y) = y {
            self.y = y;
        }
        if let Some(rotation) = rotation {
            self.rotation = rotation;
        }
        if let Some(text) = text {
            self.text = text;
        }
        if let Some(font_family) = font_family {
            self.font_family = font_family;
        }
        if let Some(font_size) = font_size {
            self.set_font_size(font_size);
        }
        if let Some(color) = color {
            self.color = color;
        }
        if let Some(bold) = bold {
            self.bold = bold;
        }
        if let Some(italic) = italic {
            self.italic = italic;
        }
        if let Some(shadow) = shadow {
            self.shadow = shadow;
        }
        if let Some(stroke) = stroke {
            self.stroke = stroke;
        }
    }
}

fn clamp_text_size(size: f64) -> f64 {
    if size.is_nan() {
        DEFAULT_TEXT_FONT_SIZE
    } else {
        size.clamp(TEXT_MIN_FONT_SIZE, TEXT_MAX_FONT_SIZE)
    }
}

/// Partial update for a [`TextElement`]; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rotation: Option<f64>,
    pub text: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub color: Option<Color>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub shadow: Option<bool>,
    pub stroke: Option<bool>,
}

impl TextPatch {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_text_uses_defaults_at_anchor() {
        let text = TextElement::new(3, Point::new(40.0, 20.0));
        assert_eq!(text.text, DEFAULT_TEXT);
        assert_eq!(text.font_size, DEFAULT_TEXT_FONT_SIZE);
        assert_eq!((text.x, text.y), (40.0, 20.0));
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut text = TextElement::new(1, Point::ORIGIN);
        text.apply(TextPatch {
            bold: Some(true),
            color: Some(Color::new(255, 0, 0)),
            ..TextPatch::default()
        });
        assert!(text.bold);
        assert!(!text.italic);
        assert_eq!(text.color, Color::new(255, 0, 0));
        assert_eq!(text.text, DEFAULT_TEXT);
    }

    #[test]
    fn font_size_is_clamped_to_range() {
        let mut text = TextElement::new(1, Point::ORIGIN);
        text.set_font_size(2.0);
        assert_eq!(text.font_size, TEXT_MIN_FONT_SIZE);
        text.set_font_size(f64::NAN);
        assert_eq!(text.font_size, DEFAULT_TEXT_FONT_SIZE);
        text.apply(TextPatch {
            font_size: Some(1.0e7),
            ..TextPatch::default()
        });
        assert_eq!(text.font_size, TEXT_MAX_FONT_SIZE);
        text.set_font_size(f64::INFINITY);
        assert_eq!(text.font_size, TEXT_MAX_FONT_SIZE);
    }
}
