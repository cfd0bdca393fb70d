use super::{ObjectId, Point};

pub const DEFAULT_STICKER_SIZE: f64 = 80.0;
pub const STICKER_MIN_SIZE: f64 = 20.0;
pub const STICKER_MAX_SIZE: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StickerElement {
    pub id: ObjectId,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub sticker: String,
    pub size: f64,
}

impl StickerElement {
    pub fn new(id: ObjectId, anchor: Point, sticker: impl Into<String>) -> Self {
        Self {
            id,
            x: anchor.x,
            y: anchor.y,
            rotation: 0.0,
            sticker: sticker.into(),
            size: DEFAULT_STICKER_SIZE,
        }
    }

    /// Clamps to the sticker size range; NaN restores the default.
    pub fn set_size(&mut self, size: f64) {
        self.size = if size.is_nan() {
            DEFAULT_STICKER_SIZE
        } else {
            size.clamp(STICKER_MIN_SIZE, STICKER_MAX_SIZE)
        };
    }

    pub fn apply(&mut self, patch: StickerPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if let Some(sticker) = patch.sticker {
            self.sticker = sticker;
        }
        if let Some(size) = patch.size {
            self.set_size(size);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StickerPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rotation: Option<f64>,
    pub sticker: Option<String>,
    pub size: Option<f64>,
}

impl StickerPatch {
    pub fn glyph(sticker: impl Into<String>) -> Self {
        Self {
            sticker: Some(sticker.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_patches_stay_within_range() {
        let mut sticker = StickerElement::new(2, Point::ORIGIN, "*");
        sticker.apply(StickerPatch {
            size: Some(5.0e6),
            ..StickerPatch::default()
        });
        assert_eq!(sticker.size, STICKER_MAX_SIZE);
        sticker.apply(StickerPatch {
            size: Some(1.0),
            ..StickerPatch::default()
        });
        assert_eq!(sticker.size, STICKER_MIN_SIZE);
        sticker.set_size(f64::NAN);
        assert_eq!(sticker.size, DEFAULT_STICKER_SIZE);
    }
}
