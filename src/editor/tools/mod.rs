mod bitmap;
mod interaction;
mod operations;
mod query;
mod selection;
mod sticker;
mod text;
mod watermark;

use thiserror::Error;

use crate::text::{measure_text, FontBook};

pub use crate::geometry::{Color, Point, Size};
pub use bitmap::{ImageElement, ImagePatch, IMAGE_MAX_SIZE, IMAGE_MIN_SIZE};
pub use interaction::{
    hit_test, Interaction, InteractionMode, HANDLE_SIZE, ROTATION_HANDLE_OFFSET,
    SELECTION_PADDING,
};
pub use selection::SelectionState;
pub use sticker::{
    StickerElement, StickerPatch, DEFAULT_STICKER_SIZE, STICKER_MAX_SIZE, STICKER_MIN_SIZE,
};
pub use text::{
    TextElement, TextPatch, DEFAULT_TEXT, DEFAULT_TEXT_FONT_FAMILY, DEFAULT_TEXT_FONT_SIZE,
    TEXT_MAX_FONT_SIZE, TEXT_MIN_FONT_SIZE,
};
pub use watermark::{WatermarkElement, WatermarkPatch, DEFAULT_WATERMARK_TEXT, WATERMARK_ID};

pub type ObjectId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Text,
    Sticker,
    Image,
    Watermark,
}

impl ObjectKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Sticker => "sticker",
            Self::Image => "image",
            Self::Watermark => "watermark",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayObject {
    Text(TextElement),
    Sticker(StickerElement),
    Image(ImageElement),
    Watermark(WatermarkElement),
}

impl OverlayObject {
    pub const fn id(&self) -> ObjectId {
        match self {
            Self::Text(text) => text.id,
            Self::Sticker(sticker) => sticker.id,
            Self::Image(image) => image.id,
            Self::Watermark(watermark) => watermark.id(),
        }
    }

    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Text(_) => ObjectKind::Text,
            Self::Sticker(_) => ObjectKind::Sticker,
            Self::Image(_) => ObjectKind::Image,
            Self::Watermark(_) => ObjectKind::Watermark,
        }
    }

    pub const fn anchor(&self) -> Point {
        match self {
            Self::Text(text) => Point::new(text.x, text.y),
            Self::Sticker(sticker) => Point::new(sticker.x, sticker.y),
            Self::Image(image) => Point::new(image.x, image.y),
            Self::Watermark(watermark) => Point::new(watermark.x, watermark.y),
        }
    }

    /// Rotation in degrees; the watermark is never rotated.
    pub const fn rotation(&self) -> f64 {
        match self {
            Self::Text(text) => text.rotation,
            Self::Sticker(sticker) => sticker.rotation,
            Self::Image(image) => image.rotation,
            Self::Watermark(_) => 0.0,
        }
    }

    fn set_anchor(&mut self, anchor: Point) {
        let (x, y) = match self {
            Self::Text(text) => (&mut text.x, &mut text.y),
            Self::Sticker(sticker) => (&mut sticker.x, &mut sticker.y),
            Self::Image(image) => (&mut image.x, &mut image.y),
            Self::Watermark(watermark) => (&mut watermark.x, &mut watermark.y),
        };
        *x = anchor.x;
        *y = anchor.y;
    }

    /// Unpadded width and height in display pixels.
    pub fn extents(&self, fonts: &FontBook) -> (f64, f64) {
        match self {
            Self::Text(text) => measure_text(
                fonts.resolve(&text.font_family),
                &text.text,
                text.font_size,
            ),
            Self::Sticker(sticker) => (sticker.size, sticker.size),
            Self::Image(image) => (image.width, image.height),
            Self::Watermark(watermark) => measure_text(
                fonts.resolve(&watermark.font),
                &watermark.text,
                watermark.size,
            ),
        }
    }

    fn as_text(&self) -> Option<&TextElement> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    fn as_sticker(&self) -> Option<&StickerElement> {
        match self {
            Self::Sticker(sticker) => Some(sticker),
            _ => None,
        }
    }

    fn as_image(&self) -> Option<&ImageElement> {
        match self {
            Self::Image(image) => Some(image),
            _ => None,
        }
    }
}

/// Initial properties for [`OverlayObjects::add`].
#[derive(Debug, Clone, PartialEq)]
pub enum NewObject {
    Text(TextPatch),
    Sticker(String),
    Image {
        src: String,
        bitmap: std::sync::Arc<image::RgbaImage>,
    },
    Watermark(WatermarkPatch),
}

impl NewObject {
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Text(_) => ObjectKind::Text,
            Self::Sticker(_) => ObjectKind::Sticker,
            Self::Image { .. } => ObjectKind::Image,
            Self::Watermark(_) => ObjectKind::Watermark,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectPatch {
    Text(TextPatch),
    Sticker(StickerPatch),
    Image(ImagePatch),
    Watermark(WatermarkPatch),
}

impl ObjectPatch {
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Text(_) => ObjectKind::Text,
            Self::Sticker(_) => ObjectKind::Sticker,
            Self::Image(_) => ObjectKind::Image,
            Self::Watermark(_) => ObjectKind::Watermark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("overlay object {id} not found")]
    ObjectNotFound { id: ObjectId },
    #[error("cannot apply a {patch} patch to {target} object {id}")]
    PatchMismatch {
        id: ObjectId,
        target: ObjectKind,
        patch: ObjectKind,
    },
}

/// Overlay objects of one objects-mode session, in z-order. The watermark
/// lives in its own slot and always renders on top.
#[derive(Debug, Clone)]
pub struct OverlayObjects {
    objects: Vec<OverlayObject>,
    watermark: Option<WatermarkElement>,
    next_id: ObjectId,
    selection: SelectionState,
    canvas: Size,
    interaction: Option<Interaction>,
}

impl Default for OverlayObjects {
    fn default() -> Self {
        Self::new(Size::new(0, 0))
    }
}

impl OverlayObjects {
    pub fn new(canvas: Size) -> Self {
        Self {
            objects: Vec::new(),
            watermark: None,
            next_id: WATERMARK_ID + 1,
            selection: SelectionState::default(),
            canvas,
            interaction: None,
        }
    }

    fn allocate_id(&mut self) -> ObjectId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    fn find_object_ref<T>(
        &self,
        id: ObjectId,
        projector: fn(&OverlayObject) -> Option<&T>,
    ) -> Option<&T> {
        self.objects.iter().find_map(|object| {
            if object.id() == id {
                projector(object)
            } else {
                None
            }
        })
    }

    /// Canvas (display) size new objects are centered on.
    pub const fn canvas(&self) -> Size {
        self.canvas
    }

    pub fn set_canvas(&mut self, canvas: Size) {
        self.canvas = canvas;
    }

    fn default_anchor(&self) -> Point {
        if self.canvas.is_empty() {
            Point::ORIGIN
        } else {
            self.canvas.center()
        }
    }

    /// Drops every object, the watermark and any selection.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.watermark = None;
        self.selection.clear();
        self.interaction = None;
    }
}
