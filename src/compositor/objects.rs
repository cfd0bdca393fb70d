use image::RgbaImage;

use super::transform::draw_affine;
use super::{CompositorError, CompositorResult};
use crate::editor::tools::{OverlayObject, StickerElement, TextElement, WatermarkElement};
use crate::geometry::{Affine, Color};
use crate::text::{render_text, FontBook, TextStyle};

/// Horizontal shear applied to synthesize italics.
const ITALIC_SKEW: f64 = -0.2;
const STROKE_COLOR: Color = Color::BLACK;

/// Display-to-source factors used when baking overlays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerScale {
    pub x: f64,
    pub y: f64,
}

impl LayerScale {
    pub const IDENTITY: LayerScale = LayerScale { x: 1.0, y: 1.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Factor for lengths that must stay isotropic (font and sticker sizes).
    fn uniform(self) -> f64 {
        (self.x + self.y) / 2.0
    }
}

/// Bakes `objects` (in paint order) and then the watermark onto a copy of `source`.
pub fn apply_object_layer(
    source: &RgbaImage,
    objects: &[OverlayObject],
    watermark: Option<&WatermarkElement>,
    scale: LayerScale,
    fonts: &FontBook,
) -> CompositorResult<RgbaImage> {
    let mut canvas = source.clone();
    for object in objects {
        match object {
            OverlayObject::Text(text) => draw_text(&mut canvas, text, scale, fonts)?,
            OverlayObject::Sticker(sticker) => draw_sticker(&mut canvas, sticker, scale, fonts)?,
            OverlayObject::Image(image) => {
                let bitmap = image.bitmap.as_ref();
                let transform = Affine::translate(
                    -f64::from(bitmap.width()) / 2.0,
                    -f64::from(bitmap.height()) / 2.0,
                )
                .then(Affine::scale(
                    image.width * scale.x / f64::from(bitmap.width().max(1)),
                    image.height * scale.y / f64::from(bitmap.height().max(1)),
                ))
                .then(Affine::rotate_degrees(image.rotation))
                .then(Affine::translate(image.x * scale.x, image.y * scale.y));
                draw_affine(&mut canvas, bitmap, transform, 1.0);
            }
            OverlayObject::Watermark(watermark) => draw_watermark(&mut canvas, watermark, scale, fonts)?,
        }
    }
    if let Some(watermark) = watermark {
        draw_watermark(&mut canvas, watermark, scale, fonts)?;
    }
    tracing::debug!(
        objects = objects.len(),
        watermark = watermark.is_some(),
        "baked overlay layer"
    );
    Ok(canvas)
}

fn centered_on(sprite: &RgbaImage, x: f64, y: f64, rotation: f64, skew: f64) -> Affine {
    Affine::translate(
        -f64::from(sprite.width()) / 2.0,
        -f64::from(sprite.height()) / 2.0,
    )
    .then(Affine::skew_x(skew))
    .then(Affine::rotate_degrees(rotation))
    .then(Affine::translate(x, y))
}

fn draw_text(
    canvas: &mut RgbaImage,
    text: &TextElement,
    scale: LayerScale,
    fonts: &FontBook,
) -> CompositorResult<()> {
    let font = fonts
        .resolve(&text.font_family)
        .ok_or_else(|| CompositorError::MissingFont {
            family: text.font_family.clone(),
        })?;
    let style = TextStyle {
        font_size: (text.font_size * scale.uniform()) as f32,
        color: text.color.with_alpha(255),
        bold: text.bold,
        shadow: text.shadow,
        stroke: text.stroke.then(|| STROKE_COLOR.with_alpha(255)),
    };
    let sprite = render_text(font, &text.text, style);
    let skew = if text.italic { ITALIC_SKEW } else { 0.0 };
    let transform = centered_on(&sprite, text.x * scale.x, text.y * scale.y, text.rotation, skew);
    draw_affine(canvas, &sprite, transform, 1.0);
    Ok(())
}

/// Stickers are single glyphs drawn as white fill with a dark outline.
fn draw_sticker(
    canvas: &mut RgbaImage,
    sticker: &StickerElement,
    scale: LayerScale,
    fonts: &FontBook,
) -> CompositorResult<()> {
    let font = fonts
        .resolve("")
        .ok_or_else(|| CompositorError::MissingFont {
            family: "sticker".to_string(),
        })?;
    let style = TextStyle {
        font_size: (sticker.size * scale.uniform()) as f32,
        color: Color::WHITE.with_alpha(255),
        bold: false,
        shadow: false,
        stroke: Some(STROKE_COLOR.with_alpha(255)),
    };
    let sprite = render_text(font, &sticker.sticker, style);
    let transform = centered_on(&sprite, sticker.x * scale.x, sticker.y * scale.y, sticker.rotation, 0.0);
    draw_affine(canvas, &sprite, transform, 1.0);
    Ok(())
}

fn draw_watermark(
    canvas: &mut RgbaImage,
    watermark: &WatermarkElement,
    scale: LayerScale,
    fonts: &FontBook,
) -> CompositorResult<()> {
    let font = fonts
        .resolve(&watermark.font)
        .ok_or_else(|| CompositorError::MissingFont {
            family: watermark.font.clone(),
        })?;
    let style = TextStyle {
        font_size: (watermark.size * scale.uniform()) as f32,
        color: watermark.color.with_alpha(255),
        bold: false,
        shadow: false,
        stroke: None,
    };
    let sprite = render_text(font, &watermark.text, style);
    let transform = centered_on(&sprite, watermark.x * scale.x, watermark.y * scale.y, 0.0, 0.0);
    draw_affine(canvas, &sprite, transform, watermark.alpha() as f32);
    Ok(())
}
