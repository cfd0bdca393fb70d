use image::{imageops, Rgba, RgbaImage};

use crate::editor::adjustments::TransformState;
use crate::geometry::{quarter_turns, rotated_canvas_extents, Affine, Point};
use crate::text::blend_over;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformKind {
    /// Clockwise rotation in degrees.
    Rotate(f64),
    FlipHorizontal,
    FlipVertical,
}

/// Rotates or flips `source` into a new bitmap. Quarter turns permute pixels
/// exactly; other angles resample bilinearly into the rotated bounding box.
pub fn apply_transform(source: &RgbaImage, kind: TransformKind) -> RgbaImage {
    match kind {
        TransformKind::FlipHorizontal => imageops::flip_horizontal(source),
        TransformKind::FlipVertical => imageops::flip_vertical(source),
        TransformKind::Rotate(degrees) => rotate(source, degrees),
    }
}

fn rotate(source: &RgbaImage, degrees: f64) -> RgbaImage {
    match quarter_turns(degrees) {
        Some(0) => source.clone(),
        Some(1) => imageops::rotate90(source),
        Some(2) => imageops::rotate180(source),
        Some(_) => imageops::rotate270(source),
        None => {
            let extents = rotated_canvas_extents(source.width(), source.height(), degrees);
            let mut canvas = RgbaImage::new(extents.width.max(1), extents.height.max(1));
            let transform = Affine::translate(
                -f64::from(source.width()) / 2.0,
                -f64::from(source.height()) / 2.0,
            )
            .then(Affine::rotate_degrees(degrees))
            .then(Affine::translate(
                f64::from(canvas.width()) / 2.0,
                f64::from(canvas.height()) / 2.0,
            ));
            draw_affine(&mut canvas, source, transform, 1.0);
            canvas
        }
    }
}

/// Applies a pending export transform: flips in the image frame, then rotation.
pub fn apply_transform_state(source: &RgbaImage, transform: &TransformState) -> RgbaImage {
    let mut output = source.clone();
    if transform.is_flipped_horizontally() {
        output = apply_transform(&output, TransformKind::FlipHorizontal);
    }
    if transform.is_flipped_vertically() {
        output = apply_transform(&output, TransformKind::FlipVertical);
    }
    apply_transform(&output, TransformKind::Rotate(transform.rotate))
}

/// Source-over draws `sprite` onto `target` through `transform` (sprite
/// pixel space to target pixel space), sampling bilinearly.
pub(crate) fn draw_affine(target: &mut RgbaImage, sprite: &RgbaImage, transform: Affine, opacity: f32) {
    let Some(inverse) = transform.invert() else {
        return;
    };
    let sprite_w = f64::from(sprite.width());
    let sprite_h = f64::from(sprite.height());
    let corners = [
        transform.apply(Point::new(0.0, 0.0)),
        transform.apply(Point::new(sprite_w, 0.0)),
        transform.apply(Point::new(0.0, sprite_h)),
        transform.apply(Point::new(sprite_w, sprite_h)),
    ];
    let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min).floor().max(0.0);
    let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min).floor().max(0.0);
    let max_x = corners
        .iter()
        .map(|p| p.x)
        .fold(f64::NEG_INFINITY, f64::max)
        .ceil()
        .min(f64::from(target.width()));
    let max_y = corners
        .iter()
        .map(|p| p.y)
        .fold(f64::NEG_INFINITY, f64::max)
        .ceil()
        .min(f64::from(target.height()));
    if min_x >= max_x || min_y >= max_y {
        return;
    }

    for y in min_y as u32..max_y as u32 {
        for x in min_x as u32..max_x as u32 {
            let source = inverse.apply(Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5));
            let sample = bilinear_sample(sprite, source.x as f32 - 0.5, source.y as f32 - 0.5);
            if sample[3] == 0 {
                continue;
            }
            let alpha = f32::from(sample[3]) / 255.0 * opacity;
            blend_over(target.get_pixel_mut(x, y), sample.0, alpha);
        }
    }
}

/// Bilinear interpolation sampling from an RgbaImage; outside pixels are transparent.
fn bilinear_sample(img: &RgbaImage, x: f32, y: f32) -> Rgba<u8> {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let sample = |sx: i32, sy: i32| -> [f32; 4] {
        if sx < 0 || sy < 0 || sx >= img.width() as i32 || sy >= img.height() as i32 {
            [0.0; 4]
        } else {
            let p = img.get_pixel(sx as u32, sy as u32);
            [
                f32::from(p[0]) * f32::from(p[3]),
                f32::from(p[1]) * f32::from(p[3]),
                f32::from(p[2]) * f32::from(p[3]),
                f32::from(p[3]),
            ]
        }
    };

    let tl = sample(x0, y0);
    let tr = sample(x0 + 1, y0);
    let bl = sample(x0, y0 + 1);
    let br = sample(x0 + 1, y0 + 1);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let mut premultiplied = [0.0_f32; 4];
    for (c, value) in premultiplied.iter_mut().enumerate() {
        let top = lerp(tl[c], tr[c], fx);
        let bot = lerp(bl[c], br[c], fx);
        *value = lerp(top, bot, fy);
    }
    let alpha = premultiplied[3];
    if alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    Rgba([
        (premultiplied[0] / alpha).round().clamp(0.0, 255.0) as u8,
        (premultiplied[1] / alpha).round().clamp(0.0, 255.0) as u8,
        (premultiplied[2] / alpha).round().clamp(0.0, 255.0) as u8,
        alpha.round().clamp(0.0, 255.0) as u8,
    ])
}
