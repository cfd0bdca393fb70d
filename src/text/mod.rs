//! Font loading, text measurement and glyph rasterization.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use image::{imageops, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::distance_transform::euclidean_squared_distance_transform;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextError {
    #[error("failed to read font file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("font data for {family} is not a valid font")]
    InvalidFont { family: String },
}

pub type TextResult<T> = std::result::Result<T, TextError>;

/// Average advance used when no font is loaded, as a fraction of the font size.
const FALLBACK_CHAR_WIDTH: f64 = 0.62;
const FALLBACK_LINE_HEIGHT: f64 = 1.2;
const BOLD_DILATION: f32 = 0.04;
const SHADOW_OFFSET: f32 = 0.04;
const SHADOW_SIGMA: f32 = 0.06;
const SHADOW_ALPHA: f32 = 0.5;
const STROKE_WIDTH: f32 = 1.0 / 15.0;
/// Rendered glyph size ceiling, applied after display-to-source scaling.
pub const MAX_RENDER_FONT_SIZE: f32 = 2048.0;

/// Loaded fonts keyed by normalized family name.
#[derive(Clone, Default)]
pub struct FontBook {
    fonts: BTreeMap<String, FontArc>,
    fallback: Option<String>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("families", &self.fonts.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every readable font in `paths`; unreadable entries are logged and skipped.
    pub fn load_paths(paths: &[PathBuf]) -> Self {
        let mut book = Self::new();
        for path in paths {
            if let Err(err) = book.load_file(path) {
                tracing::warn!(?path, %err, "skipping font");
            }
        }
        tracing::debug!(families = book.fonts.len(), "font book loaded");
        book
    }

    pub fn load_file(&mut self, path: &Path) -> TextResult<()> {
        let bytes = std::fs::read(path).map_err(|source| TextError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let family = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("font")
            .to_string();
        self.add_font(&family, bytes)
    }

    pub fn add_font(&mut self, family: &str, bytes: Vec<u8>) -> TextResult<()> {
        let font = FontArc::try_from_vec(bytes).map_err(|_| TextError::InvalidFont {
            family: family.to_string(),
        })?;
        let key = normalize_family(family);
        if self.fallback.is_none() {
            self.fallback = Some(key.clone());
        }
        self.fonts.insert(key, font);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Looks up `family`, falling back to the first loaded font.
    pub fn resolve(&self, family: &str) -> Option<&FontArc> {
        self.fonts.get(&normalize_family(family)).or_else(|| {
            self.fallback
                .as_ref()
                .and_then(|fallback| self.fonts.get(fallback))
        })
    }
}

fn normalize_family(family: &str) -> String {
    family
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn lines_of(text: &str) -> Vec<&str> {
    if text.is_empty() {
        vec![""]
    } else {
        text.split('\n').collect()
    }
}

fn line_advance(font: &FontArc, line: &str, font_size: f32) -> f32 {
    let scaled = font.as_scaled(PxScale::from(font_size));
    let mut width = 0.0_f32;
    let mut previous = None;
    for ch in line.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = previous {
            width += scaled.kern(prev, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        previous = Some(glyph_id);
    }
    width
}

/// Width and height of `text` at `font_size`, using an average-advance
/// estimate when no font is available.
pub fn measure_text(font: Option<&FontArc>, text: &str, font_size: f64) -> (f64, f64) {
    let lines = lines_of(text);
    let size = font_size.max(1.0);
    match font {
        Some(font) => {
            let scaled = font.as_scaled(PxScale::from(size as f32));
            let width = lines
                .iter()
                .map(|line| f64::from(line_advance(font, line, size as f32)))
                .fold(0.0, f64::max);
            let height = f64::from(scaled.height()) * lines.len() as f64;
            (width.max(1.0), height.max(size))
        }
        None => {
            let width = lines
                .iter()
                .map(|line| line.chars().count() as f64 * size * FALLBACK_CHAR_WIDTH)
                .fold(0.0, f64::max);
            let height = lines.len() as f64 * size * FALLBACK_LINE_HEIGHT;
            (width.max(1.0), height)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub color: [u8; 4],
    pub bold: bool,
    pub shadow: bool,
    pub stroke: Option<[u8; 4]>,
}

/// Anti-aliased coverage in `0.0..=1.0`, row-major.
#[derive(Clone)]
struct Coverage {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Coverage {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    fn get(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return 0.0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    fn accumulate(&mut self, x: i64, y: i64, value: f32) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let slot = &mut self.data[y as usize * self.width as usize + x as usize];
        *slot = (*slot + value).min(1.0);
    }

    /// Grows the glyph silhouette by `radius` pixels with an anti-aliased edge.
    fn dilated(&self, radius: u32) -> Coverage {
        if radius == 0 {
            return self.clone();
        }
        let solid = GrayImage::from_fn(self.width, self.height, |x, y| {
            let inside = self.data[y as usize * self.width as usize + x as usize] >= 0.5;
            Luma([if inside { 255 } else { 0 }])
        });
        let distances = euclidean_squared_distance_transform(&solid);
        let reach = radius as f32 + 0.5;
        let data = self
            .data
            .iter()
            .zip(distances.pixels())
            .map(|(&value, distance)| {
                let edge = (reach - (distance[0] as f32).sqrt()).clamp(0.0, 1.0);
                value.max(edge)
            })
            .collect();
        Coverage {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Max over the `pixels` columns to the left, one pass per row.
    fn widened(&self, pixels: u32) -> Coverage {
        let width = self.width as usize;
        let window = pixels as usize + 1;
        let mut out = Coverage::new(self.width, self.height);
        let mut prefix = vec![0.0_f32; width];
        let mut suffix = vec![0.0_f32; width];
        for (row, target) in self
            .data
            .chunks_exact(width)
            .zip(out.data.chunks_exact_mut(width))
        {
            for x in 0..width {
                prefix[x] = if x % window == 0 {
                    row[x]
                } else {
                    prefix[x - 1].max(row[x])
                };
            }
            for x in (0..width).rev() {
                suffix[x] = if x % window == window - 1 || x == width - 1 {
                    row[x]
                } else {
                    suffix[x + 1].max(row[x])
                };
            }
            for x in 0..width {
                target[x] = match x.checked_sub(pixels as usize) {
                    Some(start) => suffix[start].max(prefix[x]),
                    None => prefix[x],
                };
            }
        }
        out
    }

    fn blurred(&self, sigma: f32) -> Coverage {
        let gray = GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([(self.get(i64::from(x), i64::from(y)) * 255.0).round() as u8])
        });
        let blurred = imageops::fast_blur(&gray, sigma);
        Coverage {
            width: self.width,
            height: self.height,
            data: blurred.pixels().map(|p| f32::from(p[0]) / 255.0).collect(),
        }
    }
}

fn rasterize_coverage(font: &FontArc, text: &str, font_size: f32, pad: u32) -> Coverage {
    let scaled = font.as_scaled(PxScale::from(font_size));
    let lines = lines_of(text);
    let line_height = scaled.height();
    let widths = lines
        .iter()
        .map(|line| line_advance(font, line, font_size))
        .collect::<Vec<_>>();
    let max_width = widths.iter().copied().fold(1.0_f32, f32::max);
    let width = (max_width.ceil() as u32).saturating_add(pad * 2).max(1);
    let height = ((line_height * lines.len() as f32).ceil() as u32)
        .saturating_add(pad * 2)
        .max(1);

    let mut coverage = Coverage::new(width, height);
    for (index, (line, line_width)) in lines.iter().zip(&widths).enumerate() {
        let baseline = pad as f32 + index as f32 * line_height + scaled.ascent();
        let mut cursor = pad as f32 + (max_width - line_width) / 2.0;
        let mut previous = None;
        for ch in line.chars() {
            let glyph_id = font.glyph_id(ch);
            if let Some(prev) = previous {
                cursor += scaled.kern(prev, glyph_id);
            }
            let glyph = glyph_id.with_scale_and_position(font_size, point(cursor, baseline));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                let origin_x = bounds.min.x.floor() as i64;
                let origin_y = bounds.min.y.floor() as i64;
                outlined.draw(|gx, gy, value| {
                    coverage.accumulate(origin_x + i64::from(gx), origin_y + i64::from(gy), value);
                });
            }
            cursor += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }
    }
    coverage
}

fn paint_coverage(target: &mut RgbaImage, coverage: &Coverage, color: [u8; 4], offset: (i64, i64)) {
    let base_alpha = f32::from(color[3]) / 255.0;
    for (x, y, pixel) in target.enumerate_pixels_mut() {
        let value = coverage.get(i64::from(x) - offset.0, i64::from(y) - offset.1);
        if value <= 0.0 {
            continue;
        }
        blend_over(pixel, color, value * base_alpha);
    }
}

/// Source-over blend of `color` at `alpha` onto `pixel` (straight alpha).
pub(crate) fn blend_over(pixel: &mut Rgba<u8>, color: [u8; 4], alpha: f32) {
    let src_a = alpha.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }
    let dst_a = f32::from(pixel[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        *pixel = Rgba([0, 0, 0, 0]);
        return;
    }
    for channel in 0..3 {
        let src = f32::from(color[channel]);
        let dst = f32::from(pixel[channel]);
        let value = (src * src_a + dst * dst_a * (1.0 - src_a)) / out_a;
        pixel[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    pixel[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Renders `text` into a sprite whose center is the center of the text block.
///
/// Pass order is shadow, stroke, then fill so the fill always sits on top.
pub fn render_text(font: &FontArc, text: &str, style: TextStyle) -> RgbaImage {
    let font_size = if style.font_size.is_finite() {
        style.font_size.clamp(1.0, MAX_RENDER_FONT_SIZE)
    } else {
        1.0
    };
    let stroke_radius = if style.stroke.is_some() {
        (font_size * STROKE_WIDTH).ceil().max(1.0) as u32
    } else {
        0
    };
    let shadow_offset = if style.shadow {
        (font_size * SHADOW_OFFSET).ceil().max(1.0) as u32
    } else {
        0
    };
    let shadow_sigma = (font_size * SHADOW_SIGMA).max(0.5);
    let blur_margin = if style.shadow {
        (shadow_sigma * 3.0).ceil() as u32
    } else {
        0
    };
    let bold_pixels = if style.bold {
        (font_size * BOLD_DILATION).ceil().max(1.0) as u32
    } else {
        0
    };
    let pad = stroke_radius + shadow_offset + blur_margin + bold_pixels + 1;

    let mut fill = rasterize_coverage(font, text, font_size, pad);
    if bold_pixels > 0 {
        fill = fill.widened(bold_pixels);
    }
    let mut sprite = RgbaImage::new(fill.width, fill.height);

    let outline = fill.dilated(stroke_radius);
    if style.shadow {
        let silhouette = outline.blurred(shadow_sigma);
        let offset = i64::from(shadow_offset);
        let shadow_color = [0, 0, 0, (SHADOW_ALPHA * 255.0) as u8];
        paint_coverage(&mut sprite, &silhouette, shadow_color, (offset, offset));
    }
    if let Some(stroke_color) = style.stroke {
        paint_coverage(&mut sprite, &outline, stroke_color, (0, 0));
    }
    paint_coverage(&mut sprite, &fill, style.color, (0, 0));
    sprite
}

/// Font book holding the bundled DejaVu Sans test fixture.
#[cfg(test)]
pub(crate) fn test_font_book() -> FontBook {
    let bytes = include_bytes!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/DejaVuSans.ttf"
    ));
    let mut book = FontBook::new();
    book.add_font("DejaVu Sans", bytes.to_vec())
        .expect("bundled test font should parse");
    book
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn fallback_measurement_scales_with_characters_and_lines() {
        let (width, height) = measure_text(None, "Hello", 50.0);
        assert!((width - 5.0 * 50.0 * FALLBACK_CHAR_WIDTH).abs() < 1e-9);
        assert!((height - 50.0 * FALLBACK_LINE_HEIGHT).abs() < 1e-9);

        let (_, two_lines) = measure_text(None, "a\nb", 50.0);
        assert!((two_lines - 2.0 * height).abs() < 1e-9);
    }

    #[test]
    fn empty_font_book_resolves_nothing() {
        let book = FontBook::new();
        assert!(book.is_empty());
        assert!(book.resolve("Inter").is_none());
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        let mut book = FontBook::new();
        let err = book
            .add_font("Broken", vec![0, 1, 2, 3])
            .expect_err("garbage should not parse as a font");
        assert!(matches!(err, TextError::InvalidFont { .. }));
        assert!(book.is_empty());
    }

    #[test]
    fn family_lookup_ignores_case_and_separators() {
        assert_eq!(normalize_family("Open Sans-Bold"), "opensansbold");
    }

    #[test]
    fn blend_over_transparent_takes_source_color() {
        let mut pixel = Rgba([0, 0, 0, 0]);
        blend_over(&mut pixel, [255, 0, 0, 255], 1.0);
        assert_eq!(pixel, Rgba([255, 0, 0, 255]));

        let mut half = Rgba([0, 0, 255, 255]);
        blend_over(&mut half, [255, 0, 0, 255], 0.5);
        assert_eq!(half[3], 255);
        assert!(half[0] > 120 && half[0] < 135);
    }

    #[test]
    fn dilation_spreads_coverage_by_radius() {
        let mut coverage = Coverage::new(9, 9);
        coverage.data[4 * 9 + 4] = 1.0;
        let dilated = coverage.dilated(2);
        assert_eq!(dilated.get(5, 4), 1.0);
        assert_eq!(dilated.get(6, 4), 0.5);
        assert_eq!(dilated.get(4, 2), 0.5);
        assert_eq!(dilated.get(6, 6), 0.0);
        assert_eq!(dilated.get(4, 4), 1.0);
    }

    #[test]
    fn widening_extends_coverage_to_the_right_only() {
        let mut coverage = Coverage::new(12, 1);
        coverage.data[3] = 1.0;
        coverage.data[8] = 0.4;
        let widened = coverage.widened(2);
        let row = (0..12).map(|x| widened.get(x, 0)).collect::<Vec<_>>();
        assert_eq!(
            row,
            vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.4, 0.4, 0.4, 0.0]
        );
    }

    #[test]
    fn real_font_resolves_as_fallback_and_measures_glyphs() {
        let book = test_font_book();
        assert!(book.resolve("dejavu-sans").is_some());
        let font = book.resolve("Missing Family").expect("first font is the fallback");
        let (narrow, _) = measure_text(Some(font), "i", 40.0);
        let (wide, height) = measure_text(Some(font), "WWW", 40.0);
        assert!(wide > narrow * 3.0);
        assert!(height >= 40.0);
    }

    #[test]
    fn rendered_fill_sits_over_its_stroke() {
        let book = test_font_book();
        let font = book.resolve("DejaVu Sans").expect("font loaded");
        let style = TextStyle {
            font_size: 60.0,
            color: [255, 255, 255, 255],
            bold: false,
            shadow: false,
            stroke: Some([0, 0, 0, 255]),
        };
        let sprite = render_text(font, "H", style);
        let white = sprite
            .pixels()
            .filter(|p| p[3] == 255 && p[0] > 240)
            .count();
        let black = sprite
            .pixels()
            .filter(|p| p[3] == 255 && p[0] < 15)
            .count();
        assert!(white > 100, "fill missing: {white} white pixels");
        assert!(black > 100, "stroke missing: {black} black pixels");
    }

    #[test]
    fn large_styled_text_renders_in_bounded_time() {
        let book = test_font_book();
        let font = book.resolve("DejaVu Sans").expect("font loaded");
        let style = TextStyle {
            font_size: 1000.0,
            color: [255, 255, 255, 255],
            bold: true,
            shadow: true,
            stroke: Some([0, 0, 0, 255]),
        };
        let started = Instant::now();
        let sprite = render_text(font, "Hi", style);
        let elapsed = started.elapsed();
        assert!(sprite.width() > 1000 && sprite.height() > 1000);
        assert!(
            elapsed < Duration::from_secs(30),
            "render took {elapsed:?}"
        );
    }

    #[test]
    fn render_size_is_capped() {
        let book = test_font_book();
        let font = book.resolve("DejaVu Sans").expect("font loaded");
        let style = TextStyle {
            font_size: 1.0e9,
            color: [255, 255, 255, 255],
            bold: false,
            shadow: false,
            stroke: None,
        };
        let sprite = render_text(font, "i", style);
        assert!(sprite.height() < (MAX_RENDER_FONT_SIZE * 2.0) as u32);
    }
}
