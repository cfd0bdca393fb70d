/// Shared geometric and color primitives used across editor and compositor modules.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Rotates `self` around `center` by `degrees` (clockwise in screen space).
    pub fn rotated_about(self, center: Point, degrees: f64) -> Point {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        Point::new(
            center.x + dx * cos - dy * sin,
            center.y + dx * sin + dy * cos,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// Pixel rectangle in source space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn with_alpha(self, alpha: u8) -> [u8; 4] {
        [self.r, self.g, self.b, alpha]
    }

    /// Parses `#rgb`, `#rrggbb` or `rgb(...)`/`rgba(...)` strings. Alpha is ignored.
    pub fn parse(value: &str) -> Option<Color> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex);
        }
        let inner = value
            .strip_prefix("rgba(")
            .or_else(|| value.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let mut channels = inner.split(',').map(|part| part.trim().parse::<u8>());
        let r = channels.next()?.ok()?;
        let g = channels.next()?.ok()?;
        let b = channels.next()?.ok()?;
        Some(Color::new(r, g, b))
    }

    /// Formats as a CSS `rgba()` string with `opacity` in `0.0..=1.0`.
    pub fn to_rgba_string(self, opacity: f64) -> String {
        let alpha = (opacity.clamp(0.0, 1.0) * 100.0).round() / 100.0;
        format!("rgba({}, {}, {}, {alpha})", self.r, self.g, self.b)
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let expand = |digit: u8| digit * 16 + digit;
    match hex.len() {
        3 => {
            let digits = hex
                .chars()
                .map(|c| c.to_digit(16).map(|d| d as u8))
                .collect::<Option<Vec<_>>>()?;
            Some(Color::new(
                expand(digits[0]),
                expand(digits[1]),
                expand(digits[2]),
            ))
        }
        6 => {
            let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
            Some(Color::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
        }
        _ => None,
    }
}

/// Ratio between natural (source) and displayed dimension. A zero display
/// dimension yields the identity factor.
pub fn scale_factor(display_dim: f64, natural_dim: f64) -> f64 {
    if display_dim <= 0.0 || !display_dim.is_finite() || !natural_dim.is_finite() {
        return 1.0;
    }
    natural_dim / display_dim
}

/// Per-axis display-to-source factors.
pub fn display_to_source_scale(display: Size, natural: Size) -> (f64, f64) {
    (
        scale_factor(f64::from(display.width), f64::from(natural.width)),
        scale_factor(f64::from(display.height), f64::from(natural.height)),
    )
}

/// Normalizes degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    if (normalized - 360.0).abs() < f64::EPSILON {
        0.0
    } else {
        normalized
    }
}

/// Returns the number of clockwise quarter turns when `degrees` is a multiple of 90.
pub fn quarter_turns(degrees: f64) -> Option<u8> {
    let normalized = normalize_degrees(degrees);
    let turns = normalized / 90.0;
    if (turns - turns.round()).abs() < 1e-9 {
        Some((turns.round() as u8) % 4)
    } else {
        None
    }
}

/// Bounding box of a `width`×`height` rectangle rotated by `degrees`.
pub fn rotated_canvas_extents(width: u32, height: u32, degrees: f64) -> Size {
    match quarter_turns(degrees) {
        Some(0 | 2) => Size::new(width, height),
        Some(_) => Size::new(height, width),
        None => {
            let (sin, cos) = degrees.to_radians().sin_cos();
            let (sin, cos) = (sin.abs(), cos.abs());
            let w = f64::from(width);
            let h = f64::from(height);
            Size::new(
                (w * cos + h * sin).round() as u32,
                (h * cos + w * sin).round() as u32,
            )
        }
    }
}

/// Crop rectangle in percent of the displayed image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub aspect: Option<f64>,
}

impl CropRegion {
    pub const FULL: CropRegion = CropRegion {
        x: 0.0,
        y: 0.0,
        width: 100.0,
        height: 100.0,
        aspect: None,
    };

    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            aspect: None,
        }
    }

    pub const fn with_aspect(mut self, aspect: Option<f64>) -> Self {
        self.aspect = aspect;
        self
    }

    /// Resolves the region into display-space pixels `(x, y, width, height)`.
    pub fn to_display_rect(&self, display: Size) -> (f64, f64, f64, f64) {
        let dw = f64::from(display.width);
        let dh = f64::from(display.height);
        (
            self.x / 100.0 * dw,
            self.y / 100.0 * dh,
            self.width / 100.0 * dw,
            self.height / 100.0 * dh,
        )
    }

    /// Resolves the region into source pixels, clamped to the natural bounds.
    pub fn to_source_rect(&self, display: Size, natural: Size) -> PixelRect {
        let (scale_x, scale_y) = display_to_source_scale(display, natural);
        let (x, y, width, height) = self.to_display_rect(display);
        let left = (x * scale_x).round().clamp(0.0, f64::from(natural.width)) as u32;
        let top = (y * scale_y).round().clamp(0.0, f64::from(natural.height)) as u32;
        let right = ((x + width) * scale_x)
            .round()
            .clamp(f64::from(left), f64::from(natural.width)) as u32;
        let bottom = ((y + height) * scale_y)
            .round()
            .clamp(f64::from(top), f64::from(natural.height)) as u32;
        PixelRect::new(left, top, right - left, bottom - top)
    }
}

const CENTERED_CROP_COVERAGE: f64 = 0.9;

/// Seeds the interactive crop: centered, covering 90% of the constraining
/// dimension for `aspect` (width / height), or 90%×90% when unconstrained.
pub fn centered_crop(aspect: Option<f64>, display_width: u32, display_height: u32) -> CropRegion {
    let dw = f64::from(display_width.max(1));
    let dh = f64::from(display_height.max(1));
    let (width_pct, height_pct) = match aspect.filter(|ratio| *ratio > 0.0 && ratio.is_finite()) {
        None => (CENTERED_CROP_COVERAGE * 100.0, CENTERED_CROP_COVERAGE * 100.0),
        Some(ratio) => {
            let mut width_px = dw * CENTERED_CROP_COVERAGE;
            let mut height_px = width_px / ratio;
            if height_px > dh * CENTERED_CROP_COVERAGE {
                height_px = dh * CENTERED_CROP_COVERAGE;
                width_px = height_px * ratio;
            }
            (width_px / dw * 100.0, height_px / dh * 100.0)
        }
    };
    CropRegion {
        x: (100.0 - width_pct) / 2.0,
        y: (100.0 - height_pct) / 2.0,
        width: width_pct,
        height: height_pct,
        aspect,
    }
}

/// 2×3 affine matrix mapping `(x, y)` to `(a·x + c·y + e, b·x + d·y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub const fn translate(x: f64, y: f64) -> Self {
        Self {
            e: x,
            f: y,
            ..Self::IDENTITY
        }
    }

    pub const fn scale(x: f64, y: f64) -> Self {
        Self {
            a: x,
            d: y,
            ..Self::IDENTITY
        }
    }

    pub fn rotate_degrees(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Horizontal shear used for synthetic italics.
    pub const fn skew_x(factor: f64) -> Self {
        Self {
            c: factor,
            ..Self::IDENTITY
        }
    }

    /// Composes so that `self` is applied first, then `outer`.
    pub fn then(self, outer: Affine) -> Affine {
        Affine {
            a: outer.a * self.a + outer.c * self.b,
            b: outer.b * self.a + outer.d * self.b,
            c: outer.a * self.c + outer.c * self.d,
            d: outer.b * self.c + outer.d * self.d,
            e: outer.a * self.e + outer.c * self.f + outer.e,
            f: outer.b * self.e + outer.d * self.f + outer.f,
        }
    }

    pub fn apply(&self, point: Point) -> Point {
        Point::new(
            self.a * point.x + self.c * point.y + self.e,
            self.b * point.x + self.d * point.y + self.f,
        )
    }

    pub fn invert(&self) -> Option<Affine> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-12 {
            return None;
        }
        let inv = 1.0 / det;
        Some(Affine {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn scale_factor_divides_natural_by_display() {
        assert_close(scale_factor(500.0, 1000.0), 2.0);
        assert_close(scale_factor(0.0, 1000.0), 1.0);
    }

    #[test]
    fn rotated_extents_swap_for_odd_quarter_turns() {
        assert_eq!(rotated_canvas_extents(1000, 800, 90.0), Size::new(800, 1000));
        assert_eq!(rotated_canvas_extents(1000, 800, -90.0), Size::new(800, 1000));
        assert_eq!(rotated_canvas_extents(1000, 800, 180.0), Size::new(1000, 800));
        assert_eq!(rotated_canvas_extents(1000, 800, 270.0), Size::new(800, 1000));
    }

    #[test]
    fn rotated_extents_cover_arbitrary_angles() {
        let extents = rotated_canvas_extents(100, 100, 45.0);
        assert_eq!(extents, Size::new(141, 141));
    }

    #[test]
    fn centered_crop_without_aspect_covers_ninety_percent() {
        let crop = centered_crop(None, 800, 600);
        assert_close(crop.x, 5.0);
        assert_close(crop.y, 5.0);
        assert_close(crop.width, 90.0);
        assert_close(crop.height, 90.0);
    }

    #[test]
    fn centered_crop_with_aspect_fits_constraining_axis() {
        let crop = centered_crop(Some(1.0), 800, 400);
        // height constrains: 360px square inside an 800x400 display
        assert_close(crop.height, 90.0);
        assert_close(crop.width, 45.0);
        assert_close(crop.x, 27.5);
        assert_close(crop.y, 5.0);
    }

    #[test]
    fn crop_region_resolves_through_display_scale() {
        let crop = CropRegion::new(10.0, 10.0, 50.0, 50.0);
        let rect = crop.to_source_rect(Size::new(500, 400), Size::new(1000, 800));
        assert_eq!(rect, PixelRect::new(100, 80, 500, 400));
    }

    #[test]
    fn color_parses_hex_and_rgba() {
        assert_eq!(Color::parse("#ff8000"), Some(Color::new(255, 128, 0)));
        assert_eq!(Color::parse("#fff"), Some(Color::WHITE));
        assert_eq!(
            Color::parse("rgba(10, 20, 30, 0.5)"),
            Some(Color::new(10, 20, 30))
        );
        assert_eq!(Color::parse("chartreuse"), None);
        assert_eq!(Color::new(1, 2, 3).to_rgba_string(0.5), "rgba(1, 2, 3, 0.5)");
    }

    #[test]
    fn color_rejects_non_ascii_hex_without_panicking() {
        assert_eq!(Color::parse("#a\u{20ac}bc"), None);
        assert_eq!(Color::parse("#\u{20ac}"), None);
        assert_eq!(Color::parse("#ab\u{e9}"), None);
        assert_eq!(Color::parse("#12345g"), None);
    }

    #[test]
    fn affine_inverse_round_trips_points() {
        let transform = Affine::rotate_degrees(30.0)
            .then(Affine::scale(2.0, 2.0))
            .then(Affine::translate(10.0, -4.0));
        let inverse = transform.invert().expect("rotation-scale is invertible");
        let point = Point::new(3.0, 7.0);
        let back = inverse.apply(transform.apply(point));
        assert_close(back.x, point.x);
        assert_close(back.y, point.y);
    }

    #[test]
    fn rotating_a_point_quarter_turn_about_center() {
        let rotated = Point::new(10.0, 0.0).rotated_about(Point::ORIGIN, 90.0);
        assert_close(rotated.x, 0.0);
        assert_close(rotated.y, 10.0);
    }
}
