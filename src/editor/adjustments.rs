//! Live color adjustments, export transforms and the named filter presets.

use crate::geometry::normalize_degrees;

pub const PERCENT_FILTER_MAX: f64 = 200.0;
pub const TONE_FILTER_MAX: f64 = 100.0;
pub const HUE_ROTATE_LIMIT: f64 = 180.0;
const NEUTRAL_PERCENT: f64 = 100.0;

/// Six CSS-style filter magnitudes. `brightness`, `contrast` and `saturate`
/// are percentages in `0..=200` (neutral 100), `grayscale` and `sepia` in
/// `0..=100` (neutral 0), `hue_rotate` in degrees within `-180..=180`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorAdjustments {
    brightness: f64,
    contrast: f64,
    saturate: f64,
    grayscale: f64,
    sepia: f64,
    hue_rotate: f64,
}

impl Default for EditorAdjustments {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

impl EditorAdjustments {
    pub const NEUTRAL: EditorAdjustments = EditorAdjustments {
        brightness: NEUTRAL_PERCENT,
        contrast: NEUTRAL_PERCENT,
        saturate: NEUTRAL_PERCENT,
        grayscale: 0.0,
        sepia: 0.0,
        hue_rotate: 0.0,
    };

    pub const fn brightness(&self) -> f64 {
        self.brightness
    }

    pub const fn contrast(&self) -> f64 {
        self.contrast
    }

    pub const fn saturate(&self) -> f64 {
        self.saturate
    }

    pub const fn grayscale(&self) -> f64 {
        self.grayscale
    }

    pub const fn sepia(&self) -> f64 {
        self.sepia
    }

    pub const fn hue_rotate(&self) -> f64 {
        self.hue_rotate
    }

    pub fn set_brightness(&mut self, value: f64) {
        self.brightness = clamp_or(value, 0.0, PERCENT_FILTER_MAX, NEUTRAL_PERCENT);
    }

    pub fn set_contrast(&mut self, value: f64) {
        self.contrast = clamp_or(value, 0.0, PERCENT_FILTER_MAX, NEUTRAL_PERCENT);
    }

    pub fn set_saturate(&mut self, value: f64) {
        self.saturate = clamp_or(value, 0.0, PERCENT_FILTER_MAX, NEUTRAL_PERCENT);
    }

    pub fn set_grayscale(&mut self, value: f64) {
        self.grayscale = clamp_or(value, 0.0, TONE_FILTER_MAX, 0.0);
    }

    pub fn set_sepia(&mut self, value: f64) {
        self.sepia = clamp_or(value, 0.0, TONE_FILTER_MAX, 0.0);
    }

    pub fn set_hue_rotate(&mut self, value: f64) {
        self.hue_rotate = clamp_or(value, -HUE_ROTATE_LIMIT, HUE_ROTATE_LIMIT, 0.0);
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }

    pub fn reset(&mut self) {
        *self = Self::NEUTRAL;
    }

    /// Resets every magnitude to neutral and then applies `preset` on top.
    pub fn apply_preset(&mut self, preset: FilterPreset) {
        *self = preset.adjustments();
    }
}

/// Pending rotate/flip applied by the final export bake. Flips act in the
/// image's own frame before rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub rotate: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for TransformState {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TransformState {
    pub const IDENTITY: TransformState = TransformState {
        rotate: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
    };

    pub fn rotate_by(&mut self, degrees: f64) {
        if degrees.is_finite() {
            self.rotate = normalize_degrees(self.rotate + degrees);
        }
    }

    pub fn flip_horizontal(&mut self) {
        self.scale_x = -self.scale_x;
    }

    pub fn flip_vertical(&mut self) {
        self.scale_y = -self.scale_y;
    }

    pub fn is_flipped_horizontally(&self) -> bool {
        self.scale_x < 0.0
    }

    pub fn is_flipped_vertically(&self) -> bool {
        self.scale_y < 0.0
    }

    pub fn is_identity(&self) -> bool {
        normalize_degrees(self.rotate) == 0.0
            && !self.is_flipped_horizontally()
            && !self.is_flipped_vertically()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPreset {
    Vintage,
    Grayscale,
    Cool,
    Warm,
    Lomo,
    Clarity,
    SinCity,
    Sunrise,
}

impl FilterPreset {
    pub const ALL: [FilterPreset; 8] = [
        Self::Vintage,
        Self::Grayscale,
        Self::Cool,
        Self::Warm,
        Self::Lomo,
        Self::Clarity,
        Self::SinCity,
        Self::Sunrise,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Vintage => "Vintage",
            Self::Grayscale => "Grayscale",
            Self::Cool => "Cool",
            Self::Warm => "Warm",
            Self::Lomo => "Lomo",
            Self::Clarity => "Clarity",
            Self::SinCity => "Sin City",
            Self::Sunrise => "Sunrise",
        }
    }

    /// Case-insensitive lookup that also accepts `sin-city` style names.
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = label.trim().replace(['-', '_'], " ");
        Self::ALL
            .into_iter()
            .find(|preset| preset.label().eq_ignore_ascii_case(&wanted))
    }

    pub fn adjustments(self) -> EditorAdjustments {
        let mut adjustments = EditorAdjustments::NEUTRAL;
        match self {
            Self::Vintage => {
                adjustments.set_sepia(60.0);
                adjustments.set_brightness(110.0);
                adjustments.set_contrast(90.0);
                adjustments.set_saturate(120.0);
            }
            Self::Grayscale => adjustments.set_grayscale(100.0),
            Self::Cool => {
                adjustments.set_contrast(110.0);
                adjustments.set_brightness(105.0);
                adjustments.set_hue_rotate(-15.0);
            }
            Self::Warm => {
                adjustments.set_sepia(20.0);
                adjustments.set_saturate(130.0);
                adjustments.set_hue_rotate(5.0);
            }
            Self::Lomo => {
                adjustments.set_contrast(150.0);
                adjustments.set_saturate(150.0);
                adjustments.set_sepia(20.0);
                adjustments.set_hue_rotate(-5.0);
            }
            Self::Clarity => {
                adjustments.set_contrast(120.0);
                adjustments.set_saturate(110.0);
                adjustments.set_brightness(105.0);
            }
            Self::SinCity => {
                adjustments.set_contrast(200.0);
                adjustments.set_grayscale(100.0);
                adjustments.set_brightness(80.0);
                adjustments.set_sepia(20.0);
            }
            Self::Sunrise => {
                adjustments.set_contrast(110.0);
                adjustments.set_saturate(140.0);
                adjustments.set_brightness(110.0);
                adjustments.set_sepia(10.0);
                adjustments.set_hue_rotate(-10.0);
            }
        }
        adjustments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_clamp_into_documented_ranges() {
        let mut adjustments = EditorAdjustments::default();
        adjustments.set_brightness(500.0);
        adjustments.set_contrast(-20.0);
        adjustments.set_grayscale(140.0);
        adjustments.set_hue_rotate(-270.0);
        adjustments.set_saturate(f64::NAN);
        assert_eq!(adjustments.brightness(), 200.0);
        assert_eq!(adjustments.contrast(), 0.0);
        assert_eq!(adjustments.grayscale(), 100.0);
        assert_eq!(adjustments.hue_rotate(), -180.0);
        assert_eq!(adjustments.saturate(), 100.0);
    }

    #[test]
    fn apply_preset_discards_previous_magnitudes() {
        let mut adjustments = EditorAdjustments::default();
        adjustments.set_grayscale(80.0);
        adjustments.set_brightness(150.0);
        adjustments.apply_preset(FilterPreset::Warm);
        assert_eq!(adjustments.grayscale(), 0.0);
        assert_eq!(adjustments.brightness(), 100.0);
        assert_eq!(adjustments.sepia(), 20.0);
        assert_eq!(adjustments.saturate(), 130.0);
        assert_eq!(adjustments.hue_rotate(), 5.0);
    }

    #[test]
    fn preset_labels_resolve_loosely() {
        assert_eq!(FilterPreset::from_label("sin-city"), Some(FilterPreset::SinCity));
        assert_eq!(FilterPreset::from_label("VINTAGE"), Some(FilterPreset::Vintage));
        assert_eq!(FilterPreset::from_label("noir"), None);
    }

    #[test]
    fn transform_rotation_wraps_and_flips_toggle() {
        let mut transform = TransformState::default();
        transform.rotate_by(-90.0);
        assert_eq!(transform.rotate, 270.0);
        transform.rotate_by(90.0);
        transform.flip_horizontal();
        assert!(transform.is_flipped_horizontally());
        assert!(!transform.is_identity());
        transform.flip_horizontal();
        assert!(transform.is_identity());
    }
}
