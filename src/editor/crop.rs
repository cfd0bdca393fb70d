use crate::geometry::{centered_crop, CropRegion, Size};

/// Aspect constraint a crop session starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropPreset {
    #[default]
    Free,
    /// Locks to the current image's own proportions.
    Original,
    /// Width-to-height ratio in lowest terms, both sides non-zero.
    Fixed { width: u32, height: u32 },
}

impl CropPreset {
    pub const WIDESCREEN: CropPreset = CropPreset::Fixed { width: 16, height: 9 };
    pub const SQUARE: CropPreset = CropPreset::Fixed { width: 1, height: 1 };
    pub const PORTRAIT: CropPreset = CropPreset::Fixed { width: 9, height: 16 };

    /// A fixed `width:height` ratio, reduced; `None` when either side is zero.
    pub fn fixed(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let divisor = gcd(width, height);
        Some(Self::Fixed {
            width: width / divisor,
            height: height / divisor,
        })
    }

    /// Width over height for an image of `natural` size; `Free` has none.
    pub fn aspect(self, natural: Size) -> Option<f64> {
        let (width, height) = match self {
            Self::Free => return None,
            Self::Original => (natural.width.max(1), natural.height.max(1)),
            Self::Fixed { width, height } => (width.max(1), height.max(1)),
        };
        Some(f64::from(width) / f64::from(height))
    }

    /// Initial region over an image shown at `display`.
    pub fn seed_region(self, display: Size, natural: Size) -> CropRegion {
        centered_crop(self.aspect(natural), display.width, display.height)
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_ratios_are_reduced_and_reject_zero_sides() {
        assert_eq!(CropPreset::fixed(1920, 1080), Some(CropPreset::WIDESCREEN));
        assert_eq!(CropPreset::fixed(7, 7), Some(CropPreset::SQUARE));
        assert_eq!(CropPreset::fixed(0, 4), None);
        assert_eq!(CropPreset::fixed(4, 0), None);
    }

    #[test]
    fn original_follows_the_current_image() {
        let natural = Size::new(1200, 800);
        assert_eq!(CropPreset::Original.aspect(natural), Some(1.5));
        assert_eq!(CropPreset::Original.aspect(Size::new(0, 0)), Some(1.0));
        assert_eq!(CropPreset::Free.aspect(natural), None);
        assert_eq!(CropPreset::PORTRAIT.aspect(natural), Some(9.0 / 16.0));
    }

    #[test]
    fn seed_region_matches_preset_aspect_on_screen() {
        let display = Size::new(800, 400);
        let region = CropPreset::SQUARE.seed_region(display, Size::new(1600, 800));
        let (_, _, width, height) = region.to_display_rect(display);
        assert!((width - height).abs() < 1e-9);
        assert_eq!(region.aspect, Some(1.0));

        let free = CropPreset::Free.seed_region(display, Size::new(1600, 800));
        assert_eq!((free.width, free.height), (90.0, 90.0));
        assert_eq!((free.x, free.y), (5.0, 5.0));
    }
}
