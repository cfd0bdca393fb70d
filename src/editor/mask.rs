use image::{Rgba, RgbaImage};

use crate::geometry::{Point, Size};
use crate::history::HistoryStore;

pub const MIN_BRUSH_SIZE: u32 = 1;
pub const MAX_BRUSH_SIZE: u32 = 200;
pub const DEFAULT_BRUSH_SIZE: u32 = 40;
/// Semi-transparent red used to preview painted regions.
pub const MASK_PAINT: Rgba<u8> = Rgba([255, 0, 0, 128]);

/// Snapshot stack of the mask preview, one entry per completed stroke.
pub type DrawHistory = HistoryStore<RgbaImage>;

pub fn clamp_brush_size(size: u32) -> u32 {
    size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE)
}

/// Display-sized paint layer for erase and inpaint sessions.
#[derive(Debug, Clone)]
pub struct MaskLayer {
    preview: RgbaImage,
    history: DrawHistory,
    brush_size: u32,
    last_point: Option<Point>,
}

impl MaskLayer {
    pub fn new(display: Size, brush_size: u32) -> Self {
        let blank = RgbaImage::new(display.width.max(1), display.height.max(1));
        Self {
            preview: blank.clone(),
            history: DrawHistory::new(blank),
            brush_size: clamp_brush_size(brush_size),
            last_point: None,
        }
    }

    pub fn preview(&self) -> &RgbaImage {
        &self.preview
    }

    pub fn history(&self) -> &DrawHistory {
        &self.history
    }

    pub const fn brush_size(&self) -> u32 {
        self.brush_size
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.brush_size = clamp_brush_size(size);
    }

    /// True when nothing has been painted.
    pub fn is_blank(&self) -> bool {
        self.preview.pixels().all(|pixel| pixel[3] == 0)
    }

    pub fn begin_stroke(&mut self, point: Point) {
        self.daub(point);
        self.last_point = Some(point);
    }

    /// Paints from the previous sample to `point`, spacing daubs at most a
    /// quarter brush apart. Only the part of the segment that can touch the
    /// layer is walked; non-finite samples are ignored.
    pub fn extend_stroke(&mut self, point: Point) {
        if !point.x.is_finite() || !point.y.is_finite() {
            return;
        }
        let Some(previous) = self.last_point else {
            self.begin_stroke(point);
            return;
        };
        let reach = f64::from(self.brush_size) / 2.0;
        let spacing = (f64::from(self.brush_size) / 4.0).max(1.0);
        let (width, height) = self.preview.dimensions();
        if let Some((start, end)) = visible_span(previous, point, (width, height), reach) {
            let from = along(previous, point, start);
            let to = along(previous, point, end);
            let diagonal = (f64::from(width) + 2.0 * reach).hypot(f64::from(height) + 2.0 * reach);
            let max_steps = (diagonal / spacing).ceil() + 1.0;
            let steps = (from.distance_to(to) / spacing).ceil().clamp(1.0, max_steps) as u32;
            for step in 0..=steps {
                self.daub(along(from, to, f64::from(step) / f64::from(steps)));
            }
        }
        self.last_point = Some(point);
    }

    /// Completes the stroke and snapshots the preview. Returns false when no
    /// stroke was in progress.
    pub fn end_stroke(&mut self) -> bool {
        if self.last_point.take().is_none() {
            return false;
        }
        self.history.push(self.preview.clone());
        tracing::debug!(snapshots = self.history.len(), "mask stroke committed");
        true
    }

    pub fn undo(&mut self) -> bool {
        self.restore_after(DrawHistory::undo)
    }

    pub fn redo(&mut self) -> bool {
        self.restore_after(DrawHistory::redo)
    }

    fn restore_after(&mut self, step: fn(&mut DrawHistory) -> bool) -> bool {
        self.last_point = None;
        if !step(&mut self.history) {
            return false;
        }
        self.preview = self.history.current().clone();
        true
    }

    /// Drops every stroke and reseeds with one blank snapshot.
    pub fn clear(&mut self) {
        let blank = RgbaImage::new(self.preview.width(), self.preview.height());
        self.preview = blank.clone();
        self.history.reseed(blank);
        self.last_point = None;
    }

    fn daub(&mut self, center: Point) {
        let radius = f64::from(self.brush_size) / 2.0;
        let width = i64::from(self.preview.width());
        let height = i64::from(self.preview.height());
        let min_x = ((center.x - radius).floor() as i64).max(0);
        let max_x = ((center.x + radius).ceil() as i64).min(width - 1);
        let min_y = ((center.y - radius).floor() as i64).max(0);
        let max_y = ((center.y + radius).ceil() as i64).min(height - 1);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f64 + 0.5 - center.x;
                let dy = y as f64 + 0.5 - center.y;
                if dx.hypot(dy) <= radius {
                    self.preview.put_pixel(x as u32, y as u32, MASK_PAINT);
                }
            }
        }
    }
}

fn along(from: Point, to: Point, t: f64) -> Point {
    Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t)
}

/// Parameter range of `from -> to` inside the layer grown by `margin` on
/// every side, or `None` when the segment misses it.
fn visible_span(from: Point, to: Point, (width, height): (u32, u32), margin: f64) -> Option<(f64, f64)> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let bounds = [
        (-dx, from.x + margin),
        (dx, f64::from(width) + margin - from.x),
        (-dy, from.y + margin),
        (dy, f64::from(height) + margin - from.y),
    ];
    let (mut start, mut end) = (0.0_f64, 1.0_f64);
    for (direction, room) in bounds {
        if direction == 0.0 {
            if room < 0.0 {
                return None;
            }
            continue;
        }
        let t = room / direction;
        if direction < 0.0 {
            start = start.max(t);
        } else {
            end = end.min(t);
        }
    }
    (start <= end).then_some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painted(layer: &MaskLayer) -> usize {
        layer.preview().pixels().filter(|pixel| pixel[3] > 0).count()
    }

    #[test]
    fn new_layer_is_seeded_with_one_blank_snapshot() {
        let layer = MaskLayer::new(Size::new(50, 40), DEFAULT_BRUSH_SIZE);
        assert!(layer.is_blank());
        assert_eq!(layer.history().len(), 1);
        assert!(!layer.history().can_undo());
    }

    #[test]
    fn daub_paints_disc_of_brush_diameter() {
        let mut layer = MaskLayer::new(Size::new(200, 200), 40);
        layer.begin_stroke(Point::new(100.0, 100.0));
        layer.end_stroke();
        let area = painted(&layer) as f64;
        let expected = std::f64::consts::PI * 20.0 * 20.0;
        assert!((area - expected).abs() / expected < 0.05, "area {area}");
        assert_eq!(layer.preview().get_pixel(100, 100), &MASK_PAINT);
        assert_eq!(layer.preview().get_pixel(100, 125)[3], 0);
    }

    #[test]
    fn fast_motion_leaves_no_gaps() {
        let mut layer = MaskLayer::new(Size::new(300, 50), 10);
        layer.begin_stroke(Point::new(10.0, 25.0));
        layer.extend_stroke(Point::new(290.0, 25.0));
        layer.end_stroke();
        assert!((10..=290).all(|x| layer.preview().get_pixel(x, 25)[3] > 0));
    }

    #[test]
    fn undo_and_redo_restore_stroke_snapshots() {
        let mut layer = MaskLayer::new(Size::new(100, 100), 10);
        layer.begin_stroke(Point::new(20.0, 20.0));
        layer.end_stroke();
        let after_first = painted(&layer);
        layer.begin_stroke(Point::new(70.0, 70.0));
        layer.end_stroke();
        assert!(painted(&layer) > after_first);

        assert!(layer.undo());
        assert_eq!(painted(&layer), after_first);
        assert!(layer.undo());
        assert!(layer.is_blank());
        assert!(!layer.undo());
        assert!(layer.redo());
        assert_eq!(painted(&layer), after_first);
    }

    #[test]
    fn brush_size_is_clamped() {
        let mut layer = MaskLayer::new(Size::new(10, 10), 0);
        assert_eq!(layer.brush_size(), MIN_BRUSH_SIZE);
        layer.set_brush_size(10_000);
        assert_eq!(layer.brush_size(), MAX_BRUSH_SIZE);
    }

    #[test]
    fn end_without_stroke_does_not_snapshot() {
        let mut layer = MaskLayer::new(Size::new(10, 10), 4);
        assert!(!layer.end_stroke());
        assert_eq!(layer.history().len(), 1);
    }

    #[test]
    fn far_away_samples_paint_only_the_visible_run() {
        let mut layer = MaskLayer::new(Size::new(300, 50), 10);
        layer.begin_stroke(Point::new(10.0, 25.0));
        layer.extend_stroke(Point::new(1.0e12, 25.0));
        layer.end_stroke();
        assert!((10..300).all(|x| layer.preview().get_pixel(x, 25)[3] > 0));
        assert_eq!(layer.preview().get_pixel(150, 5)[3], 0);

        layer.begin_stroke(Point::new(-1.0e12, -1.0e12));
        layer.extend_stroke(Point::new(-1.0e12, 1.0e12));
        assert!(layer.end_stroke());
        assert_eq!(layer.history().len(), 3);
    }

    #[test]
    fn non_finite_samples_are_ignored() {
        let mut layer = MaskLayer::new(Size::new(40, 40), 6);
        layer.begin_stroke(Point::new(20.0, 20.0));
        let before = painted(&layer);
        layer.extend_stroke(Point::new(f64::NAN, 20.0));
        layer.extend_stroke(Point::new(20.0, f64::INFINITY));
        assert_eq!(painted(&layer), before);
        layer.extend_stroke(Point::new(30.0, 20.0));
        assert!(painted(&layer) > before);
    }

    #[test]
    fn segment_outside_the_layer_paints_nothing() {
        let span = visible_span(
            Point::new(-50.0, -50.0),
            Point::new(-50.0, 500.0),
            (100, 100),
            5.0,
        );
        assert_eq!(span, None);

        let (start, end) = visible_span(
            Point::new(-100.0, 50.0),
            Point::new(300.0, 50.0),
            (100, 100),
            0.0,
        )
        .expect("horizontal pass crosses the layer");
        assert!((start - 0.25).abs() < 1e-9);
        assert!((end - 0.5).abs() < 1e-9);
    }
}
