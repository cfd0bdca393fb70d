use super::*;

/// Side length used for both the rotation disc radius and the resize square half-extent.
pub const HANDLE_SIZE: f64 = 10.0;
/// Distance of the rotation handle above the padded box.
pub const ROTATION_HANDLE_OFFSET: f64 = 25.0;
pub const SELECTION_PADDING: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    Dragging,
    Resizing,
    Rotating,
}

/// An in-flight pointer gesture. Every update is computed from `snapshot`
/// and `start`, never incrementally.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub id: ObjectId,
    pub mode: InteractionMode,
    pub snapshot: OverlayObject,
    pub start: Point,
}

/// Which part of an object a pointer falls on, in priority order.
pub fn hit_test(object: &OverlayObject, pointer: Point, fonts: &FontBook) -> Option<InteractionMode> {
    let center = object.anchor();
    let local = pointer.rotated_about(center, -object.rotation());
    let (dx, dy) = (local.x - center.x, local.y - center.y);
    let (width, height) = object.extents(fonts);
    let half_w = width / 2.0 + SELECTION_PADDING;
    let half_h = height / 2.0 + SELECTION_PADDING;

    if !matches!(object, OverlayObject::Watermark(_)) {
        let handle_y = -half_h - ROTATION_HANDLE_OFFSET;
        if dx.hypot(dy - handle_y) <= HANDLE_SIZE {
            return Some(InteractionMode::Rotating);
        }
        if (dx - half_w).abs() <= HANDLE_SIZE && (dy - half_h).abs() <= HANDLE_SIZE {
            return Some(InteractionMode::Resizing);
        }
    }
    if dx.abs() <= half_w && dy.abs() <= half_h {
        return Some(InteractionMode::Dragging);
    }
    None
}

impl OverlayObjects {
    pub fn interaction(&self) -> Option<&Interaction> {
        self.interaction.as_ref()
    }

    /// Starts a gesture on the object under `pointer`, trying the selected
    /// object before the rest of the z-order. A miss clears the selection.
    pub fn begin_interaction(&mut self, pointer: Point, fonts: &FontBook) -> Option<InteractionMode> {
        let selected = self.selected_object();
        let hit = selected
            .into_iter()
            .chain(self.topmost_first())
            .find_map(|object| hit_test(&object, pointer, fonts).map(|mode| (object, mode)));

        let Some((object, mode)) = hit else {
            self.selection.clear();
            self.interaction = None;
            return None;
        };
        let id = object.id();
        self.selection = SelectionState::selected(id, object.kind());
        tracing::debug!(id, ?mode, "overlay interaction started");
        self.interaction = Some(Interaction {
            id,
            mode,
            snapshot: object,
            start: pointer,
        });
        Some(mode)
    }

    /// Applies the active gesture for the current pointer position. Returns
    /// false when no gesture is active.
    pub fn continue_interaction(&mut self, pointer: Point) -> bool {
        let Some(interaction) = self.interaction.as_ref() else {
            return false;
        };
        let updated = interaction.updated(pointer);
        self.replace(updated);
        true
    }

    pub fn end_interaction(&mut self) -> Option<InteractionMode> {
        self.interaction.take().map(|interaction| interaction.mode)
    }
}

impl Interaction {
    fn updated(&self, pointer: Point) -> OverlayObject {
        let mut object = self.snapshot.clone();
        let center = self.snapshot.anchor();
        match self.mode {
            InteractionMode::Dragging => {
                object.set_anchor(Point::new(
                    center.x + pointer.x - self.start.x,
                    center.y + pointer.y - self.start.y,
                ));
            }
            InteractionMode::Resizing => {
                let start_distance = self.start.distance_to(center);
                if start_distance > f64::EPSILON {
                    let scale = pointer.distance_to(center) / start_distance;
                    resize(&mut object, scale);
                }
            }
            InteractionMode::Rotating => {
                let degrees = (pointer.y - center.y).atan2(pointer.x - center.x).to_degrees() + 90.0;
                rotate(&mut object, degrees);
            }
        }
        object
    }
}

fn resize(object: &mut OverlayObject, scale: f64) {
    match object {
        OverlayObject::Text(text) => text.set_font_size(text.font_size * scale),
        OverlayObject::Sticker(sticker) => sticker.set_size(sticker.size * scale),
        OverlayObject::Image(image) => image.set_width(image.width * scale),
        OverlayObject::Watermark(_) => {}
    }
}

fn rotate(object: &mut OverlayObject, degrees: f64) {
    match object {
        OverlayObject::Text(text) => text.rotation = degrees,
        OverlayObject::Sticker(sticker) => sticker.rotation = degrees,
        OverlayObject::Image(image) => image.rotation = degrees,
        OverlayObject::Watermark(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    fn text_scene() -> (OverlayObjects, ObjectId, FontBook) {
        let mut objects = OverlayObjects::new(Size::new(800, 600));
        let id = objects.add(NewObject::Text(TextPatch::default()));
        (objects, id, FontBook::new())
    }

    #[test]
    fn text_rotated_to_45_degrees_then_doubled_in_size() {
        let (mut objects, id, fonts) = text_scene();
        let center = Point::new(400.0, 300.0);

        // Fallback metrics: 11 chars * 50 * 0.62 = 341 wide, 60 tall.
        let rotation_handle = Point::new(400.0, 300.0 - 40.0 - ROTATION_HANDLE_OFFSET);
        assert_eq!(
            objects.begin_interaction(rotation_handle, &fonts),
            Some(InteractionMode::Rotating)
        );
        assert!(objects.continue_interaction(Point::new(500.0, 200.0)));
        assert_eq!(objects.end_interaction(), Some(InteractionMode::Rotating));
        let text = objects.get_text(id).expect("text should exist");
        assert_close(text.rotation, 45.0);

        let resize_handle = Point::new(400.0 + 180.5, 300.0 + 40.0).rotated_about(center, 45.0);
        assert_eq!(
            objects.begin_interaction(resize_handle, &fonts),
            Some(InteractionMode::Resizing)
        );
        let doubled = Point::new(
            center.x + (resize_handle.x - center.x) * 2.0,
            center.y + (resize_handle.y - center.y) * 2.0,
        );
        objects.continue_interaction(doubled);
        objects.end_interaction();

        let text = objects.get_text(id).expect("text should exist");
        assert_close(text.font_size, 100.0);
        assert_close(text.rotation, 45.0);
        assert_eq!(text.text, DEFAULT_TEXT);
    }

    #[test]
    fn dragging_moves_by_pointer_delta_from_start() {
        let (mut objects, id, fonts) = text_scene();
        assert_eq!(
            objects.begin_interaction(Point::new(410.0, 305.0), &fonts),
            Some(InteractionMode::Dragging)
        );
        objects.continue_interaction(Point::new(430.0, 300.0));
        objects.continue_interaction(Point::new(460.0, 325.0));
        let text = objects.get_text(id).expect("text should exist");
        assert_eq!((text.x, text.y), (450.0, 320.0));
    }

    #[test]
    fn resizing_never_shrinks_below_floor() {
        let mut objects = OverlayObjects::new(Size::new(800, 600));
        let sticker = objects.add(NewObject::Sticker("*".to_string()));
        let fonts = FontBook::new();
        // Sticker 80 wide padded to half-extent 50.
        let handle = Point::new(450.0, 350.0);
        assert_eq!(
            objects.begin_interaction(handle, &fonts),
            Some(InteractionMode::Resizing)
        );
        objects.continue_interaction(Point::new(400.5, 300.5));
        assert_eq!(
            objects.get_sticker(sticker).map(|sticker| sticker.size),
            Some(STICKER_MIN_SIZE)
        );
    }

    #[test]
    fn resizing_never_grows_past_caps() {
        let mut objects = OverlayObjects::new(Size::new(800, 600));
        let text = objects.add(NewObject::Text(TextPatch::default()));
        let fonts = FontBook::new();
        let center = Point::new(400.0, 300.0);
        let far = |handle: Point| {
            Point::new(
                center.x + (handle.x - center.x) * 100.0,
                center.y + (handle.y - center.y) * 100.0,
            )
        };

        let text_handle = Point::new(400.0 + 180.5, 300.0 + 40.0);
        assert_eq!(
            objects.begin_interaction(text_handle, &fonts),
            Some(InteractionMode::Resizing)
        );
        objects.continue_interaction(far(text_handle));
        objects.end_interaction();
        assert_eq!(
            objects.get_text(text).map(|text| text.font_size),
            Some(TEXT_MAX_FONT_SIZE)
        );
        objects.remove(text).expect("text should be removed");

        let sticker = objects.add(NewObject::Sticker("*".to_string()));
        let sticker_handle = Point::new(450.0, 350.0);
        assert_eq!(
            objects.begin_interaction(sticker_handle, &fonts),
            Some(InteractionMode::Resizing)
        );
        objects.continue_interaction(far(sticker_handle));
        objects.end_interaction();
        assert_eq!(
            objects.get_sticker(sticker).map(|sticker| sticker.size),
            Some(STICKER_MAX_SIZE)
        );
        objects.remove(sticker).expect("sticker should be removed");

        let image = objects.add(NewObject::Image {
            src: String::new(),
            bitmap: Arc::new(image::RgbaImage::new(200, 100)),
        });
        let image_handle = Point::new(400.0 + 110.0, 300.0 + 60.0);
        assert_eq!(
            objects.begin_interaction(image_handle, &fonts),
            Some(InteractionMode::Resizing)
        );
        objects.continue_interaction(far(image_handle));
        let image = objects.get_image(image).expect("image should exist");
        assert_close(image.width, IMAGE_MAX_SIZE);
        assert_close(image.height, IMAGE_MAX_SIZE / 2.0);
    }

    #[test]
    fn image_resize_keeps_aspect_ratio() {
        let mut objects = OverlayObjects::new(Size::new(800, 600));
        let id = objects.add(NewObject::Image {
            src: String::new(),
            bitmap: Arc::new(image::RgbaImage::new(200, 100)),
        });
        let fonts = FontBook::new();
        let handle = Point::new(400.0 + 110.0, 300.0 + 60.0);
        objects.begin_interaction(handle, &fonts);
        objects.continue_interaction(Point::new(400.0 + 220.0, 300.0 + 120.0));
        let image = objects.get_image(id).expect("image should exist");
        assert_close(image.width, 400.0);
        assert_close(image.height, 200.0);
    }

    #[test]
    fn watermark_only_supports_dragging() {
        let mut objects = OverlayObjects::new(Size::new(800, 600));
        objects.add(NewObject::Watermark(WatermarkPatch::default()));
        let fonts = FontBook::new();
        let watermark = objects.watermark().cloned().expect("watermark should exist");
        let (width, height) = OverlayObject::Watermark(watermark).extents(&fonts);
        let corner = Point::new(
            400.0 + width / 2.0 + SELECTION_PADDING - 1.0,
            300.0 + height / 2.0 + SELECTION_PADDING - 1.0,
        );
        assert_eq!(
            objects.begin_interaction(corner, &fonts),
            Some(InteractionMode::Dragging)
        );
        let above = Point::new(400.0, 300.0 - height / 2.0 - SELECTION_PADDING - ROTATION_HANDLE_OFFSET);
        objects.end_interaction();
        assert_eq!(objects.begin_interaction(above, &fonts), None);
    }

    #[test]
    fn miss_clears_selection_without_interaction() {
        let (mut objects, id, fonts) = text_scene();
        assert_eq!(objects.selected_id(), Some(id));
        assert_eq!(objects.begin_interaction(Point::new(5.0, 5.0), &fonts), None);
        assert!(objects.selection().is_empty());
        assert!(objects.interaction().is_none());
        assert!(!objects.continue_interaction(Point::new(10.0, 10.0)));
    }

    #[test]
    fn selected_object_wins_over_higher_z_order() {
        let mut objects = OverlayObjects::new(Size::new(800, 600));
        let below = objects.add(NewObject::Sticker("a".to_string()));
        let above = objects.add(NewObject::Sticker("b".to_string()));
        objects.select(Some(below));
        objects.begin_interaction(Point::new(400.0, 300.0), &FontBook::new());
        assert_eq!(objects.interaction().map(|i| i.id), Some(below));

        objects.end_interaction();
        objects.select(None);
        objects.begin_interaction(Point::new(400.0, 300.0), &FontBook::new());
        assert_eq!(objects.interaction().map(|i| i.id), Some(above));
    }
}
