use super::*;

impl OverlayObjects {
    /// Adds an object centered on the canvas (unless the initial properties
    /// place it) and selects it. Adding a watermark when one already exists
    /// merges the new properties into it.
    pub fn add(&mut self, new_object: NewObject) -> ObjectId {
        let anchor = self.default_anchor();
        let kind = new_object.kind();
        let id = match new_object {
            NewObject::Text(patch) => {
                let id = self.allocate_id();
                let mut text = TextElement::new(id, anchor);
                text.apply(patch);
                self.objects.push(OverlayObject::Text(text));
                id
            }
            NewObject::Sticker(glyph) => {
                let id = self.allocate_id();
                self.objects
                    .push(OverlayObject::Sticker(StickerElement::new(id, anchor, glyph)));
                id
            }
            NewObject::Image { src, bitmap } => {
                let id = self.allocate_id();
                self.objects.push(OverlayObject::Image(ImageElement::new(
                    id,
                    anchor,
                    src,
                    bitmap,
                    self.canvas,
                )));
                id
            }
            NewObject::Watermark(patch) => {
                self.watermark
                    .get_or_insert_with(|| WatermarkElement::new(anchor))
                    .apply(patch);
                WATERMARK_ID
            }
        };
        self.selection = SelectionState::selected(id, kind);
        tracing::debug!(id, kind = kind.label(), "overlay object added");
        id
    }

    /// Shallow-merges `patch` into object `id`.
    pub fn update(&mut self, id: ObjectId, patch: ObjectPatch) -> Result<(), ToolError> {
        let patch_kind = patch.kind();
        if id == WATERMARK_ID {
            let watermark = self
                .watermark
                .as_mut()
                .ok_or(ToolError::ObjectNotFound { id })?;
            return match patch {
                ObjectPatch::Watermark(patch) => {
                    watermark.apply(patch);
                    Ok(())
                }
                _ => Err(ToolError::PatchMismatch {
                    id,
                    target: ObjectKind::Watermark,
                    patch: patch_kind,
                }),
            };
        }

        let object = self
            .objects
            .iter_mut()
            .find(|object| object.id() == id)
            .ok_or(ToolError::ObjectNotFound { id })?;
        match (object, patch) {
            (OverlayObject::Text(text), ObjectPatch::Text(patch)) => text.apply(patch),
            (OverlayObject::Sticker(sticker), ObjectPatch::Sticker(patch)) => sticker.apply(patch),
            (OverlayObject::Image(image), ObjectPatch::Image(patch)) => image.apply(patch),
            (object, _) => {
                return Err(ToolError::PatchMismatch {
                    id,
                    target: object.kind(),
                    patch: patch_kind,
                })
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, id: ObjectId) -> Result<OverlayObject, ToolError> {
        let removed = if id == WATERMARK_ID {
            self.watermark
                .take()
                .map(OverlayObject::Watermark)
                .ok_or(ToolError::ObjectNotFound { id })?
        } else {
            let index = self
                .objects
                .iter()
                .position(|object| object.id() == id)
                .ok_or(ToolError::ObjectNotFound { id })?;
            self.objects.remove(index)
        };
        if self.selection.id == Some(id) {
            self.selection.clear();
        }
        if self
            .interaction
            .as_ref()
            .is_some_and(|interaction| interaction.id == id)
        {
            self.interaction = None;
        }
        tracing::debug!(id, "overlay object removed");
        Ok(removed)
    }

    /// Replaces an object wholesale, keeping its id and z-order slot.
    pub(super) fn replace(&mut self, object: OverlayObject) {
        match object {
            OverlayObject::Watermark(watermark) => self.watermark = Some(watermark),
            other => {
                let id = other.id();
                if let Some(slot) = self.objects.iter_mut().find(|object| object.id() == id) {
                    *slot = other;
                }
            }
        }
    }
}
