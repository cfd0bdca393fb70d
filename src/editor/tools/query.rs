use super::*;

impl OverlayObjects {
    /// Text, sticker and image objects in insertion (paint) order.
    pub fn objects(&self) -> &[OverlayObject] {
        &self.objects
    }

    pub fn watermark(&self) -> Option<&WatermarkElement> {
        self.watermark.as_ref()
    }

    pub fn get_text(&self, id: ObjectId) -> Option<&TextElement> {
        self.find_object_ref(id, OverlayObject::as_text)
    }

    pub fn get_sticker(&self, id: ObjectId) -> Option<&StickerElement> {
        self.find_object_ref(id, OverlayObject::as_sticker)
    }

    pub fn get_image(&self, id: ObjectId) -> Option<&ImageElement> {
        self.find_object_ref(id, OverlayObject::as_image)
    }

    pub fn object(&self, id: ObjectId) -> Option<OverlayObject> {
        if id == WATERMARK_ID {
            return self.watermark.clone().map(OverlayObject::Watermark);
        }
        self.objects.iter().find(|object| object.id() == id).cloned()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        if id == WATERMARK_ID {
            self.watermark.is_some()
        } else {
            self.objects.iter().any(|object| object.id() == id)
        }
    }

    /// Every object, watermark first, then the rest topmost-first.
    pub fn topmost_first(&self) -> Vec<OverlayObject> {
        self.watermark
            .iter()
            .cloned()
            .map(OverlayObject::Watermark)
            .chain(self.objects.iter().rev().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len() + usize::from(self.watermark.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
