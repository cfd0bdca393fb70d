use super::*;

/// At most one selected object; `id` and `kind` are set or cleared together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionState {
    pub id: Option<ObjectId>,
    pub kind: Option<ObjectKind>,
}

impl SelectionState {
    pub const fn selected(id: ObjectId, kind: ObjectKind) -> Self {
        Self {
            id: Some(id),
            kind: Some(kind),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.id.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl OverlayObjects {
    pub const fn selection(&self) -> SelectionState {
        self.selection
    }

    pub fn selected_id(&self) -> Option<ObjectId> {
        self.selection.id
    }

    /// Selects `id`, or clears the selection for `None` or an unknown id.
    pub fn select(&mut self, id: Option<ObjectId>) -> SelectionState {
        self.selection = match id.and_then(|id| self.object(id)) {
            Some(object) => SelectionState::selected(object.id(), object.kind()),
            None => SelectionState::default(),
        };
        tracing::debug!(selected = ?self.selection.id, "overlay selection changed");
        self.selection
    }

    pub fn selected_object(&self) -> Option<OverlayObject> {
        self.selection.id.and_then(|id| self.object(id))
    }
}
