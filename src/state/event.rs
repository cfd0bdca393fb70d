use super::model::EditMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditEvent {
    BeginCrop,
    BeginErase,
    BeginInpaint,
    BeginObjects,
    Apply,
    Cancel,
}

impl EditEvent {
    /// The mode a `Begin*` event enters.
    pub const fn target_mode(self) -> Option<EditMode> {
        match self {
            Self::BeginCrop => Some(EditMode::Crop),
            Self::BeginErase => Some(EditMode::Erase),
            Self::BeginInpaint => Some(EditMode::Inpaint),
            Self::BeginObjects => Some(EditMode::Objects),
            Self::Apply | Self::Cancel => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: Option<EditMode>,
    pub event: EditEvent,
    pub to: EditMode,
}

impl StateTransition {
    pub const fn new(from: Option<EditMode>, event: EditEvent, to: EditMode) -> Self {
        Self { from, event, to }
    }
}
