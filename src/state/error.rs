use super::event::EditEvent;
use super::model::EditMode;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("invalid edit mode transition: from {from:?} using event {event:?}")]
    InvalidStateTransition { from: EditMode, event: EditEvent },
    #[error("operation requires {expected:?} mode but the editor is in {actual:?} mode")]
    WrongMode { expected: EditMode, actual: EditMode },
    #[error("mask painting requires Erase or Inpaint mode but the editor is in {actual:?} mode")]
    NoMask { actual: EditMode },
}
