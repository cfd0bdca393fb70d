use super::error::{StateError, StateResult};
use super::{event::StateTransition, EditEvent, EditMode};

#[derive(Debug)]
pub struct StateMachine {
    state: EditMode,
    transition_history: Vec<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: EditMode::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> EditMode {
        self.state
    }

    pub fn can_transition(&self, event: EditEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: EditEvent) -> Option<EditMode> {
        match (self.state, event) {
            (EditMode::None, event) => event.target_mode(),
            (_, EditEvent::Apply | EditEvent::Cancel) => Some(EditMode::None),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: EditEvent) -> StateResult<EditMode> {
        tracing::debug!(from = ?self.state, event = ?event, "request edit mode transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid edit mode transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        let record = StateTransition::new(Some(self.state), event, next);
        self.state = next;
        self.transition_history.push(record);

        Ok(self.state)
    }

    /// Fails unless the machine is currently in `expected`.
    pub fn require(&self, expected: EditMode) -> StateResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(StateError::WrongMode {
                expected,
                actual: self.state,
            })
        }
    }

    /// Forces `None` without recording a transition; used when the session
    /// is reseeded with a new image.
    pub fn reset(&mut self) {
        self.state = EditMode::None;
        self.transition_history.clear();
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EditMode::{:?}", self.state)
    }
}
