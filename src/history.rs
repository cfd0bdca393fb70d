//! Linear undo/redo history with truncate-on-branch semantics.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryAction {
    Undo,
    Redo,
}

impl HistoryAction {
    pub const fn applied_message(self) -> &'static str {
        match self {
            Self::Undo => "undo applied",
            Self::Redo => "redo applied",
        }
    }

    pub const fn empty_message(self) -> &'static str {
        match self {
            Self::Undo => "undo stack empty",
            Self::Redo => "redo stack empty",
        }
    }
}

/// Ordered states plus a cursor. The visible state is always `states[cursor]`.
///
/// The store is never empty: it is created with an initial state and
/// [`HistoryStore::reset`] truncates back to that state.
#[derive(Debug, Clone)]
pub struct HistoryStore<T> {
    states: Vec<T>,
    cursor: usize,
}

impl<T> HistoryStore<T> {
    pub fn new(initial: T) -> Self {
        Self {
            states: vec![initial],
            cursor: 0,
        }
    }

    /// Discards every state after the cursor, appends `state` and moves onto it.
    pub fn push(&mut self, state: T) {
        self.states.truncate(self.cursor + 1);
        self.states.push(state);
        self.cursor = self.states.len() - 1;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.states.len()
    }

    /// Moves the cursor back; future states stay redoable until the next push.
    pub fn undo(&mut self) -> bool {
        self.step(HistoryAction::Undo)
    }

    pub fn redo(&mut self) -> bool {
        self.step(HistoryAction::Redo)
    }

    pub fn step(&mut self, action: HistoryAction) -> bool {
        let moved = match action {
            HistoryAction::Undo if self.can_undo() => {
                self.cursor -= 1;
                true
            }
            HistoryAction::Redo if self.can_redo() => {
                self.cursor += 1;
                true
            }
            _ => false,
        };
        if moved {
            tracing::debug!(cursor = self.cursor, len = self.states.len(), "{}", action.applied_message());
        } else {
            tracing::debug!("{}", action.empty_message());
        }
        moved
    }

    /// Truncates to the initial state.
    pub fn reset(&mut self) {
        self.states.truncate(1);
        self.cursor = 0;
    }

    /// Replaces the whole history with a single new initial state.
    pub fn reseed(&mut self, initial: T) {
        self.states.clear();
        self.states.push(initial);
        self.cursor = 0;
    }

    pub fn current(&self) -> &T {
        &self.states[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
