//! Mutation state machine
//!
//! ```text
//! Started → Checking → Found → Writing → Committed
//!                    ↘ NotFound → Aborted
//! ```
//!
//! Any storage failure before `Committed` also ends in `Aborted`.

use std::fmt;

use crate::model::{EntityId, EntityKind};
use crate::storage::StoreResult;

/// What a mutation does to its entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// States of a single mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Started,
    Checking,
    Found,
    NotFound,
    Writing,
    Committed,
    Aborted,
}

impl MutationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationState::Started => "STARTED",
            MutationState::Checking => "CHECKING",
            MutationState::Found => "FOUND",
            MutationState::NotFound => "NOT_FOUND",
            MutationState::Writing => "WRITING",
            MutationState::Committed => "COMMITTED",
            MutationState::Aborted => "ABORTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MutationState::Committed | MutationState::Aborted)
    }

    /// Whether `next` may follow `self`
    pub fn can_transition_to(&self, next: MutationState) -> bool {
        use MutationState::*;
        matches!(
            (self, next),
            (Started, Checking)
                | (Checking, Found)
                | (Checking, NotFound)
                | (Found, Writing)
                | (Writing, Committed)
                | (NotFound, Aborted)
                | (Started, Aborted)
                | (Checking, Aborted)
                | (Found, Aborted)
                | (Writing, Aborted)
        )
    }
}

impl fmt::Display for MutationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks and logs the states one mutation passes through
#[derive(Debug)]
pub struct MutationTrace {
    kind: EntityKind,
    id: EntityId,
    operation: Operation,
    history: Vec<MutationState>,
}

impl MutationTrace {
    pub fn start(kind: EntityKind, id: EntityId, operation: Operation) -> Self {
        let trace = Self {
            kind,
            id,
            operation,
            history: vec![MutationState::Started],
        };
        trace.emit(MutationState::Started);
        trace
    }

    pub fn state(&self) -> MutationState {
        self.history
            .last()
            .copied()
            .unwrap_or(MutationState::Started)
    }

    pub fn history(&self) -> &[MutationState] {
        &self.history
    }

    /// Move to `next`
    ///
    /// Invalid transitions are a programming error; they are logged and
    /// ignored so the trace never lies about where the mutation is.
    pub fn advance(&mut self, next: MutationState) {
        let current = self.state();
        if !current.can_transition_to(next) {
            tracing::error!(
                entity = %self.kind,
                id = self.id,
                from = %current,
                to = %next,
                "invalid mutation transition"
            );
            debug_assert!(false, "invalid mutation transition {} -> {}", current, next);
            return;
        }
        self.history.push(next);
        self.emit(next);
    }

    /// Close the trace according to the mutation result
    pub fn finish<T>(&mut self, result: &StoreResult<T>) {
        match result {
            Ok(_) => {
                tracing::info!(
                    entity = %self.kind,
                    id = self.id,
                    operation = self.operation.as_str(),
                    "mutation committed"
                );
            }
            Err(err) => {
                if !self.state().is_terminal() {
                    self.advance(MutationState::Aborted);
                }
                tracing::warn!(
                    entity = %self.kind,
                    id = self.id,
                    operation = self.operation.as_str(),
                    failure = err.kind().code(),
                    error = %err,
                    "mutation aborted"
                );
            }
        }
    }

    fn emit(&self, state: MutationState) {
        tracing::debug!(
            entity = %self.kind,
            id = self.id,
            operation = self.operation.as_str(),
            state = state.as_str(),
            "mutation state"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreError;

    #[test]
    fn test_happy_path_transitions() {
        use MutationState::*;
        let path = [Started, Checking, Found, Writing, Committed];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?}", pair);
        }
    }

    #[test]
    fn test_not_found_path() {
        use MutationState::*;
        assert!(Checking.can_transition_to(NotFound));
        assert!(NotFound.can_transition_to(Aborted));
        assert!(!NotFound.can_transition_to(Writing));
    }

    #[test]
    fn test_terminal_states_are_final() {
        use MutationState::*;
        for next in [Started, Checking, Found, NotFound, Writing, Committed, Aborted] {
            assert!(!Committed.can_transition_to(next));
            assert!(!Aborted.can_transition_to(next));
        }
    }

    #[test]
    fn test_cannot_skip_check() {
        assert!(!MutationState::Started.can_transition_to(MutationState::Writing));
        assert!(!MutationState::Checking.can_transition_to(MutationState::Committed));
    }

    #[test]
    fn test_trace_records_history() {
        let mut trace = MutationTrace::start(EntityKind::Book, 7, Operation::Update);
        trace.advance(MutationState::Checking);
        trace.advance(MutationState::NotFound);
        let result: StoreResult<()> = Err(StoreError::not_found(EntityKind::Book, 7));
        trace.finish(&result);

        assert_eq!(
            trace.history(),
            &[
                MutationState::Started,
                MutationState::Checking,
                MutationState::NotFound,
                MutationState::Aborted
            ]
        );
    }

    #[test]
    fn test_finish_does_not_abort_twice() {
        let mut trace = MutationTrace::start(EntityKind::Author, 1, Operation::Delete);
        let result: StoreResult<()> = Err(StoreError::Transient("pool".into()));
        trace.finish(&result);
        trace.finish(&result);
        assert_eq!(trace.history().len(), 2);
        assert_eq!(trace.state(), MutationState::Aborted);
    }
}
