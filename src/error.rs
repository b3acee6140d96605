use thiserror::Error;
use uuid::Uuid;

use crate::state::state_machine::RoundError;

/// Errors surfaced by the session services.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No game with this identifier exists in the catalog.
    #[error("unknown game `{0}`")]
    UnknownGame(String),
    /// No live session with this identifier exists.
    #[error("unknown session `{0}`")]
    UnknownSession(Uuid),
    /// The session task has shut down.
    #[error("session closed")]
    SessionClosed,
    /// The intent is not valid in the current round state.
    #[error(transparent)]
    Round(#[from] RoundError),
}

impl EngineError {
    /// Whether the error is a sequencing mistake by the caller rather than a missing resource.
    pub fn is_sequencing(&self) -> bool {
        matches!(self, EngineError::Round(_))
    }
}
