use serde::Serialize;

use crate::state::state_machine::RoundPhase;

/// Round phase as exposed to the presentation shell.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// Timed game waiting for "Start".
    Ready,
    /// Rounds in progress.
    Playing,
    /// Result screen.
    Finished,
}

impl From<RoundPhase> for VisiblePhase {
    fn from(value: RoundPhase) -> Self {
        match value {
            RoundPhase::Ready => VisiblePhase::Ready,
            RoundPhase::Playing => VisiblePhase::Playing,
            RoundPhase::Finished => VisiblePhase::Finished,
        }
    }
}
