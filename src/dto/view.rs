use serde::Serialize;

use crate::{
    dto::phase::VisiblePhase,
    state::{
        content::{GameDefinition, Question},
        feedback::{FeedbackPulse, FeedbackSignaler},
        state_machine::QuizStateMachine,
        summary::ResultSummary,
    },
};

/// Everything the presentation shell needs to render one frame of a game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundView {
    /// Game being played.
    pub game_id: String,
    /// Display title of the game.
    pub title: String,
    /// Current phase.
    pub phase: VisiblePhase,
    /// Zero-based index of the current question.
    pub current_index: u32,
    /// Number of questions.
    pub total: u32,
    /// Correct answers so far.
    pub score: u32,
    /// Coins earned so far.
    pub coins: u32,
    /// Whether the current round is closed to input.
    pub answered: bool,
    /// Seconds left in the current round, for reflex games.
    pub time_remaining: Option<u32>,
    /// Current question while playing.
    pub question: Option<QuestionView>,
    /// Outcome of the current round once resolved.
    pub feedback: Option<FeedbackPulse>,
    /// Result screen data once finished.
    pub summary: Option<ResultSummary>,
}

/// Question as shown to the player; correctness markers are not exposed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionView {
    /// Question identifier from the content file.
    pub id: u32,
    /// Text shown above the choices.
    pub prompt: String,
    /// Choices in display order.
    pub options: Vec<OptionView>,
}

/// A choice button.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionView {
    /// Button text.
    pub label: String,
    /// Emoji or icon shown next to the label.
    pub glyph: String,
}

impl From<&Question> for QuestionView {
    fn from(value: &Question) -> Self {
        Self {
            id: value.id,
            prompt: value.prompt.clone(),
            options: value
                .options
                .iter()
                .map(|option| OptionView {
                    label: option.label.clone(),
                    glyph: option.glyph.clone(),
                })
                .collect(),
        }
    }
}

impl RoundView {
    /// Assemble the read model from the engine parts of a session.
    pub fn build(
        game: &GameDefinition,
        machine: &QuizStateMachine<Question>,
        feedback: &FeedbackSignaler,
    ) -> Self {
        let state = machine.snapshot();
        Self {
            game_id: game.id.clone(),
            title: game.title.clone(),
            phase: state.phase.into(),
            current_index: state.current_index,
            total: machine.total(),
            score: state.score,
            coins: state.score.saturating_mul(game.rewards.coins_per_round),
            answered: state.answered,
            time_remaining: state.time_remaining,
            question: machine.current_question().map(Into::into),
            feedback: feedback.pulse(),
            summary: machine.summary(),
        }
    }
}
