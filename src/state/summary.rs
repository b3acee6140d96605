use serde::Serialize;

use crate::state::content::PassThreshold;

/// Result screen category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The score reached the threshold.
    Pass,
    /// The score fell short; the player is offered a retry.
    Retry,
}

/// Final score of a finished game together with its pass/fail outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    /// Correct answers.
    pub score: u32,
    /// Number of questions in the game.
    pub total: u32,
    /// Score needed to pass.
    pub threshold: u32,
    /// Derived outcome.
    pub outcome: Outcome,
}

impl ResultSummary {
    /// Summarise a final score against the game's threshold policy.
    pub fn new(score: u32, total: u32, threshold: PassThreshold) -> Self {
        let threshold = threshold.resolve(total);
        let outcome = if score >= threshold {
            Outcome::Pass
        } else {
            Outcome::Retry
        };

        Self {
            score,
            total,
            threshold,
            outcome,
        }
    }

    /// Whether the player passed.
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Pass
    }

    /// Whether a retry should be offered.
    pub fn retry_eligible(&self) -> bool {
        self.outcome == Outcome::Retry
    }
}
