use serde::Serialize;

/// Transient "was the last answer right" signal that drives flash points and confetti.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedbackPulse {
    /// Whether the resolved round scored.
    pub is_correct: bool,
    /// Points flashed to the player; zero for incorrect or expired rounds.
    pub points: u32,
}

impl FeedbackPulse {
    /// Pulse emitted for a scoring answer.
    pub fn correct(points: u32) -> Self {
        Self {
            is_correct: true,
            points,
        }
    }

    /// Pulse emitted for a wrong answer or an expired round.
    pub fn incorrect() -> Self {
        Self {
            is_correct: false,
            points: 0,
        }
    }

    /// Confetti is only thrown for correct answers.
    pub fn celebrates(&self) -> bool {
        self.is_correct
    }
}

/// Holds the pulse of the current round until the next round starts.
#[derive(Debug, Default, Clone)]
pub struct FeedbackSignaler {
    pulse: Option<FeedbackPulse>,
}

impl FeedbackSignaler {
    /// Create a signaler with no pending pulse.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the pulse; called whenever a round starts.
    pub fn reset(&mut self) {
        self.pulse = None;
    }

    /// Record the outcome of the current round.
    ///
    /// Only the first signal of a round sticks; later signals are dropped until [`reset`].
    ///
    /// [`reset`]: FeedbackSignaler::reset
    pub fn signal(&mut self, points: u32, is_correct: bool) -> bool {
        if self.pulse.is_some() {
            return false;
        }

        self.pulse = Some(if is_correct {
            FeedbackPulse::correct(points)
        } else {
            FeedbackPulse::incorrect()
        });
        true
    }

    /// Current pulse, if the round has been resolved.
    pub fn pulse(&self) -> Option<FeedbackPulse> {
        self.pulse
    }
}
