use std::sync::Arc;

use thiserror::Error;

use crate::state::{
    content::{Gradable, PassThreshold},
    feedback::FeedbackPulse,
    summary::ResultSummary,
};

/// Top-level mode of a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Timed game waiting for the player to press "Start".
    Ready,
    /// Rounds are being played.
    Playing,
    /// Every question has been resolved; the result screen is shown.
    Finished,
}

/// Intents and signals that drive the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    /// Player pressed "Start" on a timed game.
    Start,
    /// Player picked an option of the current question.
    Answer {
        /// Index of the option in the question.
        option: usize,
    },
    /// Countdown of the current round reached zero.
    Expire,
    /// Feedback delay elapsed; move on to the next round.
    Advance,
    /// "Try Again" was pressed.
    Reset,
}

/// Error returned when an event is not valid in the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the machine was in when the event arrived.
    pub from: RoundPhase,
    /// The rejected event.
    pub event: RoundEvent,
}

/// Sequencing errors raised by [`QuizStateMachine`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    /// The event is not allowed in the current phase.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// Advance requested before the round was resolved.
    #[error("round {index} has not been answered yet")]
    NotAnswered {
        /// Index of the unresolved round.
        index: u32,
    },
    /// The option reference does not exist on the current question.
    #[error("option {option} does not exist (question has {available} options)")]
    UnknownOption {
        /// Rejected option index.
        option: usize,
        /// Number of options of the current question.
        available: usize,
    },
    /// Expiry signalled to a game without a countdown.
    #[error("untimed games cannot expire a round")]
    Untimed,
    /// A quiz cannot be built without questions.
    #[error("a quiz needs at least one question")]
    NoQuestions,
}

/// Result of an answer or an expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The round was closed by this call.
    Resolved(FeedbackPulse),
    /// The round had already been closed; nothing changed.
    Ignored,
}

/// Result of moving past a resolved round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// A new round started at `index`.
    NextRound {
        /// Index of the new current question.
        index: u32,
    },
    /// The last round was resolved.
    Finished(ResultSummary),
}

/// Observable state of a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundState {
    /// Current phase.
    pub phase: RoundPhase,
    /// Index of the current question.
    pub current_index: u32,
    /// Correct answers so far.
    pub score: u32,
    /// Whether the current round is closed to further answers.
    pub answered: bool,
    /// Seconds left in the current round, for timed games.
    pub time_remaining: Option<u32>,
}

/// Question sequencing, scoring and answer gating for one game instance.
#[derive(Debug, Clone)]
pub struct QuizStateMachine<Q> {
    questions: Arc<[Q]>,
    round_seconds: Option<u32>,
    points_per_correct: u32,
    threshold: PassThreshold,
    state: RoundState,
    epoch: u64,
}

impl<Q: Gradable> QuizStateMachine<Q> {
    /// Create a machine over `questions`.
    ///
    /// Timed games (`round_seconds` set) wait in [`RoundPhase::Ready`]; untimed games start
    /// playing right away.
    pub fn new(
        questions: Arc<[Q]>,
        round_seconds: Option<u32>,
        points_per_correct: u32,
        threshold: PassThreshold,
    ) -> Result<Self, RoundError> {
        if questions.is_empty() {
            return Err(RoundError::NoQuestions);
        }

        Ok(Self {
            state: initial_state(round_seconds),
            questions,
            round_seconds,
            points_per_correct,
            threshold,
            epoch: 0,
        })
    }

    /// Snapshot of the observable state.
    pub fn snapshot(&self) -> RoundState {
        self.state
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> RoundPhase {
        self.state.phase
    }

    /// Number of questions.
    pub fn total(&self) -> u32 {
        self.questions.len() as u32
    }

    /// Seconds per round for timed games.
    pub fn round_seconds(&self) -> Option<u32> {
        self.round_seconds
    }

    /// Counter bumped every time a new round opens; lets asynchronous signals detect staleness.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Question currently on screen, if the game is being played.
    pub fn current_question(&self) -> Option<&Q> {
        match self.state.phase {
            RoundPhase::Playing => self.questions.get(self.state.current_index as usize),
            RoundPhase::Ready | RoundPhase::Finished => None,
        }
    }

    /// Final summary once every round has been resolved.
    pub fn summary(&self) -> Option<ResultSummary> {
        (self.state.phase == RoundPhase::Finished)
            .then(|| ResultSummary::new(self.state.score, self.total(), self.threshold))
    }

    /// Leave [`RoundPhase::Ready`] and open the first round.
    pub fn start(&mut self) -> Result<(), RoundError> {
        self.ensure_phase(RoundPhase::Ready, RoundEvent::Start)?;
        self.state = RoundState {
            phase: RoundPhase::Playing,
            ..initial_state(self.round_seconds)
        };
        self.epoch += 1;
        Ok(())
    }

    /// Resolve the current round with the player's pick.
    ///
    /// Only the first resolution of a round counts; later calls return [`Resolution::Ignored`].
    pub fn submit_answer(&mut self, option: usize) -> Result<Resolution, RoundError> {
        self.ensure_phase(RoundPhase::Playing, RoundEvent::Answer { option })?;
        if self.state.answered {
            return Ok(Resolution::Ignored);
        }

        let question = &self.questions[self.state.current_index as usize];
        let available = question.option_count();
        if option >= available {
            return Err(RoundError::UnknownOption { option, available });
        }

        let pulse = if question.is_correct(option) {
            self.state.score += 1;
            FeedbackPulse::correct(self.points_per_correct)
        } else {
            FeedbackPulse::incorrect()
        };
        self.state.answered = true;

        Ok(Resolution::Resolved(pulse))
    }

    /// Resolve the current round as incorrect because its countdown ran out.
    pub fn expire_round(&mut self) -> Result<Resolution, RoundError> {
        self.ensure_phase(RoundPhase::Playing, RoundEvent::Expire)?;
        if self.round_seconds.is_none() {
            return Err(RoundError::Untimed);
        }
        if self.state.answered {
            return Ok(Resolution::Ignored);
        }

        self.state.answered = true;
        self.state.time_remaining = Some(0);
        Ok(Resolution::Resolved(FeedbackPulse::incorrect()))
    }

    /// Record a countdown tick. Returns `false` when the tick no longer applies to an open round.
    pub fn tick(&mut self, remaining: u32) -> bool {
        let Some(limit) = self.round_seconds else {
            return false;
        };
        if self.state.phase != RoundPhase::Playing || self.state.answered {
            return false;
        }

        self.state.time_remaining = Some(remaining.min(limit));
        true
    }

    /// Move past a resolved round.
    pub fn advance(&mut self) -> Result<Advance, RoundError> {
        self.ensure_phase(RoundPhase::Playing, RoundEvent::Advance)?;
        if !self.state.answered {
            return Err(RoundError::NotAnswered {
                index: self.state.current_index,
            });
        }

        if self.state.current_index + 1 >= self.total() {
            self.state.phase = RoundPhase::Finished;
            self.epoch += 1;
            let summary = ResultSummary::new(self.state.score, self.total(), self.threshold);
            return Ok(Advance::Finished(summary));
        }

        self.state.current_index += 1;
        self.state.answered = false;
        self.state.time_remaining = self.round_seconds;
        self.epoch += 1;

        Ok(Advance::NextRound {
            index: self.state.current_index,
        })
    }

    /// Return to the initial state of a freshly created machine.
    pub fn reset(&mut self) {
        self.state = initial_state(self.round_seconds);
        self.epoch += 1;
    }

    fn ensure_phase(&self, expected: RoundPhase, event: RoundEvent) -> Result<(), RoundError> {
        if self.state.phase != expected {
            return Err(InvalidTransition {
                from: self.state.phase,
                event,
            }
            .into());
        }
        Ok(())
    }
}

fn initial_state(round_seconds: Option<u32>) -> RoundState {
    RoundState {
        phase: if round_seconds.is_some() {
            RoundPhase::Ready
        } else {
            RoundPhase::Playing
        },
        current_index: 0,
        score: 0,
        answered: false,
        time_remaining: round_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::content::{AnswerOption, Question, fixtures};
    use crate::state::summary::Outcome;

    fn untimed() -> QuizStateMachine<Question> {
        QuizStateMachine::new(fixtures::five_questions(), None, 10, PassThreshold::Fixed(3))
            .unwrap()
    }

    fn timed() -> QuizStateMachine<Question> {
        QuizStateMachine::new(
            fixtures::five_questions(),
            Some(10),
            10,
            PassThreshold::Fixed(3),
        )
        .unwrap()
    }

    fn answer_and_advance(sm: &mut QuizStateMachine<Question>, option: usize) -> Advance {
        sm.submit_answer(option).unwrap();
        sm.advance().unwrap()
    }

    #[test]
    fn untimed_quiz_starts_playing() {
        let sm = untimed();
        let state = sm.snapshot();
        assert_eq!(state.phase, RoundPhase::Playing);
        assert_eq!(state.current_index, 0);
        assert_eq!(state.time_remaining, None);
        assert!(sm.current_question().is_some());
    }

    #[test]
    fn timed_quiz_waits_for_start() {
        let mut sm = timed();
        assert_eq!(sm.phase(), RoundPhase::Ready);
        assert!(sm.current_question().is_none());

        sm.start().unwrap();
        assert_eq!(sm.phase(), RoundPhase::Playing);
        assert_eq!(sm.snapshot().time_remaining, Some(10));
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut sm = timed();
        sm.start().unwrap();
        let err = sm.start().unwrap_err();
        assert_eq!(
            err,
            RoundError::InvalidTransition(InvalidTransition {
                from: RoundPhase::Playing,
                event: RoundEvent::Start,
            })
        );
    }

    #[test]
    fn answering_before_start_is_rejected() {
        let mut sm = timed();
        assert!(matches!(
            sm.submit_answer(0),
            Err(RoundError::InvalidTransition(InvalidTransition {
                from: RoundPhase::Ready,
                ..
            }))
        ));
    }

    #[test]
    fn alternating_answers_score_three_and_pass() {
        let mut sm = untimed();
        let picks = [0, 1, 0, 2, 0];

        let mut last = None;
        for option in picks {
            last = Some(answer_and_advance(&mut sm, option));
        }

        let Some(Advance::Finished(summary)) = last else {
            panic!("expected the quiz to finish, got {last:?}");
        };
        assert_eq!(summary.score, 3);
        assert_eq!(summary.outcome, Outcome::Pass);
        assert_eq!(sm.phase(), RoundPhase::Finished);
        assert_eq!(sm.summary(), Some(summary));
    }

    #[test]
    fn full_traversal_takes_exactly_n_resolutions() {
        let mut sm = untimed();
        for expected in 1..5 {
            match answer_and_advance(&mut sm, 1) {
                Advance::NextRound { index } => assert_eq!(index, expected),
                other => panic!("finished too early: {other:?}"),
            }
            assert!(!sm.snapshot().answered);
        }
        assert!(matches!(answer_and_advance(&mut sm, 1), Advance::Finished(_)));
    }

    #[test]
    fn second_answer_in_round_is_ignored() {
        let mut sm = untimed();
        assert_eq!(
            sm.submit_answer(0).unwrap(),
            Resolution::Resolved(FeedbackPulse::correct(10))
        );
        assert_eq!(sm.submit_answer(1).unwrap(), Resolution::Ignored);
        assert_eq!(sm.submit_answer(0).unwrap(), Resolution::Ignored);
        assert_eq!(sm.snapshot().score, 1);
    }

    #[test]
    fn score_never_exceeds_rounds_played() {
        let mut sm = untimed();
        for _ in 0..4 {
            sm.submit_answer(0).unwrap();
            sm.submit_answer(0).unwrap();
            let state = sm.snapshot();
            assert!(state.score <= state.current_index + 1);
            sm.advance().unwrap();
        }
    }

    #[test]
    fn expiry_closes_round_and_blocks_late_answers() {
        let mut sm = timed();
        sm.start().unwrap();
        assert!(sm.tick(3));

        assert_eq!(
            sm.expire_round().unwrap(),
            Resolution::Resolved(FeedbackPulse::incorrect())
        );
        assert_eq!(sm.snapshot().time_remaining, Some(0));
        assert_eq!(sm.submit_answer(0).unwrap(), Resolution::Ignored);
        assert!(!sm.tick(2));
        assert_eq!(sm.snapshot().score, 0);

        assert_eq!(sm.advance().unwrap(), Advance::NextRound { index: 1 });
        assert_eq!(sm.snapshot().time_remaining, Some(10));
    }

    #[test]
    fn expiry_after_answer_is_ignored() {
        let mut sm = timed();
        sm.start().unwrap();
        sm.submit_answer(0).unwrap();
        assert_eq!(sm.expire_round().unwrap(), Resolution::Ignored);
        assert_eq!(sm.snapshot().score, 1);
    }

    #[test]
    fn untimed_games_cannot_expire() {
        let mut sm = untimed();
        assert_eq!(sm.expire_round().unwrap_err(), RoundError::Untimed);
        assert!(!sm.tick(5));
    }

    #[test]
    fn advance_requires_resolution() {
        let mut sm = untimed();
        assert_eq!(
            sm.advance().unwrap_err(),
            RoundError::NotAnswered { index: 0 }
        );
    }

    #[test]
    fn operations_after_finish_fail_fast() {
        let mut sm = untimed();
        for _ in 0..5 {
            answer_and_advance(&mut sm, 0);
        }

        assert!(matches!(
            sm.submit_answer(0),
            Err(RoundError::InvalidTransition(InvalidTransition {
                from: RoundPhase::Finished,
                event: RoundEvent::Answer { option: 0 },
            }))
        ));
        assert!(sm.advance().is_err());
        assert!(sm.current_question().is_none());
    }

    #[test]
    fn unknown_option_is_rejected_without_closing_round() {
        let mut sm = untimed();
        assert_eq!(
            sm.submit_answer(7).unwrap_err(),
            RoundError::UnknownOption {
                option: 7,
                available: 3
            }
        );
        assert!(!sm.snapshot().answered);
    }

    #[test]
    fn question_without_correct_option_resolves_as_incorrect() {
        let broken = Question {
            id: 1,
            prompt: "no right answer".into(),
            options: vec![
                AnswerOption {
                    label: "a".into(),
                    glyph: String::new(),
                    is_correct: false,
                },
                AnswerOption {
                    label: "b".into(),
                    glyph: String::new(),
                    is_correct: false,
                },
            ],
        };
        let mut sm =
            QuizStateMachine::new(Arc::from(vec![broken]), None, 5, PassThreshold::Majority)
                .unwrap();

        assert_eq!(
            sm.submit_answer(0).unwrap(),
            Resolution::Resolved(FeedbackPulse::incorrect())
        );
        assert!(matches!(sm.advance().unwrap(), Advance::Finished(summary) if summary.score == 0));
    }

    #[test]
    fn any_marked_option_scores_when_several_are_correct() {
        let option = |label: &str, is_correct| AnswerOption {
            label: label.into(),
            glyph: String::new(),
            is_correct,
        };
        let ambiguous = Question {
            id: 1,
            prompt: "two right answers".into(),
            options: vec![option("a", true), option("b", true), option("c", false)],
        };
        let questions: Arc<[Question]> = Arc::from(vec![ambiguous; 3]);

        let mut sm = QuizStateMachine::new(questions, None, 5, PassThreshold::Majority).unwrap();
        for pick in [0, 1, 2] {
            sm.submit_answer(pick).unwrap();
            sm.advance().unwrap();
        }

        let summary = sm.summary().unwrap();
        assert_eq!(summary.score, 2);
        assert_eq!(summary.outcome, Outcome::Pass);
    }

    #[test]
    fn reset_from_finished_matches_fresh_machine() {
        for fresh in [untimed(), timed()] {
            let mut sm = fresh.clone();
            if sm.phase() == RoundPhase::Ready {
                sm.start().unwrap();
            }
            for _ in 0..5 {
                answer_and_advance(&mut sm, 0);
            }
            assert_eq!(sm.phase(), RoundPhase::Finished);

            sm.reset();
            assert_eq!(sm.snapshot(), fresh.snapshot());
            assert!(sm.epoch() > fresh.epoch());
        }
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let err = QuizStateMachine::<Question>::new(
            Arc::from(Vec::new()),
            None,
            0,
            PassThreshold::Majority,
        )
        .unwrap_err();
        assert_eq!(err, RoundError::NoQuestions);
    }
}
