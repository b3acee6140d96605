use std::{sync::Arc, time::Duration};

use crate::dao::models::{
    AnswerOptionEntity, GameEntity, GameModeEntity, QuestionEntity, RewardsEntity,
};

/// Anything the round state machine can grade.
///
/// Implementors only describe their options; the machine never assumes that exactly one option
/// is correct.
pub trait Gradable {
    /// Number of options a player can pick from.
    fn option_count(&self) -> usize;
    /// Whether picking `option` scores. Out-of-range options are never correct.
    fn is_correct(&self, option: usize) -> bool;
}

/// A single multiple-choice question of a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Identifier unique within the owning game.
    pub id: u32,
    /// Text shown as the question prompt.
    pub prompt: String,
    /// Options in display order.
    pub options: Vec<AnswerOption>,
}

/// One selectable answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    /// Text displayed on the choice button.
    pub label: String,
    /// Decorative glyph (usually an emoji) rendered next to the label.
    pub glyph: String,
    /// Whether choosing this option scores a point.
    pub is_correct: bool,
}

impl Gradable for Question {
    fn option_count(&self) -> usize {
        self.options.len()
    }

    fn is_correct(&self, option: usize) -> bool {
        self.options
            .get(option)
            .is_some_and(|candidate| candidate.is_correct)
    }
}

/// How rounds of a game are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// Untimed quiz: the game starts immediately and waits for each answer.
    Quiz,
    /// Reflex game: each round runs a countdown and expires unanswered rounds.
    Reflex {
        /// Seconds available to answer each round.
        round_seconds: u32,
    },
}

impl GameMode {
    /// Round duration for timed games.
    pub fn round_seconds(&self) -> Option<u32> {
        match self {
            GameMode::Quiz => None,
            GameMode::Reflex { round_seconds } => Some(*round_seconds),
        }
    }
}

/// Minimum score required to pass a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassThreshold {
    /// More than half of the questions, rounded up.
    Majority,
    /// Fixed number of correct answers chosen by the content author.
    Fixed(u32),
}

impl PassThreshold {
    /// Resolve the threshold for a game with `total` questions.
    pub fn resolve(&self, total: u32) -> u32 {
        match self {
            PassThreshold::Majority => total.div_ceil(2),
            PassThreshold::Fixed(value) => (*value).min(total),
        }
    }
}

/// Coins and experience granted by a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rewards {
    /// Coins flashed for every correctly answered round.
    pub coins_per_round: u32,
    /// Total coins the game can award.
    pub total_coins: u32,
    /// Total experience points the game can award.
    pub total_xp: u32,
}

/// Supplies reward metadata per game identifier.
pub trait RewardProvider {
    /// Rewards for `game_id`, if the game is known.
    fn rewards(&self, game_id: &str) -> Option<Rewards>;
}

/// Static definition of a playable game.
#[derive(Debug, Clone)]
pub struct GameDefinition {
    /// Stable identifier used for routing and reward lookups.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Topic the game teaches (e.g. "financial literacy").
    pub topic: String,
    /// Timed or untimed flow.
    pub mode: GameMode,
    /// Pass threshold applied on the result screen.
    pub pass_threshold: PassThreshold,
    /// Override for the pause between an answer and the next round.
    pub advance_delay: Option<Duration>,
    /// Reward metadata.
    pub rewards: Rewards,
    /// Questions in play order, shared with every running session.
    pub questions: Arc<[Question]>,
}

impl GameDefinition {
    /// Number of questions (rounds) in the game.
    pub fn total(&self) -> u32 {
        self.questions.len() as u32
    }
}

impl From<AnswerOptionEntity> for AnswerOption {
    fn from(value: AnswerOptionEntity) -> Self {
        Self {
            label: value.label,
            glyph: value.glyph.unwrap_or_default(),
            is_correct: value.is_correct,
        }
    }
}

impl From<QuestionEntity> for Question {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            prompt: value.prompt,
            options: value.options.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<RewardsEntity> for Rewards {
    fn from(value: RewardsEntity) -> Self {
        Self {
            coins_per_round: value.coins_per_round,
            total_coins: value.total_coins,
            total_xp: value.total_xp,
        }
    }
}

impl GameDefinition {
    /// Build the runtime definition, filling unset round durations with `default_round_seconds`.
    pub fn from_entity(value: GameEntity, default_round_seconds: u32) -> Self {
        let mode = match value.mode {
            GameModeEntity::Quiz => GameMode::Quiz,
            GameModeEntity::Reflex { round_seconds } => GameMode::Reflex {
                round_seconds: round_seconds.unwrap_or(default_round_seconds),
            },
        };

        Self {
            id: value.id,
            title: value.title,
            topic: value.topic,
            mode,
            pass_threshold: value
                .pass_threshold
                .map(PassThreshold::Fixed)
                .unwrap_or(PassThreshold::Majority),
            advance_delay: value.advance_delay_ms.map(Duration::from_millis),
            rewards: value.rewards.map(Into::into).unwrap_or_default(),
            questions: value.questions.into_iter().map(Into::into).collect(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn majority_threshold_rounds_up() {
        assert_eq!(PassThreshold::Majority.resolve(5), 3);
        assert_eq!(PassThreshold::Majority.resolve(4), 2);
        assert_eq!(PassThreshold::Majority.resolve(1), 1);
    }

    #[test]
    fn fixed_threshold_is_capped_at_total() {
        assert_eq!(PassThreshold::Fixed(3).resolve(5), 3);
        assert_eq!(PassThreshold::Fixed(8).resolve(5), 5);
    }

    #[test]
    fn out_of_range_option_is_never_correct() {
        let question = fixtures::question(1, 0);
        assert!(question.is_correct(0));
        assert!(!question.is_correct(1));
        assert!(!question.is_correct(42));
    }

    #[test]
    fn reflex_default_duration_applies_when_unset() {
        let entity = GameEntity {
            id: "quick".into(),
            title: "Quick".into(),
            topic: "health".into(),
            mode: GameModeEntity::Reflex {
                round_seconds: None,
            },
            pass_threshold: None,
            advance_delay_ms: Some(700),
            rewards: None,
            questions: Vec::new(),
        };

        let game = GameDefinition::from_entity(entity, 12);
        assert_eq!(game.mode.round_seconds(), Some(12));
        assert_eq!(game.pass_threshold, PassThreshold::Majority);
        assert_eq!(game.advance_delay, Some(Duration::from_millis(700)));
        assert_eq!(game.rewards, Rewards::default());
    }
}
