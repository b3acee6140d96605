use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dao::validation::validate_options;

/// Root of a content file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntity {
    /// Games in authoring order.
    pub games: Vec<GameEntity>,
}

/// A game as authored in the content file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct GameEntity {
    /// Stable identifier used for routing and reward lookups.
    #[validate(length(min = 1))]
    pub id: String,
    /// Display title.
    #[validate(length(min = 1))]
    pub title: String,
    /// Topic the game teaches.
    #[serde(default)]
    pub topic: String,
    /// Timed or untimed flow.
    #[serde(default)]
    pub mode: GameModeEntity,
    /// Fixed pass threshold; majority when omitted.
    #[serde(default)]
    pub pass_threshold: Option<u32>,
    /// Pause between an answer and the next round, in milliseconds.
    #[serde(default)]
    #[validate(range(min = 100, max = 10_000))]
    pub advance_delay_ms: Option<u64>,
    /// Coins and experience granted by the game.
    #[serde(default)]
    pub rewards: Option<RewardsEntity>,
    /// Questions in play order.
    pub questions: Vec<QuestionEntity>,
}

/// Authored game flow.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameModeEntity {
    /// Untimed quiz.
    #[default]
    Quiz,
    /// Timed reflex rounds; the configured default applies when `round_seconds` is omitted.
    Reflex {
        /// Seconds per round.
        #[serde(default)]
        round_seconds: Option<u32>,
    },
}

/// Reward metadata attached to a game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct RewardsEntity {
    /// Coins flashed for each correct answer.
    #[validate(range(max = 1_000))]
    pub coins_per_round: u32,
    /// Total coins the game can award.
    pub total_coins: u32,
    /// Total experience points the game can award.
    pub total_xp: u32,
}

/// A question as authored in the content file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Identifier unique within the game.
    pub id: u32,
    /// Prompt text.
    pub prompt: String,
    /// Options in display order.
    pub options: Vec<AnswerOptionEntity>,
}

impl Validate for QuestionEntity {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        let mut errors = validator::ValidationErrors::new();

        if self.prompt.trim().is_empty() {
            let mut err = validator::ValidationError::new("empty_prompt");
            err.message = Some("Question prompt must not be empty".into());
            errors.add("prompt", err);
        }

        if let Err(e) = validate_options(&self.options) {
            errors.add("options", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// A selectable answer as authored in the content file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerOptionEntity {
    /// Choice text.
    pub label: String,
    /// Optional decorative glyph.
    #[serde(default)]
    pub glyph: Option<String>,
    /// Missing flags count as incorrect.
    #[serde(default)]
    pub is_correct: bool,
}
