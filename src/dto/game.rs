use serde::Serialize;

use crate::state::content::{GameDefinition, GameMode};

/// Catalog entry as listed on the game picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    /// Identifier used to open a session.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Topic the game teaches.
    pub topic: String,
    /// Seconds per round for reflex games.
    pub round_seconds: Option<u32>,
    /// Number of rounds.
    pub questions: u32,
    /// Coins the game can award.
    pub total_coins: u32,
    /// Experience points the game can award.
    pub total_xp: u32,
}

impl From<&GameDefinition> for GameSummary {
    fn from(value: &GameDefinition) -> Self {
        Self {
            id: value.id.clone(),
            title: value.title.clone(),
            topic: value.topic.clone(),
            round_seconds: match value.mode {
                GameMode::Quiz => None,
                GameMode::Reflex { round_seconds } => Some(round_seconds),
            },
            questions: value.total(),
            total_coins: value.rewards.total_coins,
            total_xp: value.rewards.total_xp,
        }
    }
}
