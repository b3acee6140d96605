use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
    dto::game::GameSummary,
    error::EngineError,
    services::session::{SessionHandle, SessionSettings},
    state::{
        SharedState,
        content::{GameDefinition, RewardProvider},
    },
};

/// List the playable games in catalog order.
pub fn list_games(state: &SharedState) -> Vec<GameSummary> {
    state
        .catalog()
        .iter()
        .map(|game| GameSummary::from(game.as_ref()))
        .collect()
}

/// Start a new instance of `game_id` and register it.
pub fn open_session(state: &SharedState, game_id: &str) -> Result<SessionHandle, EngineError> {
    let game = state
        .catalog()
        .get(game_id)
        .ok_or_else(|| EngineError::UnknownGame(game_id.to_string()))?;

    let handle = SessionHandle::spawn(game.clone(), session_settings(state, &game))?;
    state.sessions().insert(handle.id(), handle.clone());
    Ok(handle)
}

/// Look up a live session.
pub fn session(state: &SharedState, id: Uuid) -> Result<SessionHandle, EngineError> {
    state
        .sessions()
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or(EngineError::UnknownSession(id))
}

/// Tear a session down and forget it.
pub async fn close_session(state: &SharedState, id: Uuid) -> Result<(), EngineError> {
    let (_, handle) = state
        .sessions()
        .remove(&id)
        .ok_or(EngineError::UnknownSession(id))?;
    handle.close().await;
    info!(session_id = %id, remaining = state.sessions().len(), "session unregistered");
    Ok(())
}

/// Game the host should route to after `game_id`, if any.
pub fn next_game(state: &SharedState, game_id: &str) -> Option<Arc<GameDefinition>> {
    state.catalog().next_after(game_id)
}

fn session_settings(state: &SharedState, game: &GameDefinition) -> SessionSettings {
    let rewards = state.catalog().rewards(&game.id).unwrap_or_default();
    SessionSettings {
        advance_delay: game.advance_delay.unwrap_or(state.config().advance_delay),
        points_per_correct: rewards.coins_per_round,
    }
}
