/// Catalog queries and session registry operations.
pub mod game_service;
/// Per-game session task driving the round state machine.
pub mod session;
