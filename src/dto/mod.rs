/// Game picker entries.
pub mod game;
/// Phase as exposed to the presentation layer.
pub mod phase;
/// Per-frame view of a running game.
pub mod view;
