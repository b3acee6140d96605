//! Library crate for quiz-round-engine, exposing modules for binaries and integration tests.

/// Engine configuration loaded at startup.
pub mod config;
/// Content file models, loading and lint.
pub mod dao;
/// Read models handed to the presentation layer.
pub mod dto;
/// Error types shared by the services.
pub mod error;
/// Game catalog queries and per-game session tasks.
pub mod services;
/// Shared state and the round engine.
pub mod state;
