/// Ordered collection of playable games.
pub mod catalog;
/// Runtime question and game definitions.
pub mod content;
/// Transient correct/incorrect pulse.
pub mod feedback;
/// Round sequencing and scoring.
pub mod state_machine;
/// Pass or retry verdict.
pub mod summary;
/// Per-round countdown task.
pub mod timer;

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::{config::AppConfig, services::session::SessionHandle, state::catalog::Catalog};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state: configuration, content and the live game sessions.
pub struct AppState {
    config: AppConfig,
    catalog: Catalog,
    sessions: DashMap<Uuid, SessionHandle>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, catalog: Catalog) -> SharedState {
        Arc::new(Self {
            config,
            catalog,
            sessions: DashMap::new(),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Games available to play.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Registry of live sessions keyed by their identifier.
    pub fn sessions(&self) -> &DashMap<Uuid, SessionHandle> {
        &self.sessions
    }
}
