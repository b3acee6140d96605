//! Application-level configuration loading: round pacing and content location.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the engine looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_ENGINE_CONFIG_PATH";
/// Pause between an answer and the next round when a game does not set its own.
const DEFAULT_ADVANCE_DELAY_MS: u64 = 1_500;
/// Seconds per reflex round when a game does not set its own.
const DEFAULT_REFLEX_ROUND_SECONDS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Default feedback pause before advancing to the next round.
    pub advance_delay: Duration,
    /// Default countdown length for reflex games.
    pub reflex_round_seconds: u32,
    /// Content file to load instead of the built-in catalog.
    pub catalog_path: Option<PathBuf>,
    /// Refuse to run when the catalog has authoring issues.
    pub strict_content: bool,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        advance_delay_ms = app_config.advance_delay.as_millis() as u64,
                        reflex_round_seconds = app_config.reflex_round_seconds,
                        "loaded engine config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document; omitted keys keep their defaults.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            advance_delay: Duration::from_millis(DEFAULT_ADVANCE_DELAY_MS),
            reflex_round_seconds: DEFAULT_REFLEX_ROUND_SECONDS,
            catalog_path: None,
            strict_content: false,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default = "default_advance_delay_ms")]
    advance_delay_ms: u64,
    #[serde(default = "default_reflex_round_seconds")]
    reflex_round_seconds: u32,
    #[serde(default)]
    catalog_path: Option<PathBuf>,
    #[serde(default)]
    strict_content: bool,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            advance_delay: Duration::from_millis(value.advance_delay_ms),
            reflex_round_seconds: value.reflex_round_seconds.max(1),
            catalog_path: value.catalog_path,
            strict_content: value.strict_content,
        }
    }
}

fn default_advance_delay_ms() -> u64 {
    DEFAULT_ADVANCE_DELAY_MS
}

fn default_reflex_round_seconds() -> u32 {
    DEFAULT_REFLEX_ROUND_SECONDS
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
