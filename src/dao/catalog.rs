//! Loading and linting of the game content catalog.

use std::{collections::HashSet, fmt, fs, path::Path};

use thiserror::Error;
use tracing::{info, warn};
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{CatalogEntity, GameEntity},
    state::{catalog::Catalog, content::GameDefinition},
};

/// Content shipped with the binary.
pub const BUILTIN_CATALOG: &str = include_str!("../../content/catalog.json");
/// Origin label used in logs and errors for [`BUILTIN_CATALOG`].
pub const BUILTIN_ORIGIN: &str = "<built-in>";

/// Failures that prevent a catalog from being used at all.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The content file could not be read.
    #[error("failed to read catalog `{}`", path.display())]
    Read {
        /// File that failed to open.
        path: std::path::PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The content is not valid JSON for the catalog schema.
    #[error("failed to parse catalog `{origin}`")]
    Parse {
        /// Path or label of the content.
        origin: String,
        /// Underlying deserialization failure.
        #[source]
        source: serde_json::Error,
    },
    /// Two games share an identifier.
    #[error("duplicate game id `{id}` in catalog `{origin}`")]
    DuplicateGame {
        /// Path or label of the content.
        origin: String,
        /// Repeated identifier.
        id: String,
    },
    /// A game has no question and cannot be played.
    #[error("game `{id}` in catalog `{origin}` has no questions")]
    EmptyGame {
        /// Path or label of the content.
        origin: String,
        /// Identifier of the empty game.
        id: String,
    },
}

/// A content authoring mistake that does not stop the catalog from loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthoringIssue {
    /// Game the issue belongs to.
    pub game_id: String,
    /// Offending question, when the issue is question-level.
    pub question_id: Option<u32>,
    /// Field that failed validation.
    pub field: String,
    /// Stable machine-readable code (e.g. `no_correct_option`).
    pub code: String,
    /// Human readable explanation.
    pub message: String,
}

impl fmt::Display for AuthoringIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game `{}`", self.game_id)?;
        if let Some(question_id) = self.question_id {
            write!(f, ", question {question_id}")?;
        }
        write!(f, ", {}: {} ({})", self.field, self.message, self.code)
    }
}

/// A usable catalog together with the authoring issues found while loading it.
#[derive(Debug)]
pub struct LoadedCatalog {
    /// Games ready to be played.
    pub catalog: Catalog,
    /// Issues reported by the lint pass; empty for clean content.
    pub issues: Vec<AuthoringIssue>,
}

/// Load the catalog from `path`, or the built-in content when no path is given.
pub fn load_catalog(
    path: Option<&Path>,
    default_round_seconds: u32,
) -> Result<LoadedCatalog, CatalogError> {
    let loaded = match path {
        Some(path) => {
            let contents = fs::read_to_string(path).map_err(|source| CatalogError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            parse_catalog(&path.display().to_string(), &contents, default_round_seconds)?
        }
        None => parse_catalog(BUILTIN_ORIGIN, BUILTIN_CATALOG, default_round_seconds)?,
    };

    info!(
        games = loaded.catalog.len(),
        issues = loaded.issues.len(),
        "loaded game catalog"
    );
    for issue in &loaded.issues {
        warn!(%issue, "content authoring issue");
    }

    Ok(loaded)
}

/// Parse catalog JSON, lint it and convert it into runtime definitions.
pub fn parse_catalog(
    origin: &str,
    json: &str,
    default_round_seconds: u32,
) -> Result<LoadedCatalog, CatalogError> {
    let entity: CatalogEntity =
        serde_json::from_str(json).map_err(|source| CatalogError::Parse {
            origin: origin.to_string(),
            source,
        })?;

    let mut seen = HashSet::new();
    for game in &entity.games {
        if !seen.insert(game.id.as_str()) {
            return Err(CatalogError::DuplicateGame {
                origin: origin.to_string(),
                id: game.id.clone(),
            });
        }
        if game.questions.is_empty() {
            return Err(CatalogError::EmptyGame {
                origin: origin.to_string(),
                id: game.id.clone(),
            });
        }
    }

    let issues = lint(&entity);
    let catalog = Catalog::new(
        entity
            .games
            .into_iter()
            .map(|game| GameDefinition::from_entity(game, default_round_seconds)),
    );

    Ok(LoadedCatalog { catalog, issues })
}

/// Run every authoring check over the content.
pub fn lint(entity: &CatalogEntity) -> Vec<AuthoringIssue> {
    entity.games.iter().flat_map(lint_game).collect()
}

fn lint_game(game: &GameEntity) -> Vec<AuthoringIssue> {
    let mut issues = Vec::new();

    if let Err(errors) = game.validate() {
        collect(&mut issues, &game.id, None, &errors);
    }

    if let Some(Err(errors)) = game.rewards.as_ref().map(Validate::validate) {
        collect(&mut issues, &game.id, None, &errors);
    }

    if game.pass_threshold == Some(0) {
        issues.push(AuthoringIssue {
            game_id: game.id.clone(),
            question_id: None,
            field: "pass_threshold".into(),
            code: "threshold_zero".into(),
            message: "a threshold of 0 passes every attempt".into(),
        });
    }

    if let Some(threshold) = game
        .pass_threshold
        .filter(|threshold| *threshold as usize > game.questions.len())
    {
        issues.push(AuthoringIssue {
            game_id: game.id.clone(),
            question_id: None,
            field: "pass_threshold".into(),
            code: "threshold_above_total".into(),
            message: format!(
                "threshold {threshold} cannot be reached with {} questions",
                game.questions.len()
            ),
        });
    }

    let mut question_ids = HashSet::new();
    for question in &game.questions {
        if !question_ids.insert(question.id) {
            issues.push(AuthoringIssue {
                game_id: game.id.clone(),
                question_id: Some(question.id),
                field: "id".into(),
                code: "duplicate_question_id".into(),
                message: "question id is used more than once".into(),
            });
        }

        if let Err(errors) = question.validate() {
            collect(&mut issues, &game.id, Some(question.id), &errors);
        }
    }

    issues
}

fn collect(
    issues: &mut Vec<AuthoringIssue>,
    game_id: &str,
    question_id: Option<u32>,
    errors: &ValidationErrors,
) {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    for (field, field_errors) in fields {
        for error in field_errors {
            issues.push(AuthoringIssue {
                game_id: game_id.to_string(),
                question_id,
                field: field.to_string(),
                code: error.code.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| format!("failed `{}` check", error.code)),
            });
        }
    }
}
