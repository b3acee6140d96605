//! Validate a content catalog and exit non-zero when it has authoring issues.
//!
//! Usage: `catalog-lint [path/to/catalog.json]`. Without a path the configured catalog (or the
//! built-in one) is checked.

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use quiz_round_engine::{config::AppConfig, dao::catalog::load_catalog};

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "error".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load();
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or(config.catalog_path);

    let loaded = load_catalog(path.as_deref(), config.reflex_round_seconds)
        .context("loading catalog")?;

    for issue in &loaded.issues {
        println!("{issue}");
    }

    if loaded.issues.is_empty() {
        println!("{} games, no authoring issues", loaded.catalog.len());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{} authoring issue(s)", loaded.issues.len());
        Ok(ExitCode::FAILURE)
    }
}
