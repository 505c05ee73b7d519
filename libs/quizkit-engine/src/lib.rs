//! Embeddable runtime for the quizkit self-testing engine.
//!
//! Wraps the pure decision logic of `quizkit_core` with persistence,
//! semantic grading, and sitting orchestration.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod grader;
pub mod persist;
pub mod sitting;

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use config::EngineConfig;
pub use db::{DbError, KeyValueStore, MemoryStore, SqliteStore};
pub use engine::StudyEngine;
pub use error::{EngineError, Result};
pub use grader::{GradeError, GradeRequest, GradeResponse, HttpGrader, SemanticGrader};
pub use sitting::{AnswerCheck, Sitting, SittingTally, VerdictSource};

/// Install the global tracing subscriber. Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Open an engine backed by SQLite, with an HTTP grader when one is configured.
pub fn open_engine(config: &EngineConfig) -> anyhow::Result<StudyEngine<SqliteStore>> {
    if let Some(dir) = config.db_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating data directory {}", dir.display()))?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database...");
    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;

    let mut engine = StudyEngine::new(store)
        .with_cache_ttl(chrono::Duration::days(config.cache_ttl_days.clamp(1, 3650)));

    if let Some(url) = &config.grader_url {
        let grader = HttpGrader::new(url, config.grader_timeout)?;
        tracing::info!(endpoint = %url, "Semantic grading enabled");
        engine = engine.with_grader(Arc::new(grader));
    }

    Ok(engine)
}
