//! Engine configuration from the environment.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_GRADER_TIMEOUT_SECS: u64 = 15;
const DEFAULT_CACHE_TTL_DAYS: i64 = 7;

/// Bootstrap settings for [`crate::open_engine`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub db_path: PathBuf,
    /// Grading endpoint; semantic fallback is off without one.
    pub grader_url: Option<String>,
    pub grader_timeout: Duration,
    pub cache_ttl_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            grader_url: None,
            grader_timeout: Duration::from_secs(DEFAULT_GRADER_TIMEOUT_SECS),
            cache_ttl_days: DEFAULT_CACHE_TTL_DAYS,
        }
    }
}

impl EngineConfig {
    /// Read `QUIZKIT_*` variables, loading `.env` first if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset or unparseable values keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            db_path: lookup("QUIZKIT_DB_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            grader_url: lookup("QUIZKIT_GRADER_URL").filter(|u| !u.trim().is_empty()),
            grader_timeout: parse_or(&lookup, "QUIZKIT_GRADER_TIMEOUT_SECS", DEFAULT_GRADER_TIMEOUT_SECS)
                .map_or(defaults.grader_timeout, Duration::from_secs),
            cache_ttl_days: parse_or(&lookup, "QUIZKIT_CACHE_TTL_DAYS", DEFAULT_CACHE_TTL_DAYS)
                .unwrap_or(defaults.cache_ttl_days),
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, %default, "invalid number, using default");
            None
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quizkit")
        .join("quizkit.db")
}
