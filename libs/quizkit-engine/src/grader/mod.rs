//! Semantic answer grading through an external service.
//!
//! The grader is only consulted when the deterministic matcher is unsure.
//! Every failure is soft: callers keep the verdict they already have.

pub mod cache;
pub mod http;
pub mod mock;

use async_trait::async_trait;
use quizkit_core::{MatchReason, MatchVerdict};
use serde::{Deserialize, Serialize};

pub use cache::{CachedGrade, SemanticCache, MAX_CACHE_ENTRIES};
pub use http::HttpGrader;
pub use mock::MockGrader;

/// Grading errors.
#[derive(Debug, thiserror::Error)]
pub enum GradeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// One uncertain answer, with the question for context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRequest {
    pub user_answer: String,
    pub expected_answer: String,
    pub question: String,
}

/// The service's judgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeResponse {
    pub correct: bool,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl GradeResponse {
    pub fn verdict(&self) -> MatchVerdict {
        let fallback = if self.correct { 1.0 } else { 0.0 };
        MatchVerdict::new(self.correct, self.score.unwrap_or(fallback), MatchReason::Ai)
    }
}

/// An external judge for free-text answers.
#[async_trait]
pub trait SemanticGrader: Send + Sync {
    /// Human-readable grader name, for logs.
    fn name(&self) -> &str;

    async fn grade(&self, request: &GradeRequest) -> Result<GradeResponse, GradeError>;
}
