//! Bounded cache of semantic grading results.

use chrono::{DateTime, Duration, Utc};
use quizkit_core::{normalize, MatchVerdict};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Most entries kept; inserting beyond this evicts the oldest.
pub const MAX_CACHE_ENTRIES: usize = 500;

/// A cached grading result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedGrade {
    pub timestamp: DateTime<Utc>,
    pub verdict: MatchVerdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Grading results keyed by (answer, expected answer, question).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SemanticCache {
    entries: HashMap<String, CachedGrade>,
}

impl SemanticCache {
    /// Cache key for a check; answers are normalized, the question is not.
    pub fn key(user_answer: &str, expected_answer: &str, question: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(normalize(user_answer).as_bytes());
        hasher.update([0x1f]);
        hasher.update(normalize(expected_answer).as_bytes());
        hasher.update([0x1f]);
        hasher.update(question.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A live entry, if one exists younger than `ttl`.
    pub fn get(&self, key: &str, now: DateTime<Utc>, ttl: Duration) -> Option<&CachedGrade> {
        self.entries
            .get(key)
            .filter(|entry| now.signed_duration_since(entry.timestamp) < ttl)
    }

    /// Insert or replace an entry, evicting the oldest beyond the cap.
    pub fn insert(&mut self, key: String, grade: CachedGrade) {
        self.entries.insert(key, grade);

        while self.entries.len() > MAX_CACHE_ENTRIES {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.timestamp)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}
