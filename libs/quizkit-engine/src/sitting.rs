//! Per-sitting context handed to the rendering layer.

use quizkit_core::{EffectiveSettings, KeywordReport, MatchVerdict, ScheduledItem, SittingMode};
use serde::Serialize;
use std::time::Duration;

/// One practice or exam sitting, from start to summary.
#[derive(Debug, Clone, Serialize)]
pub struct Sitting {
    pub subject: String,
    pub mode: SittingMode,
    /// Mastery clock value this sitting runs at.
    pub session_count: u32,
    pub items: Vec<ScheduledItem>,
    pub settings: EffectiveSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<Duration>,
    pub tally: SittingTally,
}

impl Sitting {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// In-session answer counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SittingTally {
    pub answered: usize,
    pub correct: usize,
    pub wrong: usize,
}

impl SittingTally {
    pub fn record(&mut self, correct: bool) {
        self.answered += 1;
        if correct {
            self.correct += 1;
        } else {
            self.wrong += 1;
        }
    }

    /// Fraction answered correctly, 0.0 before the first answer.
    pub fn accuracy(&self) -> f64 {
        if self.answered == 0 {
            0.0
        } else {
            self.correct as f64 / self.answered as f64
        }
    }
}

/// Where a verdict came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictSource {
    Deterministic,
    Semantic,
    Cache,
}

/// Result of checking one answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerCheck {
    pub verdict: MatchVerdict,
    pub source: VerdictSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// Present when the item was graded against its keyword list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<KeywordReport>,
}
