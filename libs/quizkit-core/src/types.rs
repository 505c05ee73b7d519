//! Core types shared by the matcher, scheduler, and selector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Why a verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    Exact,
    Synonym,
    Fuzzy,
    Contains,
    Contained,
    Keywords,
    Ai,
    None,
}

/// Outcome of checking one answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchVerdict {
    pub matched: bool,
    /// Confidence between 0.0 and 1.0.
    pub score: f64,
    pub reason: MatchReason,
}

impl MatchVerdict {
    pub fn new(matched: bool, score: f64, reason: MatchReason) -> Self {
        Self {
            matched,
            score: score.clamp(0.0, 1.0),
            reason,
        }
    }

    /// Definite non-match.
    pub fn none(score: f64) -> Self {
        Self::new(false, score, MatchReason::None)
    }
}

/// Multiple-choice options with the index of the correct one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choices {
    pub options: Vec<String>,
    pub correct: usize,
}

/// An exercise item supplied by the host application.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    /// Topic-group tag used for rotation sampling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default)]
    pub question: String,
    /// Reference answers for free-text checking.
    #[serde(default)]
    pub answers: Vec<String>,
    /// Required concepts, used when no single reference answer exists.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Item-supplied synonyms merged into the matcher's table.
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Choices>,
}

impl Item {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answers.push(answer.into());
        self
    }
}

/// Practice sittings adapt to mastery; exam sittings follow a fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SittingMode {
    Practice,
    Exam,
}

impl Default for SittingMode {
    fn default() -> Self {
        Self::Practice
    }
}

/// Leitner state of a single item within a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemMasteryRecord {
    #[serde(rename = "box")]
    pub leitner_box: u8,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub last_seen_session: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_answered_at: Option<DateTime<Utc>>,
}

impl Default for ItemMasteryRecord {
    fn default() -> Self {
        Self {
            leitner_box: 1,
            correct_count: 0,
            wrong_count: 0,
            last_seen_session: 0,
            last_answered_at: None,
        }
    }
}

/// Mastery state for one subject, persisted as a whole.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectScheduleState {
    /// Number of sittings started; the due-ness clock.
    pub session_count: u32,
    pub items: HashMap<String, ItemMasteryRecord>,
}

/// Rotates the starting topic-group across practice sittings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRotationState {
    pub session_num: u32,
}

/// Aggregate mastery counts for a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MasteryStats {
    pub unseen: usize,
    /// Boxes 1 and 2.
    pub learning: usize,
    /// Boxes 3 and 4.
    pub reviewing: usize,
    /// Box 5.
    pub mastered: usize,
}

/// An item chosen for a sitting, annotated by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledItem {
    pub item: Item,
    #[serde(rename = "box")]
    pub leitner_box: u8,
    pub priority: u32,
    pub due: bool,
}

/// Fixed didactic order for exam sittings, listed by item id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamOrder {
    pub gentle_start: Vec<String>,
    pub core_recall: Vec<String>,
    pub application: Vec<String>,
    pub hardest: Vec<String>,
}

impl ExamOrder {
    /// All listed ids in phase order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.gentle_start
            .iter()
            .chain(&self.core_recall)
            .chain(&self.application)
            .chain(&self.hardest)
            .map(String::as_str)
    }
}

/// Global settings configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub fuzzy_threshold: f64,
    pub min_keyword_match: f64,
    pub semantic_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_cap: Option<usize>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.8,
            min_keyword_match: 0.5,
            semantic_fallback: true,
            session_cap: None,
        }
    }
}

/// Per-subject settings (all fields optional for overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectSettings {
    pub subject_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_cap: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_duration_minutes: Option<u32>,
    #[serde(default)]
    pub preserve_order: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_order: Option<ExamOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_keyword_match: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_fallback: Option<bool>,
}

impl SubjectSettings {
    /// Create new subject settings with only the id set.
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            ..Default::default()
        }
    }
}

/// Effective settings (global merged with subject overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveSettings {
    pub fuzzy_threshold: f64,
    pub min_keyword_match: f64,
    pub semantic_fallback: bool,
    pub session_cap: Option<usize>,
    pub exam_duration_minutes: Option<u32>,
    pub preserve_order: bool,
    pub exam_order: Option<ExamOrder>,
}

impl EffectiveSettings {
    /// Merge global settings with optional subject settings.
    pub fn merge(global: &GlobalSettings, subject: Option<&SubjectSettings>) -> Self {
        match subject {
            Some(s) => Self {
                fuzzy_threshold: s.fuzzy_threshold.unwrap_or(global.fuzzy_threshold),
                min_keyword_match: s.min_keyword_match.unwrap_or(global.min_keyword_match),
                semantic_fallback: s.semantic_fallback.unwrap_or(global.semantic_fallback),
                session_cap: s.session_cap.or(global.session_cap),
                exam_duration_minutes: s.exam_duration_minutes,
                preserve_order: s.preserve_order,
                exam_order: s.exam_order.clone(),
            },
            None => Self {
                fuzzy_threshold: global.fuzzy_threshold,
                min_keyword_match: global.min_keyword_match,
                semantic_fallback: global.semantic_fallback,
                session_cap: global.session_cap,
                exam_duration_minutes: None,
                preserve_order: false,
                exam_order: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_overrides_win() {
        let global = GlobalSettings::default();
        let subject = SubjectSettings {
            session_cap: Some(12),
            fuzzy_threshold: Some(0.9),
            ..SubjectSettings::new("geo")
        };
        let merged = EffectiveSettings::merge(&global, Some(&subject));
        assert_eq!(merged.session_cap, Some(12));
        assert_eq!(merged.fuzzy_threshold, 0.9);
        assert_eq!(merged.min_keyword_match, 0.5);
        assert!(merged.semantic_fallback);
    }

    #[test]
    fn missing_fields_load_as_defaults() {
        let state: SubjectScheduleState =
            serde_json::from_str(r#"{"items":{"q1":{"box":3}}}"#).unwrap();
        assert_eq!(state.session_count, 0);
        let record = &state.items["q1"];
        assert_eq!(record.leitner_box, 3);
        assert_eq!(record.correct_count, 0);
    }

    #[test]
    fn reason_serializes_lowercase() {
        let verdict = MatchVerdict::new(true, 1.0, MatchReason::Exact);
        let json = serde_json::to_string(&verdict).unwrap();
        assert_eq!(json, r#"{"matched":true,"score":1.0,"reason":"exact"}"#);
    }

    #[test]
    fn exam_order_ids_follow_phases() {
        let order = ExamOrder {
            gentle_start: vec!["a".into()],
            core_recall: vec!["b".into()],
            application: vec![],
            hardest: vec!["c".into()],
        };
        assert_eq!(order.ids().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }
}
