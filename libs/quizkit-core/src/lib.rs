//! Core decision logic for the adaptive self-testing engine.
//!
//! Provides:
//! - Text normalization and Levenshtein similarity for typed answers
//! - A curated, bidirectional synonym table
//! - The tiered answer matcher (exact, fuzzy, containment, keyword-set)
//! - Leitner-box mastery scheduling
//! - Session selection for practice and exam sittings
//!
//! Everything here is synchronous and total: malformed or empty input
//! degrades to a conservative result instead of an error.

pub mod matching;
pub mod normalize;
pub mod scheduler;
pub mod selector;
pub mod similarity;
pub mod synonyms;
pub mod types;

pub use matching::{check, check_keywords, KeywordReport, MatchOptions};
pub use normalize::normalize;
pub use scheduler::{Leitner, DEFAULT_INTERVALS, MAX_BOX};
pub use selector::select;
pub use similarity::{levenshtein_distance, similarity};
pub use synonyms::SynonymTable;
pub use types::{
    Choices, EffectiveSettings, ExamOrder, GlobalSettings, Item, ItemMasteryRecord, MasteryStats,
    MatchReason, MatchVerdict, ScheduledItem, SessionRotationState, SittingMode,
    SubjectScheduleState, SubjectSettings,
};
