//! Answer matching for typed answers.
//!
//! [`check`] runs a fixed sequence of tiers and stops at the first one that
//! accepts the answer:
//!
//! 1. exact (or synonym) equality after normalization
//! 2. fuzzy similarity against each acceptable form, first hit wins
//! 3. containment in either direction
//! 4. keyword overlap for multi-word answers
//!
//! When nothing fires, the verdict carries the best fuzzy score seen.

use crate::normalize::normalize;
use crate::similarity::similarity;
use crate::synonyms::SynonymTable;
use crate::types::{EffectiveSettings, MatchReason, MatchVerdict};
use serde::{Deserialize, Serialize};

const CONTAINS_SCORE: f64 = 0.9;
const CONTAINED_SCORE: f64 = 0.85;
const KEYWORD_WEIGHT: f64 = 0.8;
const MIN_CONTAINMENT_LEN: usize = 3;
const MIN_TOKEN_LEN: usize = 3;

/// Tuning and tier toggles for [`check`] and [`check_keywords`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    pub fuzzy_threshold: f64,
    pub min_keyword_match: f64,
    pub use_synonyms: bool,
    pub use_fuzzy: bool,
    pub use_containment: bool,
    pub use_keywords: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.8,
            min_keyword_match: 0.5,
            use_synonyms: true,
            use_fuzzy: true,
            use_containment: true,
            use_keywords: true,
        }
    }
}

impl MatchOptions {
    pub fn from_settings(settings: &EffectiveSettings) -> Self {
        Self {
            fuzzy_threshold: settings.fuzzy_threshold,
            min_keyword_match: settings.min_keyword_match,
            ..Self::default()
        }
    }
}

/// Check a typed answer against the expected answers.
pub fn check<S: AsRef<str>>(
    user_answer: &str,
    expected_answers: &[S],
    options: &MatchOptions,
    synonyms: &SynonymTable,
) -> MatchVerdict {
    let input = normalize(user_answer);
    if input.is_empty() {
        return MatchVerdict::none(0.0);
    }

    let direct: Vec<String> = expected_answers
        .iter()
        .map(|answer| normalize(answer.as_ref()))
        .filter(|answer| !answer.is_empty())
        .collect();
    let acceptable = acceptable_set(&direct, options, synonyms);
    if acceptable.is_empty() {
        return MatchVerdict::none(0.0);
    }

    if direct.contains(&input) {
        return MatchVerdict::new(true, 1.0, MatchReason::Exact);
    }
    if acceptable.contains(&input) {
        return MatchVerdict::new(true, 1.0, MatchReason::Synonym);
    }

    let mut best = 0.0_f64;
    if options.use_fuzzy {
        for candidate in &acceptable {
            let score = similarity(&input, candidate);
            if score >= options.fuzzy_threshold {
                return MatchVerdict::new(true, score, MatchReason::Fuzzy);
            }
            best = best.max(score);
        }
    }

    if options.use_containment {
        if let Some(verdict) = containment(&input, &acceptable) {
            return verdict;
        }
    }

    if options.use_keywords {
        if let Some(verdict) = keyword_overlap(&input, &acceptable, options) {
            return verdict;
        }
    }

    MatchVerdict::none(best)
}

/// Normalized expected answers followed by their synonym expansions.
fn acceptable_set(direct: &[String], options: &MatchOptions, synonyms: &SynonymTable) -> Vec<String> {
    let mut acceptable: Vec<String> = Vec::new();
    for answer in direct {
        let forms = if options.use_synonyms {
            synonyms.expand(answer)
        } else {
            vec![answer.clone()]
        };
        for form in forms {
            if !form.is_empty() && !acceptable.contains(&form) {
                acceptable.push(form);
            }
        }
    }
    acceptable
}

fn containment(input: &str, acceptable: &[String]) -> Option<MatchVerdict> {
    let input_len = input.chars().count();
    for candidate in acceptable {
        if candidate.chars().count() >= MIN_CONTAINMENT_LEN && input.contains(candidate.as_str()) {
            return Some(MatchVerdict::new(true, CONTAINS_SCORE, MatchReason::Contains));
        }
        if input_len >= MIN_CONTAINMENT_LEN && candidate.contains(input) {
            return Some(MatchVerdict::new(true, CONTAINED_SCORE, MatchReason::Contained));
        }
    }
    None
}

fn keyword_overlap(input: &str, acceptable: &[String], options: &MatchOptions) -> Option<MatchVerdict> {
    if input.split_whitespace().count() < 2 {
        return None;
    }
    let input_tokens = tokens(input);
    if input_tokens.is_empty() {
        return None;
    }

    let best_fraction = acceptable
        .iter()
        .filter_map(|candidate| {
            let wanted = tokens(candidate);
            if wanted.is_empty() {
                return None;
            }
            let hits = wanted
                .iter()
                .filter(|w| {
                    input_tokens
                        .iter()
                        .any(|t| t == *w || similarity(t, w) >= options.fuzzy_threshold)
                })
                .count();
            Some(hits as f64 / wanted.len() as f64)
        })
        .fold(0.0_f64, f64::max);

    (best_fraction > 0.0 && best_fraction >= options.min_keyword_match)
        .then(|| MatchVerdict::new(true, best_fraction * KEYWORD_WEIGHT, MatchReason::Keywords))
}

fn tokens(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .collect()
}

/// Result of grading an answer against a list of required concepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordReport {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    /// Fraction of keywords found, 0.0 to 1.0.
    pub ratio: f64,
    pub passed: bool,
}

impl KeywordReport {
    pub fn verdict(&self) -> MatchVerdict {
        if self.passed {
            MatchVerdict::new(true, self.ratio, MatchReason::Keywords)
        } else {
            MatchVerdict::none(self.ratio)
        }
    }
}

/// Grade an answer by which required keywords it mentions.
///
/// A keyword counts when any of its synonym forms appears as a whole-word
/// phrase in the answer, or when a single-word form is within the fuzzy
/// threshold of some answer token.
pub fn check_keywords<S: AsRef<str>>(
    user_answer: &str,
    keywords: &[S],
    options: &MatchOptions,
    synonyms: &SynonymTable,
) -> KeywordReport {
    let input = normalize(user_answer);
    let padded = format!(" {input} ");
    let input_tokens: Vec<&str> = input.split_whitespace().collect();

    let mut matched = Vec::new();
    let mut missing = Vec::new();

    for keyword in keywords {
        let keyword = keyword.as_ref().trim();
        let forms = if options.use_synonyms {
            synonyms.expand(keyword)
        } else {
            vec![normalize(keyword)]
        };
        if forms.iter().all(|f| f.is_empty()) {
            continue;
        }

        let found = !input.is_empty()
            && forms.iter().filter(|f| !f.is_empty()).any(|form| {
                padded.contains(&format!(" {form} "))
                    || (options.use_fuzzy
                        && !form.contains(' ')
                        && input_tokens
                            .iter()
                            .any(|t| similarity(t, form) >= options.fuzzy_threshold))
            });

        if found {
            matched.push(keyword.to_string());
        } else {
            missing.push(keyword.to_string());
        }
    }

    let total = matched.len() + missing.len();
    let ratio = if total == 0 {
        0.0
    } else {
        matched.len() as f64 / total as f64
    };

    KeywordReport {
        passed: total > 0 && ratio >= options.min_keyword_match,
        matched,
        missing,
        ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(input: &str, expected: &[&str]) -> MatchVerdict {
        check(input, expected, &MatchOptions::default(), &SynonymTable::default())
    }

    #[test]
    fn exact_after_normalization() {
        let verdict = run("rome", &["Rome"]);
        assert!(verdict.matched);
        assert_eq!(verdict.reason, MatchReason::Exact);
        assert_eq!(verdict.score, 1.0);

        assert_eq!(run("  CAFÉ ", &["cafe"]).reason, MatchReason::Exact);
    }

    #[test]
    fn synonym_match() {
        let verdict = run("USA", &["United States"]);
        assert!(verdict.matched);
        assert_eq!(verdict.reason, MatchReason::Synonym);
        assert_eq!(verdict.score, 1.0);
    }

    #[test]
    fn fuzzy_single_typo() {
        let verdict = run("Pariss", &["Paris"]);
        assert!(verdict.matched);
        assert_eq!(verdict.reason, MatchReason::Fuzzy);
        assert!(verdict.score >= 0.8);
    }

    #[test]
    fn short_word_typo_needs_lower_threshold() {
        // One deletion in a four-letter word scores 0.75.
        assert!(!run("Rme", &["Rome"]).matched);

        let options = MatchOptions {
            fuzzy_threshold: 0.75,
            ..MatchOptions::default()
        };
        let verdict = check("Rme", &["Rome"], &options, &SynonymTable::default());
        assert!(verdict.matched);
        assert_eq!(verdict.reason, MatchReason::Fuzzy);
        assert_eq!(verdict.score, 0.75);
    }

    #[test]
    fn first_fuzzy_candidate_wins() {
        let verdict = run("abcdefghijkl", &["abcdefghijxy", "abcdefghijkx"]);
        assert_eq!(verdict.reason, MatchReason::Fuzzy);
        assert!((verdict.score - 10.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn input_contains_answer() {
        let verdict = run("I think the capital is Rome", &["Rome"]);
        assert!(verdict.matched);
        assert_eq!(verdict.reason, MatchReason::Contains);
        assert_eq!(verdict.score, 0.9);
    }

    #[test]
    fn answer_contains_input() {
        let verdict = run("photosynth", &["Photosynthesis"]);
        assert!(verdict.matched);
        assert_eq!(verdict.reason, MatchReason::Contained);
        assert_eq!(verdict.score, 0.85);
    }

    #[test]
    fn short_fragments_do_not_count_as_containment() {
        let verdict = run("ro", &["Rome"]);
        assert!(!verdict.matched);
        assert_eq!(verdict.reason, MatchReason::None);
        assert_eq!(verdict.score, 0.5);
    }

    #[test]
    fn keyword_overlap_for_long_answers() {
        let verdict = run(
            "energy from sunlight, plants",
            &["Plants convert sunlight into energy"],
        );
        assert!(verdict.matched);
        assert_eq!(verdict.reason, MatchReason::Keywords);
        assert!((verdict.score - 0.6 * 0.8).abs() < 1e-9);
    }

    #[test]
    fn keyword_overlap_below_minimum() {
        let verdict = run("energy storage", &["Plants convert sunlight into energy"]);
        assert!(!verdict.matched);
        assert_eq!(verdict.reason, MatchReason::None);
    }

    #[test]
    fn single_word_input_skips_keyword_tier() {
        // "photosynthesiss" is within the fuzzy threshold of a reference
        // token, but one-word answers never reach the keyword tier.
        let verdict = run("photosynthesiss", &["photosynthesis in plants"]);
        assert!(!verdict.matched);
        assert_eq!(verdict.reason, MatchReason::None);
        assert!((verdict.score - 0.625).abs() < 1e-9);
    }

    #[test]
    fn keyword_fraction_at_minimum_matches() {
        let verdict = run("photosynthesis happens", &["photosynthesis in plants"]);
        assert!(verdict.matched);
        assert_eq!(verdict.reason, MatchReason::Keywords);
        assert!((verdict.score - 0.5 * 0.8).abs() < 1e-9);

        let stricter = MatchOptions {
            min_keyword_match: 0.51,
            ..MatchOptions::default()
        };
        let verdict = check(
            "photosynthesis happens",
            &["photosynthesis in plants"],
            &stricter,
            &SynonymTable::default(),
        );
        assert!(!verdict.matched);
    }

    #[test]
    fn disabled_fuzzy_falls_through_to_containment() {
        let options = MatchOptions {
            use_fuzzy: false,
            ..MatchOptions::default()
        };
        let verdict = check("Pariss", &["Paris"], &options, &SynonymTable::default());
        assert_eq!(verdict.reason, MatchReason::Contains);
    }

    #[test]
    fn disabled_synonyms_reject_alias() {
        let options = MatchOptions {
            use_synonyms: false,
            ..MatchOptions::default()
        };
        let verdict = check("co2", &["carbon dioxide"], &options, &SynonymTable::default());
        assert!(!verdict.matched);
    }

    #[test]
    fn empty_inputs_never_match() {
        assert_eq!(run("", &["Rome"]), MatchVerdict::none(0.0));
        assert_eq!(run("rome", &[]), MatchVerdict::none(0.0));
        assert_eq!(run("rome", &["", "  "]), MatchVerdict::none(0.0));
        assert_eq!(run("!!!", &["Rome"]), MatchVerdict::none(0.0));
    }

    #[test]
    fn keywords_report_matched_and_missing() {
        let report = check_keywords(
            "Plants use sunlight and chlorophyl",
            &["sunlight", "chlorophyll", "carbon dioxide"],
            &MatchOptions::default(),
            &SynonymTable::default(),
        );
        assert_eq!(report.matched, vec!["sunlight", "chlorophyll"]);
        assert_eq!(report.missing, vec!["carbon dioxide"]);
        assert!((report.ratio - 2.0 / 3.0).abs() < 1e-9);
        assert!(report.passed);
        assert_eq!(report.verdict().reason, MatchReason::Keywords);
    }

    #[test]
    fn keywords_accept_synonym_forms() {
        let report = check_keywords(
            "they absorb CO2 and release water",
            &["carbon dioxide", "oxygen"],
            &MatchOptions::default(),
            &SynonymTable::default(),
        );
        assert_eq!(report.matched, vec!["carbon dioxide"]);
        assert_eq!(report.ratio, 0.5);
        assert!(report.passed);
    }

    #[test]
    fn keywords_empty_list_fails() {
        let report = check_keywords(
            "anything",
            &[] as &[&str],
            &MatchOptions::default(),
            &SynonymTable::default(),
        );
        assert_eq!(report.ratio, 0.0);
        assert!(!report.passed);
        assert!(!report.verdict().matched);
    }
}
