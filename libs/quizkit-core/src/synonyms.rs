//! Curated synonym table with bidirectional lookup.
//!
//! The table is a plain value: the matcher receives it by reference, and
//! item-supplied synonyms are merged with [`SynonymTable::augment`], which
//! returns a new table instead of touching shared state.

use crate::normalize::normalize;
use std::collections::BTreeMap;

/// Canonical term → interchangeable forms. Entries are stored normalized.
const CURATED: &[(&str, &[&str])] = &[
    ("united states", &["usa", "us", "united states of america", "america"]),
    ("united kingdom", &["uk", "great britain", "britain"]),
    ("soviet union", &["ussr", "union of soviet socialist republics"]),
    ("european union", &["eu"]),
    ("world war i", &["wwi", "ww1", "world war 1", "first world war", "great war"]),
    ("world war ii", &["wwii", "ww2", "world war 2", "second world war"]),
    ("carbon dioxide", &["co2"]),
    ("water", &["h2o"]),
    ("sodium chloride", &["nacl", "table salt", "salt"]),
    ("deoxyribonucleic acid", &["dna"]),
    ("ribonucleic acid", &["rna"]),
    ("adenosine triphosphate", &["atp"]),
    ("car", &["automobile", "auto", "motorcar"]),
    ("big", &["large", "huge"]),
    ("small", &["little", "tiny"]),
    ("fast", &["quick", "rapid"]),
    ("begin", &["start", "commence"]),
    ("end", &["finish", "conclude"]),
    ("one", &["1"]),
    ("two", &["2"]),
    ("three", &["3"]),
    ("four", &["4"]),
    ("five", &["5"]),
    ("six", &["6"]),
    ("seven", &["7"]),
    ("eight", &["8"]),
    ("nine", &["9"]),
    ("ten", &["10"]),
    ("hundred", &["100"]),
    ("thousand", &["1000"]),
];

/// A closed set of interchangeable forms per canonical term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl Default for SynonymTable {
    /// The curated table.
    fn default() -> Self {
        Self::empty().augment(CURATED.iter().map(|(key, values)| {
            (
                key.to_string(),
                values.iter().map(|v| v.to_string()).collect::<Vec<_>>(),
            )
        }))
    }
}

impl SynonymTable {
    /// A table without any entries.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge additional entries, returning the updated table.
    ///
    /// Keys and forms are normalized; duplicates and empty forms are dropped.
    pub fn augment<I, V, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        V: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (key, values) in entries {
            let key = normalize(key.as_ref());
            if key.is_empty() {
                continue;
            }
            let forms = self.entries.entry(key.clone()).or_default();
            for value in values {
                let value = normalize(value.as_ref());
                if !value.is_empty() && value != key && !forms.contains(&value) {
                    forms.push(value);
                }
            }
        }
        self
    }

    /// All forms interchangeable with `term`, normalized input first.
    ///
    /// Lookup works in both directions: a canonical key yields its forms,
    /// and a form yields its key plus every sibling form.
    pub fn expand(&self, term: &str) -> Vec<String> {
        let normalized = normalize(term);
        let mut forms = vec![normalized.clone()];
        if normalized.is_empty() {
            return forms;
        }

        if let Some(values) = self.entries.get(&normalized) {
            extend_unique(&mut forms, values);
        }

        for (key, values) in &self.entries {
            if values.contains(&normalized) {
                push_unique(&mut forms, key);
                extend_unique(&mut forms, values);
            }
        }

        forms
    }
}

fn push_unique(forms: &mut Vec<String>, form: &str) {
    if !forms.iter().any(|f| f == form) {
        forms.push(form.to_string());
    }
}

fn extend_unique(forms: &mut Vec<String>, values: &[String]) {
    for value in values {
        push_unique(forms, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn key_expands_to_forms() {
        let table = SynonymTable::default();
        let forms = table.expand("Carbon Dioxide");
        assert_eq!(forms, vec!["carbon dioxide", "co2"]);
    }

    #[test]
    fn form_expands_to_key_and_siblings() {
        let table = SynonymTable::default();
        let forms = table.expand("UK");
        assert_eq!(forms, vec!["uk", "united kingdom", "great britain", "britain"]);
    }

    #[test]
    fn unknown_term_yields_itself() {
        let table = SynonymTable::default();
        assert_eq!(table.expand("Photosynthesis!"), vec!["photosynthesis"]);
    }

    #[test]
    fn augment_merges_and_deduplicates() {
        let table = SynonymTable::empty()
            .augment([("Mitochondria", vec!["powerhouse of the cell", "mitochondrion"])])
            .augment([("mitochondria", vec!["Mitochondrion", "mitochondrion"])]);
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.expand("mitochondrion"),
            vec!["mitochondrion", "mitochondria", "powerhouse of the cell"]
        );
    }

    #[test]
    fn augment_leaves_original_untouched() {
        let base = SynonymTable::empty();
        let extended = base.clone().augment([("film", vec!["movie"])]);
        assert!(base.is_empty());
        assert_eq!(extended.expand("movie"), vec!["movie", "film"]);
    }

    #[test]
    fn curated_table_is_loaded() {
        let table = SynonymTable::default();
        assert_eq!(table.len(), CURATED.len());
        assert!(table.expand("3").contains(&"three".to_string()));
    }
}
