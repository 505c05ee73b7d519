//! Text normalization for answer comparison.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize a string for comparison.
///
/// Lower-cases, decomposes and strips diacritics, turns punctuation and
/// symbols into spaces, then collapses and trims whitespace. `"Café!"` and
/// `"cafe"` normalize to the same string. Idempotent.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
