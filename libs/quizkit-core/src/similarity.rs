//! Levenshtein-based string similarity.

/// Edit distance in chars (insertions, deletions, substitutions).
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let target: Vec<char> = b.chars().collect();
    if target.is_empty() {
        return a.chars().count();
    }

    // row[j] is the distance from the source prefix to target[..j]
    let mut row: Vec<usize> = (0..=target.len()).collect();

    for (i, source_char) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;

        for (j, &target_char) in target.iter().enumerate() {
            let above = row[j + 1];
            let substitution = diagonal + usize::from(source_char != target_char);
            row[j + 1] = substitution.min(above + 1).min(row[j] + 1);
            diagonal = above;
        }
    }

    row[target.len()]
}

/// Similarity between 0.0 and 1.0: `1 - distance / max_len`, lengths in chars.
///
/// Two empty strings are identical; an empty string is dissimilar to any
/// non-empty one.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a_len = a.chars().count();
    let b_len = b.chars().count();

    match (a_len, b_len) {
        (0, 0) => 1.0,
        (0, _) | (_, 0) => 0.0,
        _ => {
            let distance = levenshtein_distance(a, b);
            1.0 - distance as f64 / a_len.max(b_len) as f64
        }
    }
}
