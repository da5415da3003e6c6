//! Question text normalization and fuzzy matching.

use std::collections::HashSet;

/// Cache key form: lowercased, whitespace collapsed to single spaces,
/// trimmed.
pub fn normalize_question(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Word-set Jaccard similarity: `overlap / max(|A|, |B|)`.
///
/// Tokenization is case-insensitive on whitespace. If either side has no
/// words the similarity is undefined and reported as 0.0 (no match).
pub fn jaccard(a: &str, b: &str) -> f64 {
    let words_a: HashSet<String> = a.to_lowercase().split_whitespace().map(String::from).collect();
    let words_b: HashSet<String> = b.to_lowercase().split_whitespace().map(String::from).collect();

    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let overlap = words_a.intersection(&words_b).count();
    overlap as f64 / words_a.len().max(words_b.len()) as f64
}
