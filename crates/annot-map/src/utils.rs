//! Utility functions for column matching.

use rapidfuzz::distance::jaro_winkler::similarity as jaro_similarity;

/// Minimum similarity for a column to be offered as a hint.
pub const HINT_THRESHOLD: f64 = 0.8;

/// Normalizes text for comparison by lowercasing and replacing separators with spaces.
pub fn normalize_text(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-', '.', '/', '\\'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Closest candidate to `name`, or `None` if nothing reaches [`HINT_THRESHOLD`].
///
/// Ties keep the earlier candidate.
pub fn closest_column<'a, I>(name: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let target = normalize_text(name);
    let mut best: Option<(&str, f64)> = None;
    for candidate in candidates {
        let score = jaro_similarity(target.chars(), normalize_text(candidate).chars());
        if score < HINT_THRESHOLD {
            continue;
        }
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }
    best.map(|(column, _)| column)
}
