//! Keyword matching for phrase search

use crate::types::Phrase;

/// Case-insensitive substring match against english, japanese and context
pub fn matches_keyword(phrase: &Phrase, keyword_lower: &str) -> bool {
    [phrase.english.as_str(), phrase.japanese.as_str(), phrase.context_text()]
        .iter()
        .any(|field| field.to_lowercase().contains(keyword_lower))
}

/// Indices of the first `limit` phrases matching `keyword`, in input order.
///
/// Stops as soon as `limit` matches are found, so later phrases are never
/// examined. The result depends on the order of `phrases`.
pub fn select_matches(phrases: &[Phrase], keyword: &str, limit: usize) -> Vec<usize> {
    let keyword_lower = keyword.to_lowercase();
    let mut matched = Vec::new();

    for (idx, phrase) in phrases.iter().enumerate() {
        if matched.len() >= limit {
            break;
        }
        if matches_keyword(phrase, &keyword_lower) {
            matched.push(idx);
        }
    }

    matched
}
