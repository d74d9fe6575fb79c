//! Weakness analysis over correction records

use serde::{Deserialize, Serialize};

use crate::types::{Correction, Phrase};

/// Number of corrections returned in [`WeaknessReport::recent_corrections`]
pub const RECENT_CORRECTIONS: usize = 5;

/// Number of entries returned by [`repeated_mistakes`]
pub const REPEATED_MISTAKES_LIMIT: usize = 10;

/// How often one error pattern occurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCount {
    pub pattern: String,
    pub count: usize,
}

/// The same original sentence corrected more than once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatedMistake {
    /// Text of the newest occurrence
    pub original_text: String,
    pub corrected_text: String,
    pub feedback: String,
    pub count: usize,
}

/// Result of [`analyze`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaknessReport {
    /// Every correction in the input, with or without a pattern
    pub total_corrections: usize,
    /// Most frequent patterns first
    pub common_patterns: Vec<PatternCount>,
    /// Newest corrections first
    pub recent_corrections: Vec<Correction>,
    #[serde(default)]
    pub repeated_mistakes: Vec<RepeatedMistake>,
    /// Filled in by the caller from the user's phrases
    #[serde(default)]
    pub hard_to_remember: Vec<Phrase>,
}

/// Count error patterns and collect the most recent corrections.
///
/// Patterns are trimmed before counting; blank patterns are skipped. Equal
/// counts keep the order in which the pattern was first seen.
pub fn analyze(corrections: &[Correction], limit: usize) -> WeaknessReport {
    // Vec instead of a map so first-occurrence order survives the sort
    let mut counts: Vec<PatternCount> = Vec::new();
    for correction in corrections {
        let pattern = correction.error_pattern.trim();
        if pattern.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|pc| pc.pattern == pattern) {
            Some(pc) => pc.count += 1,
            None => counts.push(PatternCount {
                pattern: pattern.to_string(),
                count: 1,
            }),
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);

    let mut recent = corrections.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(RECENT_CORRECTIONS);

    WeaknessReport {
        total_corrections: corrections.len(),
        common_patterns: counts,
        recent_corrections: recent,
        repeated_mistakes: repeated_mistakes(corrections),
        hard_to_remember: Vec::new(),
    }
}

/// Group corrections by original text, ignoring case and surrounding
/// whitespace, and keep the groups seen more than once.
///
/// Each group reports its newest correction. Most frequent first; equal
/// counts keep first-seen order. At most [`REPEATED_MISTAKES_LIMIT`] groups.
pub fn repeated_mistakes(corrections: &[Correction]) -> Vec<RepeatedMistake> {
    let mut groups: Vec<(String, &Correction, usize)> = Vec::new();
    for correction in corrections {
        let key = correction.original_text.trim().to_lowercase();
        match groups.iter_mut().find(|(k, _, _)| *k == key) {
            Some((_, newest, count)) => {
                *count += 1;
                if correction.created_at > newest.created_at {
                    *newest = correction;
                }
            }
            None => groups.push((key, correction, 1)),
        }
    }

    groups.retain(|(_, _, count)| *count > 1);
    groups.sort_by(|a, b| b.2.cmp(&a.2));

    groups
        .into_iter()
        .take(REPEATED_MISTAKES_LIMIT)
        .map(|(_, newest, count)| RepeatedMistake {
            original_text: newest.original_text.clone(),
            corrected_text: newest.corrected_text.clone(),
            feedback: newest.feedback.clone(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn correction(id: &str, pattern: &str, minutes: i64) -> Correction {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        Correction {
            user_id: "u1".to_string(),
            correction_id: id.to_string(),
            original_text: format!("original {}", id),
            corrected_text: format!("corrected {}", id),
            feedback: "feedback".to_string(),
            error_pattern: pattern.to_string(),
            created_at: base + Duration::minutes(minutes),
            reviewed_at: None,
        }
    }

    #[test]
    fn test_no_corrections() {
        let report = analyze(&[], 10);
        assert_eq!(report.total_corrections, 0);
        assert!(report.common_patterns.is_empty());
        assert!(report.recent_corrections.is_empty());
        assert!(report.repeated_mistakes.is_empty());
    }

    #[test]
    fn test_counts_error_patterns() {
        let input = vec![
            correction("1", "grammar", 0),
            correction("2", "grammar", 1),
            correction("3", "spelling", 2),
        ];

        let report = analyze(&input, 10);
        assert_eq!(report.total_corrections, 3);
        assert_eq!(
            report.common_patterns,
            vec![
                PatternCount { pattern: "grammar".to_string(), count: 2 },
                PatternCount { pattern: "spelling".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_blank_patterns_skipped_but_counted_in_total() {
        let input = vec![
            correction("1", "", 0),
            correction("2", "   ", 1),
            correction("3", " grammar ", 2),
            correction("4", "grammar", 3),
        ];

        let report = analyze(&input, 10);
        assert_eq!(report.total_corrections, 4);
        assert_eq!(report.common_patterns.len(), 1);
        assert_eq!(report.common_patterns[0].pattern, "grammar");
        assert_eq!(report.common_patterns[0].count, 2);
        assert_eq!(report.recent_corrections.len(), 4);
    }

    #[test]
    fn test_ties_keep_first_occurrence_order() {
        let input = vec![
            correction("1", "articles", 0),
            correction("2", "tense", 1),
            correction("3", "prepositions", 2),
            correction("4", "tense", 3),
            correction("5", "articles", 4),
        ];

        let report = analyze(&input, 10);
        let patterns: Vec<&str> = report.common_patterns.iter().map(|p| p.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["articles", "tense", "prepositions"]);
    }

    #[test]
    fn test_limit_truncates_patterns_only() {
        let input: Vec<Correction> = (0..8)
            .map(|i| correction(&i.to_string(), &format!("pattern-{}", i % 4), i))
            .collect();

        let report = analyze(&input, 2);
        assert_eq!(report.common_patterns.len(), 2);
        assert_eq!(report.total_corrections, 8);
        assert_eq!(report.recent_corrections.len(), RECENT_CORRECTIONS);
    }

    #[test]
    fn test_recent_corrections_newest_first() {
        let input = vec![
            correction("old", "a", 0),
            correction("newest", "b", 90),
            correction("mid", "", 45),
        ];

        let report = analyze(&input, 1);
        let ids: Vec<&str> = report.recent_corrections.iter().map(|c| c.correction_id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "mid", "old"]);
    }

    #[test]
    fn test_report_properties() {
        let patterns = ["grammar", "", "spelling", "grammar", " ", "tense", "grammar", "spelling"];
        let input: Vec<Correction> = patterns
            .iter()
            .enumerate()
            .map(|(i, p)| correction(&i.to_string(), p, (i as i64 * 37) % 11))
            .collect();

        let report = analyze(&input, 10);
        assert_eq!(report.total_corrections, input.len());
        assert!(report.common_patterns.windows(2).all(|w| w[0].count >= w[1].count));
        let sum: usize = report.common_patterns.iter().map(|p| p.count).sum();
        assert!(sum <= report.total_corrections);
        assert!(report.common_patterns.iter().all(|p| !p.pattern.trim().is_empty()));
        assert_eq!(report.recent_corrections.len(), RECENT_CORRECTIONS.min(input.len()));
        assert!(report
            .recent_corrections
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at));
    }

    fn with_original(id: &str, original: &str, minutes: i64) -> Correction {
        let mut c = correction(id, "", minutes);
        c.original_text = original.to_string();
        c
    }

    #[test]
    fn test_repeated_mistakes_group_case_and_whitespace() {
        let input = vec![
            with_original("1", "I goed home", 0),
            with_original("2", "She don't know", 1),
            with_original("3", "  i GOED home ", 5),
            with_original("4", "Once only", 2),
            with_original("5", "i goed home", 3),
            with_original("6", "she don't know", 4),
        ];

        let repeated = repeated_mistakes(&input);
        assert_eq!(repeated.len(), 2);
        assert_eq!(repeated[0].count, 3);
        // Newest occurrence of the group
        assert_eq!(repeated[0].original_text, "  i GOED home ");
        assert_eq!(repeated[0].corrected_text, "corrected 3");
        assert_eq!(repeated[1].count, 2);
        assert_eq!(repeated[1].original_text, "she don't know");
    }

    #[test]
    fn test_repeated_mistakes_capped_and_in_report() {
        let input: Vec<Correction> = (0..24)
            .map(|i| with_original(&i.to_string(), &format!("sentence {}", i % 12), i))
            .collect();

        assert_eq!(repeated_mistakes(&input).len(), REPEATED_MISTAKES_LIMIT);
        assert!(repeated_mistakes(&input[..12]).is_empty());

        let report = analyze(&input, 10);
        assert_eq!(report.repeated_mistakes.len(), REPEATED_MISTAKES_LIMIT);
        assert!(report.repeated_mistakes.iter().all(|m| m.count == 2));
        assert!(report.hard_to_remember.is_empty());
    }
}
