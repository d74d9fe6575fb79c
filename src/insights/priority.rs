//! Review priority ranking
//!
//! Never-reviewed phrases always come before reviewed ones. Inside the
//! never-reviewed group, phrases the learner keeps searching for come first.
//! Reviewed phrases keep the order the store returned them in, which is
//! oldest review first.

use crate::types::Phrase;

/// Number of phrases returned by [`hard_to_remember`]
pub const HARD_TO_REMEMBER_LIMIT: usize = 10;

/// Select and order up to `limit` phrases most in need of review.
///
/// The input is expected in store order (review time ascending). The
/// reviewed partition is not re-sorted. Both partitions rely on the stability
/// of `sort_by` so equal keys keep their input order.
pub fn rank_for_review(phrases: Vec<Phrase>, limit: usize) -> Vec<Phrase> {
    let (mut never_reviewed, reviewed): (Vec<Phrase>, Vec<Phrase>) =
        phrases.into_iter().partition(|p| !p.is_reviewed());

    never_reviewed.sort_by(|a, b| b.query_count.cmp(&a.query_count));

    never_reviewed
        .into_iter()
        .chain(reviewed)
        .take(limit)
        .collect()
}

/// Phrases looked up more than once, most queried first.
///
/// Equal counts keep their input order. At most [`HARD_TO_REMEMBER_LIMIT`]
/// phrases are returned.
pub fn hard_to_remember(phrases: &[Phrase]) -> Vec<Phrase> {
    let mut repeated: Vec<Phrase> = phrases.iter().filter(|p| p.query_count > 1).cloned().collect();
    repeated.sort_by(|a, b| b.query_count.cmp(&a.query_count));
    repeated.truncate(HARD_TO_REMEMBER_LIMIT);
    repeated
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn phrase(id: &str, query_count: u32, reviewed_days_ago: Option<i64>) -> Phrase {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        Phrase {
            user_id: "u1".to_string(),
            phrase_id: id.to_string(),
            english: format!("phrase {}", id),
            japanese: "フレーズ".to_string(),
            context: None,
            created_at: base - Duration::days(30),
            query_count,
            last_queried_at: None,
            reviewed_at: reviewed_days_ago.map(|d| base - Duration::days(d)),
        }
    }

    fn ids(phrases: &[Phrase]) -> Vec<&str> {
        phrases.iter().map(|p| p.phrase_id.as_str()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(rank_for_review(vec![], 10).is_empty());
    }

    #[test]
    fn test_never_reviewed_first_by_query_count() {
        let input = vec![
            phrase("r-old", 9, Some(20)),
            phrase("n-low", 1, None),
            phrase("r-new", 50, Some(2)),
            phrase("n-high", 7, None),
        ];

        let ranked = rank_for_review(input, 10);
        assert_eq!(ids(&ranked), vec!["n-high", "n-low", "r-old", "r-new"]);
    }

    #[test]
    fn test_reviewed_keep_input_order() {
        // Not sorted by reviewed_at: the ranker trusts the fetch order
        let input = vec![
            phrase("b", 0, Some(1)),
            phrase("a", 0, Some(40)),
            phrase("c", 0, Some(10)),
        ];

        let ranked = rank_for_review(input, 10);
        assert_eq!(ids(&ranked), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_ties_are_stable() {
        let input = vec![
            phrase("first", 3, None),
            phrase("top", 5, None),
            phrase("second", 3, None),
            phrase("third", 3, None),
        ];

        let ranked = rank_for_review(input, 10);
        assert_eq!(ids(&ranked), vec!["top", "first", "second", "third"]);
    }

    #[test]
    fn test_truncates_to_limit() {
        let input = vec![
            phrase("r1", 0, Some(5)),
            phrase("n1", 2, None),
            phrase("n2", 4, None),
        ];

        let ranked = rank_for_review(input, 2);
        assert_eq!(ids(&ranked), vec!["n2", "n1"]);
    }

    #[test]
    fn test_ordering_properties() {
        let mut input = Vec::new();
        for i in 0..40u32 {
            let reviewed = if i % 3 == 0 { Some(i as i64) } else { None };
            input.push(phrase(&format!("p{}", i), (i * 7) % 11, reviewed));
        }

        for limit in [1, 5, 13, 40, 100] {
            let ranked = rank_for_review(input.clone(), limit);
            assert!(ranked.len() <= limit);

            let first_reviewed = ranked.iter().position(|p| p.is_reviewed()).unwrap_or(ranked.len());
            assert!(ranked[first_reviewed..].iter().all(|p| p.is_reviewed()));

            let prefix = &ranked[..first_reviewed];
            assert!(prefix.windows(2).all(|w| w[0].query_count >= w[1].query_count));
        }
    }

    #[test]
    fn test_hard_to_remember_needs_repeat_queries() {
        let input = vec![
            phrase("once", 1, None),
            phrase("twice", 2, Some(3)),
            phrase("never", 0, None),
            phrase("often", 8, Some(1)),
            phrase("also-twice", 2, None),
        ];

        let hard = hard_to_remember(&input);
        assert_eq!(ids(&hard), vec!["often", "twice", "also-twice"]);
    }

    #[test]
    fn test_hard_to_remember_caps_results() {
        let input: Vec<Phrase> = (0..15).map(|i| phrase(&format!("p{}", i), 2 + i, None)).collect();

        let hard = hard_to_remember(&input);
        assert_eq!(hard.len(), HARD_TO_REMEMBER_LIMIT);
        assert_eq!(hard[0].phrase_id, "p14");
        assert!(hard_to_remember(&[]).is_empty());
    }
}
