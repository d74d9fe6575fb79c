//! Learning log service
//!
//! Validates caller input, talks to the record store and runs the ranking and
//! analysis logic over what the store returns. Holds no global state: the
//! store is handed in, so tests can plug in any [`RecordStore`].

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::insights::{self, WeaknessReport};
use crate::store::RecordStore;
use crate::types::{Correction, NewCorrection, NewPhrase, Phrase};
use crate::validation;

/// Default limits used when a caller does not supply one
pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;
pub const DEFAULT_REVIEW_LIMIT: i64 = 20;
pub const DEFAULT_PATTERN_LIMIT: i64 = 10;

/// Entry point for every learning-log operation
#[derive(Clone)]
pub struct LearningLog {
    store: Arc<dyn RecordStore>,
}

impl LearningLog {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// The underlying record store
    pub fn store(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }

    /// Validate, trim and store a phrase
    pub async fn save_phrase(&self, user_id: &str, input: &NewPhrase) -> Result<Phrase> {
        validation::validate_phrase_input(input)?;
        self.store.create_phrase(user_id, &input.trimmed()).await
    }

    /// Phrases by creation time within `period` (`today`, `this_week` or
    /// `all`). Unknown orders fall back to newest first, unknown periods to
    /// `all`.
    pub async fn list_phrases(&self, user_id: &str, limit: i64, order: &str, period: &str) -> Result<Vec<Phrase>> {
        let limit = validation::validate_limit(limit)?;
        let order = validation::validate_order(order);
        let period = validation::validate_period(period);
        debug!("Listing {} phrases for {} ({})", order, user_id, period);
        self.store.list_phrases(user_id, order, limit, period.since(Utc::now())).await
    }

    /// Keyword search that records a query against every returned phrase.
    ///
    /// Recording is best-effort: a failed update is logged and the phrase is
    /// still returned, just without the new count.
    pub async fn search_phrases(&self, user_id: &str, keyword: &str, limit: i64) -> Result<Vec<Phrase>> {
        validation::validate_search_keyword(keyword)?;
        let limit = validation::validate_limit(limit)?;

        let phrases = self.store.fetch_phrases(user_id).await?;
        let matched = insights::select_matches(&phrases, keyword, limit);
        debug!("Keyword '{}' matched {} of {} phrases", keyword, matched.len(), phrases.len());

        let mut results = Vec::with_capacity(matched.len());
        for idx in matched {
            let mut phrase = phrases[idx].clone();
            let now = Utc::now();
            match self.store.record_phrase_query(user_id, &phrase.phrase_id, now).await {
                Ok(()) => {
                    phrase.query_count += 1;
                    phrase.last_queried_at = Some(now);
                }
                Err(e) => {
                    warn!("Failed to record query for phrase {}: {}", phrase.phrase_id, e);
                }
            }
            results.push(phrase);
        }

        Ok(results)
    }

    /// Phrases most in need of review
    pub async fn review_priority(&self, user_id: &str, limit: i64) -> Result<Vec<Phrase>> {
        let limit = validation::validate_limit(limit)?;
        // Over-fetch so the ranker has room to promote never-reviewed phrases
        let candidates = self.store.fetch_phrases_by_review(user_id, limit * 2).await?;
        Ok(insights::rank_for_review(candidates, limit))
    }

    /// Validate, trim and store a correction
    pub async fn save_correction(&self, user_id: &str, input: &NewCorrection) -> Result<Correction> {
        validation::validate_correction_input(input)?;
        let correction = self.store.create_correction(user_id, &input.trimmed()).await?;
        if !correction.error_pattern.is_empty() {
            info!("Correction {} tagged '{}'", correction.correction_id, correction.error_pattern);
        }
        Ok(correction)
    }

    pub async fn list_corrections(&self, user_id: &str, limit: i64, order: &str) -> Result<Vec<Correction>> {
        let limit = validation::validate_limit(limit)?;
        let order = validation::validate_order(order);
        self.store.list_corrections(user_id, order, limit).await
    }

    /// Error-pattern frequencies and repeated mistakes over all of a user's
    /// corrections, plus the phrases they keep looking up
    pub async fn analyze_weaknesses(&self, user_id: &str, limit: i64) -> Result<WeaknessReport> {
        let limit = validation::validate_limit(limit)?;
        let corrections = self.store.fetch_corrections(user_id).await?;
        let phrases = self.store.fetch_phrases(user_id).await?;

        let mut report = insights::analyze(&corrections, limit);
        report.hard_to_remember = insights::hard_to_remember(&phrases);
        Ok(report)
    }
}
