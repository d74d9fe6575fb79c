//! Record storage
//!
//! Provides:
//! - The [`RecordStore`] trait the service layer talks to
//! - A SQLite implementation partitioned by user id
//! - Item size enforcement shared by every implementation

pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{LearningError, Result};
use crate::types::{Correction, NewCorrection, NewPhrase, Phrase, SortOrder};

pub use sqlite::SqliteRecordStore;

/// Largest serialized record the store accepts (400 KB)
pub const MAX_ITEM_SIZE_BYTES: usize = 400 * 1024;

/// Storage backend for phrase and correction records.
///
/// Every query is scoped to one user's partition.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All phrases of a user, newest first
    async fn fetch_phrases(&self, user_id: &str) -> Result<Vec<Phrase>>;

    /// Up to `max_count` phrases ordered by review time, oldest first.
    /// Phrases that were never reviewed sort before all reviewed ones.
    async fn fetch_phrases_by_review(&self, user_id: &str, max_count: usize) -> Result<Vec<Phrase>>;

    /// Up to `limit` phrases ordered by creation time, optionally only those
    /// created at or after `since`
    async fn list_phrases(
        &self,
        user_id: &str,
        order: SortOrder,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Phrase>>;

    /// Store a new phrase with a generated id and the current time
    async fn create_phrase(&self, user_id: &str, input: &NewPhrase) -> Result<Phrase>;

    /// Add one to a phrase's query count and stamp `last_queried_at`
    async fn record_phrase_query(&self, user_id: &str, phrase_id: &str, at: DateTime<Utc>) -> Result<()>;

    /// All corrections of a user, newest first
    async fn fetch_corrections(&self, user_id: &str) -> Result<Vec<Correction>>;

    /// Up to `limit` corrections ordered by creation time
    async fn list_corrections(&self, user_id: &str, order: SortOrder, limit: usize) -> Result<Vec<Correction>>;

    /// Store a new correction with a generated id and the current time
    async fn create_correction(&self, user_id: &str, input: &NewCorrection) -> Result<Correction>;
}

/// Reject a record whose JSON form exceeds [`MAX_ITEM_SIZE_BYTES`]
pub fn ensure_item_size<T: Serialize>(record: &T) -> Result<()> {
    let size = serde_json::to_vec(record)?.len();
    if size > MAX_ITEM_SIZE_BYTES {
        return Err(LearningError::DataIntegrity {
            size,
            limit: MAX_ITEM_SIZE_BYTES,
        });
    }
    Ok(())
}
