//! SQLite-backed record store

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, types::Type, Connection, Row};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{ensure_item_size, RecordStore};
use crate::error::{LearningError, Result};
use crate::types::{Correction, NewCorrection, NewPhrase, Phrase, SortOrder};

const PHRASE_COLUMNS: &str = "user_id, phrase_id, english, japanese, context, created_at, \
                              query_count, last_queried_at, reviewed_at";

const CORRECTION_COLUMNS: &str = "user_id, correction_id, original_text, corrected_text, feedback, \
                                  error_pattern, created_at, reviewed_at";

/// SQLite record store
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// Open (or create) a store at the given path
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::init_schema(&conn)?;

        info!("Opened record store at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Non-persistent store for tests
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS phrases (
                user_id TEXT NOT NULL,
                phrase_id TEXT NOT NULL,
                english TEXT NOT NULL,
                japanese TEXT NOT NULL,
                context TEXT,
                created_at TEXT NOT NULL,
                query_count INTEGER NOT NULL DEFAULT 0,
                last_queried_at TEXT,
                reviewed_at TEXT,
                PRIMARY KEY (user_id, phrase_id)
            );

            CREATE TABLE IF NOT EXISTS corrections (
                user_id TEXT NOT NULL,
                correction_id TEXT NOT NULL,
                original_text TEXT NOT NULL,
                corrected_text TEXT NOT NULL,
                feedback TEXT NOT NULL,
                error_pattern TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                reviewed_at TEXT,
                PRIMARY KEY (user_id, correction_id)
            );

            CREATE INDEX IF NOT EXISTS idx_phrases_user_created ON phrases(user_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_phrases_user_reviewed ON phrases(user_id, reviewed_at);
            CREATE INDEX IF NOT EXISTS idx_corrections_user_created ON corrections(user_id, created_at);
        "#,
        )?;

        Ok(())
    }

    /// Fixed-width RFC 3339 so text order equals time order
    fn format_ts(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Unparseable timestamps fail the row rather than being replaced
    fn parse_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
        let text: String = row.get(idx)?;
        Self::parse_text_ts(idx, &text)
    }

    fn parse_opt_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
        let text: Option<String> = row.get(idx)?;
        text.map(|t| Self::parse_text_ts(idx, &t)).transpose()
    }

    fn parse_text_ts(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(text)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    fn phrase_from_row(row: &Row<'_>) -> rusqlite::Result<Phrase> {
        let context: Option<String> = row.get(4)?;

        Ok(Phrase {
            user_id: row.get(0)?,
            phrase_id: row.get(1)?,
            english: row.get(2)?,
            japanese: row.get(3)?,
            context: context.filter(|c| !c.is_empty()),
            created_at: Self::parse_ts(row, 5)?,
            query_count: row.get(6)?,
            last_queried_at: Self::parse_opt_ts(row, 7)?,
            reviewed_at: Self::parse_opt_ts(row, 8)?,
        })
    }

    fn correction_from_row(row: &Row<'_>) -> rusqlite::Result<Correction> {
        Ok(Correction {
            user_id: row.get(0)?,
            correction_id: row.get(1)?,
            original_text: row.get(2)?,
            corrected_text: row.get(3)?,
            feedback: row.get(4)?,
            error_pattern: row.get(5)?,
            created_at: Self::parse_ts(row, 6)?,
            reviewed_at: Self::parse_opt_ts(row, 7)?,
        })
    }

    fn select_phrases<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Phrase>> {
        let mut stmt = conn.prepare_cached(sql)?;
        let phrases = stmt
            .query_map(params, Self::phrase_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(phrases)
    }

    fn select_corrections<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Correction>> {
        let mut stmt = conn.prepare_cached(sql)?;
        let corrections = stmt
            .query_map(params, Self::correction_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(corrections)
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn fetch_phrases(&self, user_id: &str) -> Result<Vec<Phrase>> {
        let sql = format!(
            "SELECT {} FROM phrases WHERE user_id = ?1 ORDER BY created_at DESC, phrase_id",
            PHRASE_COLUMNS
        );
        let conn = self.conn.lock().await;
        let phrases = Self::select_phrases(&conn, &sql, params![user_id])?;
        debug!("Fetched {} phrases for {}", phrases.len(), user_id);
        Ok(phrases)
    }

    async fn fetch_phrases_by_review(&self, user_id: &str, max_count: usize) -> Result<Vec<Phrase>> {
        let sql = format!(
            "SELECT {} FROM phrases WHERE user_id = ?1
             ORDER BY reviewed_at IS NOT NULL, reviewed_at ASC, created_at ASC
             LIMIT ?2",
            PHRASE_COLUMNS
        );
        let conn = self.conn.lock().await;
        Self::select_phrases(&conn, &sql, params![user_id, max_count])
    }

    async fn list_phrases(
        &self,
        user_id: &str,
        order: SortOrder,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Phrase>> {
        let sql = format!(
            "SELECT {} FROM phrases WHERE user_id = ?1 AND (?3 IS NULL OR created_at >= ?3)
             ORDER BY created_at {} LIMIT ?2",
            PHRASE_COLUMNS,
            order.as_sql()
        );
        let since = since.as_ref().map(Self::format_ts);
        let conn = self.conn.lock().await;
        Self::select_phrases(&conn, &sql, params![user_id, limit, since])
    }

    async fn create_phrase(&self, user_id: &str, input: &NewPhrase) -> Result<Phrase> {
        let now = Utc::now();
        let phrase = Phrase {
            user_id: user_id.to_string(),
            phrase_id: uuid::Uuid::new_v4().to_string(),
            english: input.english.clone(),
            japanese: input.japanese.clone(),
            context: Some(input.context.clone()).filter(|c| !c.is_empty()),
            created_at: now,
            query_count: 0,
            last_queried_at: None,
            reviewed_at: Some(now),
        };
        ensure_item_size(&phrase)?;

        let conn = self.conn.lock().await;
        conn.execute(
            &format!(
                "INSERT INTO phrases ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                PHRASE_COLUMNS
            ),
            params![
                phrase.user_id,
                phrase.phrase_id,
                phrase.english,
                phrase.japanese,
                phrase.context,
                Self::format_ts(&phrase.created_at),
                phrase.query_count,
                phrase.last_queried_at.as_ref().map(Self::format_ts),
                phrase.reviewed_at.as_ref().map(Self::format_ts),
            ],
        )?;

        info!("Saved phrase {} for {}", phrase.phrase_id, user_id);
        Ok(phrase)
    }

    async fn record_phrase_query(&self, user_id: &str, phrase_id: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().await;
        let updated = conn.execute(
            "UPDATE phrases SET query_count = query_count + 1, last_queried_at = ?3
             WHERE user_id = ?1 AND phrase_id = ?2",
            params![user_id, phrase_id, Self::format_ts(&at)],
        )?;

        if updated == 0 {
            return Err(LearningError::NotFound(format!("phrase {}", phrase_id)));
        }
        Ok(())
    }

    async fn fetch_corrections(&self, user_id: &str) -> Result<Vec<Correction>> {
        let sql = format!(
            "SELECT {} FROM corrections WHERE user_id = ?1 ORDER BY created_at DESC, correction_id",
            CORRECTION_COLUMNS
        );
        let conn = self.conn.lock().await;
        Self::select_corrections(&conn, &sql, params![user_id])
    }

    async fn list_corrections(&self, user_id: &str, order: SortOrder, limit: usize) -> Result<Vec<Correction>> {
        let sql = format!(
            "SELECT {} FROM corrections WHERE user_id = ?1 ORDER BY created_at {} LIMIT ?2",
            CORRECTION_COLUMNS,
            order.as_sql()
        );
        let conn = self.conn.lock().await;
        Self::select_corrections(&conn, &sql, params![user_id, limit])
    }

    async fn create_correction(&self, user_id: &str, input: &NewCorrection) -> Result<Correction> {
        let now = Utc::now();
        let correction = Correction {
            user_id: user_id.to_string(),
            correction_id: uuid::Uuid::new_v4().to_string(),
            original_text: input.original_text.clone(),
            corrected_text: input.corrected_text.clone(),
            feedback: input.feedback.clone(),
            error_pattern: input.error_pattern.clone(),
            created_at: now,
            reviewed_at: Some(now),
        };
        ensure_item_size(&correction)?;

        let conn = self.conn.lock().await;
        conn.execute(
            &format!(
                "INSERT INTO corrections ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                CORRECTION_COLUMNS
            ),
            params![
                correction.user_id,
                correction.correction_id,
                correction.original_text,
                correction.corrected_text,
                correction.feedback,
                correction.error_pattern,
                Self::format_ts(&correction.created_at),
                correction.reviewed_at.as_ref().map(Self::format_ts),
            ],
        )?;

        info!("Saved correction {} for {}", correction.correction_id, user_id);
        Ok(correction)
    }
}
