//! Learning Log - English phrase and correction tracker
//!
//! Stores phrases and writing corrections per user and answers:
//! - which phrases should be reviewed next
//! - which error patterns keep coming back
//! - which saved phrases match a keyword
//!
//! Requests arrive as JSON tool calls over HTTP or from the CLI. A daily
//! summary can be pushed to LINE on a schedule.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use learning_log::{LearningLog, NewPhrase, SqliteRecordStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = SqliteRecordStore::new("learning.db").await?;
//!     let log = LearningLog::new(Arc::new(store));
//!     let phrase = NewPhrase {
//!         english: "break the ice".into(),
//!         japanese: "打ち解ける".into(),
//!         context: String::new(),
//!     };
//!     log.save_phrase("default_user", &phrase).await?;
//!     Ok(())
//! }
//! ```

// Core modules
pub mod types;
pub mod error;
pub mod validation;
pub mod insights;
pub mod store;
pub mod service;

// Feature modules
pub mod summary;
pub mod notify;
pub mod dispatch;
pub mod scheduler;
pub mod server;
pub mod config;
pub mod cli;

// Re-export commonly used types for convenience
pub use error::{LearningError, Result};
pub use insights::{PatternCount, RepeatedMistake, WeaknessReport};
pub use service::LearningLog;
pub use store::{RecordStore, SqliteRecordStore};
pub use types::{Correction, ListPeriod, NewCorrection, NewPhrase, Phrase, SortOrder};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
