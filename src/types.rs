//! Record types shared across modules
//!
//! Phrases and corrections are the two record kinds kept per user. Both are
//! created once and never deleted; only a phrase's query statistics change
//! after creation.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A saved phrase with its translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    /// Partition key
    pub user_id: String,
    /// Unique within the user's partition
    pub phrase_id: String,
    pub english: String,
    pub japanese: String,
    /// Optional usage context
    #[serde(default)]
    pub context: Option<String>,
    pub created_at: DateTime<Utc>,
    /// How many keyword searches have matched this phrase
    #[serde(default)]
    pub query_count: u32,
    /// When a keyword search last matched this phrase
    #[serde(default)]
    pub last_queried_at: Option<DateTime<Utc>>,
    /// Review timestamp. Absent means the phrase was never reviewed.
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl Phrase {
    /// Context text, or the empty string when none was given
    pub fn context_text(&self) -> &str {
        self.context.as_deref().unwrap_or("")
    }

    /// Whether this phrase has a review timestamp
    pub fn is_reviewed(&self) -> bool {
        self.reviewed_at.is_some()
    }
}

/// A correction of a piece of learner text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub user_id: String,
    pub correction_id: String,
    pub original_text: String,
    pub corrected_text: String,
    pub feedback: String,
    /// Free-form error category ("grammar", "spelling", ...). May be empty.
    #[serde(default)]
    pub error_pattern: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Input for creating a phrase
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPhrase {
    pub english: String,
    pub japanese: String,
    #[serde(default)]
    pub context: String,
}

impl NewPhrase {
    /// Copy with surrounding whitespace removed from every field
    pub fn trimmed(&self) -> Self {
        Self {
            english: self.english.trim().to_string(),
            japanese: self.japanese.trim().to_string(),
            context: self.context.trim().to_string(),
        }
    }
}

/// Input for creating a correction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCorrection {
    pub original_text: String,
    pub corrected_text: String,
    pub feedback: String,
    #[serde(default)]
    pub error_pattern: String,
}

impl NewCorrection {
    pub fn trimmed(&self) -> Self {
        Self {
            original_text: self.original_text.trim().to_string(),
            corrected_text: self.corrected_text.trim().to_string(),
            feedback: self.feedback.trim().to_string(),
            error_pattern: self.error_pattern.trim().to_string(),
        }
    }
}

/// Listing order by creation time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse `asc` / `desc`
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    /// SQL keyword for this order
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// Creation-time window for phrase listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListPeriod {
    /// Since the start of the current UTC day
    Today,
    /// Since the start of the UTC day seven days ago
    ThisWeek,
    #[default]
    All,
}

impl ListPeriod {
    /// Parse `today` / `this_week` / `all`
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "today" => Some(ListPeriod::Today),
            "this_week" => Some(ListPeriod::ThisWeek),
            "all" => Some(ListPeriod::All),
            _ => None,
        }
    }

    /// Earliest creation time included at `now`, or `None` for no bound
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start_of_day = |ts: DateTime<Utc>| ts.date_naive().and_time(NaiveTime::MIN).and_utc();
        match self {
            ListPeriod::Today => Some(start_of_day(now)),
            ListPeriod::ThisWeek => Some(start_of_day(now - Duration::days(7))),
            ListPeriod::All => None,
        }
    }
}

impl std::fmt::Display for ListPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListPeriod::Today => write!(f, "today"),
            ListPeriod::ThisWeek => write!(f, "this_week"),
            ListPeriod::All => write!(f, "all"),
        }
    }
}
