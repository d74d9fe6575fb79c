//! Daily learning summary
//!
//! Collects what was saved "today" in the learner's local time and renders it
//! as the plain-text message pushed to the messaging channel.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;
use std::fmt::Write as _;

use crate::types::{Correction, Phrase};

const MAX_TODAY_PHRASES: usize = 5;
const MAX_TODAY_CORRECTIONS: usize = 3;
const MAX_NEED_REVIEW: usize = 5;
const MAX_NEED_REVIEW_SHOWN: usize = 3;
const REVIEW_AFTER_DAYS: i64 = 7;

/// One day's learning activity
#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    /// Local date, `YYYY-MM-DD`
    pub date: String,
    pub today_phrases: Vec<Phrase>,
    pub today_corrections: Vec<Correction>,
    pub need_review_phrases: Vec<Phrase>,
}

impl DailySummary {
    pub fn is_empty(&self) -> bool {
        self.today_phrases.is_empty() && self.today_corrections.is_empty()
    }
}

fn offset_for(utc_offset_hours: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_hours.clamp(-23, 23) * 3600).unwrap_or(Utc.fix())
}

fn local_date(ts: &DateTime<Utc>, offset: &FixedOffset) -> NaiveDate {
    ts.with_timezone(offset).date_naive()
}

/// Build the summary for the local day containing `now`.
///
/// A phrase needs review when it was never matched by a search, or when its
/// last match falls on a local date before the date seven days ago.
pub fn build_daily_summary(
    phrases: &[Phrase],
    corrections: &[Correction],
    now: DateTime<Utc>,
    utc_offset_hours: i32,
) -> DailySummary {
    let offset = offset_for(utc_offset_hours);
    let today = local_date(&now, &offset);
    let week_ago = local_date(&(now - Duration::days(REVIEW_AFTER_DAYS)), &offset);

    let mut today_phrases: Vec<Phrase> = phrases
        .iter()
        .filter(|p| local_date(&p.created_at, &offset) == today)
        .cloned()
        .collect();
    today_phrases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    today_phrases.truncate(MAX_TODAY_PHRASES);

    let mut today_corrections: Vec<Correction> = corrections
        .iter()
        .filter(|c| local_date(&c.created_at, &offset) == today)
        .cloned()
        .collect();
    today_corrections.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    today_corrections.truncate(MAX_TODAY_CORRECTIONS);

    let mut need_review: Vec<Phrase> = phrases
        .iter()
        .filter(|p| match &p.last_queried_at {
            None => true,
            Some(ts) => local_date(ts, &offset) < week_ago,
        })
        .cloned()
        .collect();
    need_review.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    need_review.truncate(MAX_NEED_REVIEW);

    DailySummary {
        date: today.format("%Y-%m-%d").to_string(),
        today_phrases,
        today_corrections,
        need_review_phrases: need_review,
    }
}

/// Render the summary as the push message text
pub fn format_summary_message(summary: &DailySummary) -> String {
    if summary.is_empty() {
        return format!(
            "📚 Today's English Learning Summary\n\nDate: {}\n\nNo learning records today.\nKeep going tomorrow! 💪",
            summary.date
        );
    }

    let mut message = format!("📚 Today's English Learning Summary\n\nDate: {}\n", summary.date);

    if !summary.today_phrases.is_empty() {
        let _ = writeln!(message, "\n📝 Saved Phrases ({}):", summary.today_phrases.len());
        for p in &summary.today_phrases {
            let _ = writeln!(message, "\n• {}\n  → {}", p.english, p.japanese);
            if let Some(context) = p.context.as_deref().filter(|c| !c.is_empty()) {
                let _ = writeln!(message, "  💡 {}", context);
            }
        }
    }

    if !summary.today_corrections.is_empty() {
        let _ = writeln!(message, "\n✏️ Corrections ({}):", summary.today_corrections.len());
        for c in &summary.today_corrections {
            let _ = writeln!(message, "\n❌ {}", c.original_text);
            let _ = writeln!(message, "✅ {}", c.corrected_text);
            if !c.feedback.is_empty() {
                let _ = writeln!(message, "💬 {}", c.feedback);
            }
        }
    }

    if !summary.need_review_phrases.is_empty() {
        let _ = writeln!(message, "\n⚠️ Need Review ({}):", summary.need_review_phrases.len());
        for p in summary.need_review_phrases.iter().take(MAX_NEED_REVIEW_SHOWN) {
            let _ = writeln!(message, "• {}", p.english);
        }
    }

    if summary.today_phrases.len() >= MAX_TODAY_PHRASES {
        message.push_str("\n\n🎉 Excellent! You learned a lot today!");
    } else if summary.today_corrections.len() >= MAX_TODAY_CORRECTIONS {
        message.push_str("\n\n👍 Great job! You're growing through corrections!");
    } else {
        message.push_str("\n\n💪 Keep going tomorrow!");
    }

    message
}
