//! Input validation for caller-supplied arguments
//!
//! Runs before any record is written or any query reaches the store.
//! Every failure carries a message that is shown to the user verbatim.

use crate::error::{LearningError, Result};
use crate::types::{ListPeriod, NewCorrection, NewPhrase, SortOrder};

pub const MAX_PHRASE_LENGTH: usize = 500;
pub const MAX_CONTEXT_LENGTH: usize = 1000;
pub const MAX_FEEDBACK_LENGTH: usize = 2000;
pub const MAX_ERROR_PATTERN_LENGTH: usize = 100;
pub const MAX_KEYWORD_LENGTH: usize = 200;
pub const MIN_QUERY_LIMIT: usize = 1;
pub const MAX_QUERY_LIMIT: usize = 100;

fn require_text(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LearningError::validation(message));
    }
    Ok(())
}

/// Lengths are counted in characters, not bytes
fn check_length(value: &str, max: usize, label: &str) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(LearningError::validation(format!(
            "{} is too long (max {} characters, got {})",
            label, max, len
        )));
    }
    Ok(())
}

/// Validate a new phrase
pub fn validate_phrase_input(input: &NewPhrase) -> Result<()> {
    require_text(&input.english, "English phrase cannot be empty")?;
    require_text(&input.japanese, "Japanese translation cannot be empty")?;

    check_length(&input.english, MAX_PHRASE_LENGTH, "English phrase")?;
    check_length(&input.japanese, MAX_PHRASE_LENGTH, "Japanese translation")?;
    check_length(&input.context, MAX_CONTEXT_LENGTH, "Context")?;
    Ok(())
}

/// Validate a new correction
pub fn validate_correction_input(input: &NewCorrection) -> Result<()> {
    require_text(&input.original_text, "Original text cannot be empty")?;
    require_text(&input.corrected_text, "Corrected text cannot be empty")?;
    require_text(&input.feedback, "Feedback cannot be empty")?;

    check_length(&input.original_text, MAX_FEEDBACK_LENGTH, "Original text")?;
    check_length(&input.corrected_text, MAX_FEEDBACK_LENGTH, "Corrected text")?;
    check_length(&input.feedback, MAX_FEEDBACK_LENGTH, "Feedback")?;
    check_length(&input.error_pattern, MAX_ERROR_PATTERN_LENGTH, "Error pattern")?;
    Ok(())
}

/// Validate a search keyword
pub fn validate_search_keyword(keyword: &str) -> Result<()> {
    require_text(keyword, "Search keyword cannot be empty")?;
    check_length(keyword, MAX_KEYWORD_LENGTH, "Search keyword")
}

/// Validate a query limit and clamp it to [`MAX_QUERY_LIMIT`].
///
/// Values above the maximum are not an error; they are silently reduced.
pub fn validate_limit(limit: i64) -> Result<usize> {
    if limit < MIN_QUERY_LIMIT as i64 {
        return Err(LearningError::validation("Limit must be at least 1"));
    }
    Ok((limit as u64).min(MAX_QUERY_LIMIT as u64) as usize)
}

/// Read a limit from a JSON argument bundle without range-checking it.
///
/// Integral floats (`20.0`) are accepted since JSON clients often send numbers
/// that way; anything else that is not an integer is rejected.
pub fn limit_from_value(value: &serde_json::Value) -> Result<i64> {
    let limit = match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    };

    limit.ok_or_else(|| LearningError::validation("Limit must be an integer"))
}

/// Validate a sort order, falling back to descending for anything unknown
pub fn validate_order(order: &str) -> SortOrder {
    SortOrder::parse(order).unwrap_or_default()
}

/// Validate a listing period, falling back to `all` for anything unknown
pub fn validate_period(period: &str) -> ListPeriod {
    ListPeriod::parse(period).unwrap_or_default()
}
