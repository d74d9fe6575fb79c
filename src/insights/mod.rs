//! Review ranking, weakness analysis and keyword matching
//!
//! Everything in here is pure and synchronous: it works on records that the
//! store has already fetched and never touches storage itself.

pub mod priority;
pub mod search;
pub mod weakness;

pub use priority::{hard_to_remember, rank_for_review, HARD_TO_REMEMBER_LIMIT};
pub use search::{matches_keyword, select_matches};
pub use weakness::{
    analyze, repeated_mistakes, PatternCount, RepeatedMistake, WeaknessReport, RECENT_CORRECTIONS,
    REPEATED_MISTAKES_LIMIT,
};
