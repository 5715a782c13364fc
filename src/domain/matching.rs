//! Match Entity
//!
//! A match pairs one lost item with one found item. It is created and
//! removed by an administrator and never edited in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    pub lost_item_id: i64,
    pub found_item_id: i64,
    /// User who made the pairing
    pub matched_by: i64,
    pub matched_at: DateTime<Utc>,
}

/// Request to pair a lost item with a found item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    pub lost_item_id: i64,
    pub found_item_id: i64,
    pub matched_by: i64,
}

/// A match joined with the display names of everything it references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchView {
    #[serde(flatten)]
    pub record: Match,
    pub lost_name: String,
    pub found_name: String,
    pub matched_by_name: String,
}
