//! Item Entities
//!
//! Lost and found item records. Both carry a denormalized `status` that the
//! match registry flips between `pending` and `matched`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether an item is still waiting for a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Pending,
    Matched,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Matched => "matched",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ItemStatus::Pending),
            "matched" => Some(ItemStatus::Matched),
            _ => None,
        }
    }
}

/// Which of the two item tables a record lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Lost,
    Found,
}

impl ItemKind {
    pub fn table(&self) -> &'static str {
        match self {
            ItemKind::Lost => "lost_items",
            ItemKind::Found => "found_items",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Lost => f.write_str("lost item"),
            ItemKind::Found => f.write_str("found item"),
        }
    }
}

/// A reported lost object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostItem {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub place: String,
    pub date_lost: NaiveDate,
    pub description: String,
    /// Contact number, if the owner left one
    pub mobile: Option<i64>,
    /// Public path of the uploaded photo, e.g. `/uploads/1700000000-wallet.jpg`
    pub image_url: String,
    /// User who posted the report
    pub posted_by: i64,
    pub avatar_url: String,
    pub status: ItemStatus,
}

/// A reported found object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundItem {
    pub id: i64,
    pub name: String,
    pub category: String,
    /// Location code of where the item was handed in
    pub place: i64,
    pub date_found: NaiveDate,
    pub image_url: String,
    pub submitted_by: i64,
    pub status: ItemStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLostItem {
    pub name: String,
    pub category: String,
    pub place: String,
    pub date_lost: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mobile: Option<i64>,
    pub image_url: String,
    pub posted_by: i64,
    #[serde(default)]
    pub avatar_url: String,
}

impl NewLostItem {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.category.trim().is_empty() || self.place.trim().is_empty() {
            return Err("Missing required fields".to_string());
        }
        if self.image_url.is_empty() {
            return Err("Please upload a valid image file".to_string());
        }
        Ok(())
    }
}

/// A found item report. New reports always start out `pending`; only the
/// match registry moves them to `matched`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFoundItem {
    pub name: String,
    pub category: String,
    /// Accepts a number or a numeric string; unparseable input becomes `1`
    #[serde(default = "default_place", deserialize_with = "place_code")]
    pub place: i64,
    pub date_found: NaiveDate,
    pub image_url: String,
    pub submitted_by: i64,
}

const DEFAULT_PLACE: i64 = 1;

fn default_place() -> i64 {
    DEFAULT_PLACE
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPlace {
    Code(i64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn place_code<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match RawPlace::deserialize(deserializer)? {
        RawPlace::Code(code) => code,
        RawPlace::Text(text) => parse_place(&text).unwrap_or(DEFAULT_PLACE),
        RawPlace::Other(_) => DEFAULT_PLACE,
    })
}

/// Leading decimal integer of `text`, after optional whitespace and sign
fn parse_place(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    rest[..digits].parse::<i64>().ok().map(|n| sign * n)
}

/// Either kind of item, as returned by the item store
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Item {
    Lost(LostItem),
    Found(FoundItem),
}

impl Item {
    pub fn id(&self) -> i64 {
        match self {
            Item::Lost(item) => item.id,
            Item::Found(item) => item.id,
        }
    }

    pub fn status(&self) -> ItemStatus {
        match self {
            Item::Lost(item) => item.status,
            Item::Found(item) => item.status,
        }
    }
}
