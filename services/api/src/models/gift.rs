//! Gift model and state machine types
//!
//! A gift is a relation between two users, keyed by its own id. Its status
//! moves from `pending` to exactly one of `claimed` or `rejected`; a gift in
//! a terminal state is immutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Gift lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GiftStatus {
    Pending,
    Claimed,
    Rejected,
}

impl GiftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GiftStatus::Pending => "pending",
            GiftStatus::Claimed => "claimed",
            GiftStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(GiftStatus::Pending),
            "claimed" => Some(GiftStatus::Claimed),
            "rejected" => Some(GiftStatus::Rejected),
            _ => None,
        }
    }

    /// Whether the status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, GiftStatus::Claimed | GiftStatus::Rejected)
    }
}

/// What kind of value a gift carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Character,
    Credits,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Character => "character",
            ItemType::Credits => "credits",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "character" => Some(ItemType::Character),
            "credits" => Some(ItemType::Credits),
            _ => None,
        }
    }
}

/// Snapshot of the gifted item, copied into the gift at send time so later
/// catalog edits cannot change an outstanding gift.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftItemData {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: i64,
    /// Credit amount, present for credit gifts only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    /// Catalog id, present for character gifts only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<String>,
}

/// Gift entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gift {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub item_type: ItemType,
    pub item_data: GiftItemData,
    pub message: String,
    pub status: GiftStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
}

/// Payload for sending a new gift
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGift {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub item_type: ItemType,
    pub item_data: GiftItemData,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [GiftStatus::Pending, GiftStatus::Claimed, GiftStatus::Rejected] {
            assert_eq!(GiftStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(GiftStatus::parse("expired"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!GiftStatus::Pending.is_terminal());
        assert!(GiftStatus::Claimed.is_terminal());
        assert!(GiftStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_item_data_deserializes_with_defaults() {
        let data: GiftItemData = serde_json::from_str(r#"{"name": "Dragon"}"#)
            .expect("Failed to deserialize item data");
        assert_eq!(data.name, "Dragon");
        assert_eq!(data.price, 0);
        assert!(data.amount.is_none());
    }
}
