//! Inventory item model
//!
//! Items are append-only rows: a user may own multiple identical items, each
//! its own row. Rows are never mutated after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an inventory item was acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemSource {
    Purchase,
    Gift,
    Returned,
    Default,
}

impl ItemSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemSource::Purchase => "purchase",
            ItemSource::Gift => "gift",
            ItemSource::Returned => "returned",
            ItemSource::Default => "default",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(ItemSource::Purchase),
            "gift" => Some(ItemSource::Gift),
            "returned" => Some(ItemSource::Returned),
            "default" => Some(ItemSource::Default),
            _ => None,
        }
    }
}

/// Inventory item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub item_type: String,
    pub character_id: Option<String>,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub price: i64,
    pub source: ItemSource,
    pub acquired_at: DateTime<Utc>,
}

/// Payload for appending a new inventory item; id and acquisition timestamp
/// are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub item_type: String,
    pub character_id: Option<String>,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub price: i64,
    pub source: ItemSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_source_round_trip() {
        for source in [
            ItemSource::Purchase,
            ItemSource::Gift,
            ItemSource::Returned,
            ItemSource::Default,
        ] {
            assert_eq!(ItemSource::parse(source.as_str()), Some(source));
        }
        assert_eq!(ItemSource::parse("stolen"), None);
    }
}
