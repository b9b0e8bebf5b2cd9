//! Character catalog model
//!
//! Catalog entries are immutable reference data seeded at startup and
//! read-only at request time.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Purchasable character catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub price: i64,
    pub rarity: String,
    pub category: String,
}
