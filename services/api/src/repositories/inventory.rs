//! Inventory repository for database operations
//!
//! The inventory is append-only. Duplicate content is always allowed: a user
//! owning two of the same item has two rows.

use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{InventoryItem, ItemSource, NewInventoryItem};

/// Inventory repository
#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    /// Create a new inventory repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an item to a user's inventory.
    ///
    /// The id and acquisition timestamp are assigned by the store.
    pub async fn append(&self, owner_id: Uuid, item: &NewInventoryItem) -> ApiResult<InventoryItem> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, owner_id, item).await
    }

    /// List a user's inventory, newest acquisitions first.
    ///
    /// Newest-first is the canonical ordering for every inventory view, so
    /// the most recent gift-derived items surface at the top.
    pub async fn list_by_owner(&self, owner_id: Uuid) -> ApiResult<Vec<InventoryItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, item_type, character_id, name, icon, description,
                   price, source, acquired_at
            FROM inventory_items
            WHERE owner_id = $1
            ORDER BY acquired_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_item).collect()
    }
}

/// Insert an inventory row inside an open connection or transaction.
///
/// Gift settlement and shop purchases call this so the row lands in the same
/// database transaction as the rest of the settlement.
pub(crate) async fn insert(
    conn: &mut PgConnection,
    owner_id: Uuid,
    item: &NewInventoryItem,
) -> ApiResult<InventoryItem> {
    let row = sqlx::query(
        r#"
        INSERT INTO inventory_items (owner_id, item_type, character_id, name, icon,
                                     description, price, source)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, owner_id, item_type, character_id, name, icon, description,
                  price, source, acquired_at
        "#,
    )
    .bind(owner_id)
    .bind(&item.item_type)
    .bind(&item.character_id)
    .bind(&item.name)
    .bind(&item.icon)
    .bind(&item.description)
    .bind(item.price)
    .bind(item.source.as_str())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => ApiError::NotFound("User"),
        _ => ApiError::Storage(e),
    })?;

    map_item(&row)
}

pub(crate) fn map_item(row: &sqlx::postgres::PgRow) -> ApiResult<InventoryItem> {
    let source: String = row.get("source");
    let source = ItemSource::parse(&source)
        .ok_or_else(|| sqlx::Error::Decode(format!("Unknown item source: {}", source).into()))?;

    Ok(InventoryItem {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        item_type: row.get("item_type"),
        character_id: row.get("character_id"),
        name: row.get("name"),
        icon: row.get("icon"),
        description: row.get("description"),
        price: row.get("price"),
        source,
        acquired_at: row.get("acquired_at"),
    })
}
