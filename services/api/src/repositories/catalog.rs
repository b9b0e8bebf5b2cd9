//! Character catalog repository
//!
//! The catalog is read-only at request time. Seeding at startup inserts a
//! row only when its id is absent, so restarts never duplicate entries or
//! overwrite edits made to existing rows.

use sqlx::{PgPool, Row};
use tracing::info;

use crate::error::ApiResult;
use crate::models::Character;

/// Catalog repository
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    /// Create a new catalog repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List the catalog, cheapest first, ties broken by name
    pub async fn list_active(&self) -> ApiResult<Vec<Character>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, icon, description, price, rarity, category
            FROM characters
            ORDER BY price ASC, name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_character).collect())
    }

    /// Find a catalog entry by id
    pub async fn get_by_id(&self, id: &str) -> ApiResult<Option<Character>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, icon, description, price, rarity, category
            FROM characters
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_character))
    }

    /// Insert a catalog entry if its id is absent; idempotent across restarts
    pub async fn upsert_if_absent(&self, character: &Character) -> ApiResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO characters (id, name, icon, description, price, rarity, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&character.id)
        .bind(&character.name)
        .bind(&character.icon)
        .bind(&character.description)
        .bind(character.price)
        .bind(&character.rarity)
        .bind(&character.category)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() > 0;
        if inserted {
            info!("Seeded catalog character: {}", character.id);
        }

        Ok(inserted)
    }
}

fn map_character(row: &sqlx::postgres::PgRow) -> Character {
    Character {
        id: row.get("id"),
        name: row.get("name"),
        icon: row.get("icon"),
        description: row.get("description"),
        price: row.get("price"),
        rarity: row.get("rarity"),
        category: row.get("category"),
    }
}
