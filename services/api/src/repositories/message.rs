//! Direct message repository for database operations

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{Message, NewMessage};

/// Message repository
#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new message repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a direct message between two users
    pub async fn send(&self, new_message: &NewMessage) -> ApiResult<Message> {
        let row = sqlx::query(
            r#"
            INSERT INTO messages (sender_id, recipient_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, sender_id, recipient_id, body, created_at
            "#,
        )
        .bind(new_message.sender_id)
        .bind(new_message.recipient_id)
        .bind(&new_message.body)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                ApiError::NotFound("User")
            }
            _ => ApiError::Storage(e),
        })?;

        Ok(map_message(&row))
    }

    /// List the conversation between two users, oldest first
    pub async fn conversation(&self, user_id: Uuid, peer_id: Uuid) -> ApiResult<Vec<Message>> {
        let rows = sqlx::query(
            r#"
            SELECT id, sender_id, recipient_id, body, created_at
            FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2)
               OR (sender_id = $2 AND recipient_id = $1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(peer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_message).collect())
    }
}

fn map_message(row: &sqlx::postgres::PgRow) -> Message {
    Message {
        id: row.get("id"),
        sender_id: row.get("sender_id"),
        recipient_id: row.get("recipient_id"),
        body: row.get("body"),
        created_at: row.get("created_at"),
    }
}
