//! Gift repository: the gift-transfer state machine
//!
//! A gift moves from `pending` to exactly one of `claimed` or `rejected`.
//! The transition is a compare-and-set on the stored status, checked by
//! affected-row count, and it shares one database transaction with the
//! settlement effect (inventory append or credit addition). Two racing
//! claims therefore settle exactly once: the loser's update matches zero
//! rows and surfaces as `NotFound`.
//!
//! Sending a gift never debits the sender. A gifted character is a copy of
//! the catalog snapshot, not a transfer out of the sender's inventory; a
//! rejected character gift materializes in the sender's inventory as a new
//! `returned` row.

use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreditOperation, Gift, GiftItemData, GiftStatus, ItemSource, ItemType, NewGift,
    NewInventoryItem,
};
use crate::repositories::{inventory, ledger};

const GIFT_COLUMNS: &str =
    "id, sender_id, recipient_id, item_type, item_data, message, status, created_at, claimed_at";

/// Gift repository
#[derive(Clone)]
pub struct GiftRepository {
    pool: PgPool,
}

impl GiftRepository {
    /// Create a new gift repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a pending gift from sender to recipient.
    ///
    /// Both parties must resolve to existing users. Nothing is debited from
    /// the sender at send time.
    pub async fn send(&self, new_gift: &NewGift) -> ApiResult<Gift> {
        let parties: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ANY($1)")
            .bind(vec![new_gift.sender_id, new_gift.recipient_id])
            .fetch_one(&self.pool)
            .await?;

        let expected = if new_gift.sender_id == new_gift.recipient_id { 1 } else { 2 };
        if parties != expected {
            return Err(ApiError::NotFound("User"));
        }

        let item_data = serde_json::to_value(&new_gift.item_data)
            .map_err(|e| ApiError::Validation(format!("Invalid gift item data: {}", e)))?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO gifts (sender_id, recipient_id, item_type, item_data, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {GIFT_COLUMNS}
            "#,
        ))
        .bind(new_gift.sender_id)
        .bind(new_gift.recipient_id)
        .bind(new_gift.item_type.as_str())
        .bind(&item_data)
        .bind(&new_gift.message)
        .fetch_one(&self.pool)
        .await?;

        let gift = map_gift(&row)?;

        info!(
            "Gift {} sent from {} to {} ({})",
            gift.id,
            gift.sender_id,
            gift.recipient_id,
            gift.item_type.as_str()
        );

        Ok(gift)
    }

    /// List a recipient's unresolved gifts, most recent first
    pub async fn list_pending_for_recipient(&self, recipient_id: Uuid) -> ApiResult<Vec<Gift>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {GIFT_COLUMNS}
            FROM gifts
            WHERE recipient_id = $1 AND status = 'pending'
            ORDER BY created_at DESC, id DESC
            "#,
        ))
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_gift).collect()
    }

    /// Claim a pending gift and settle it onto the recipient.
    ///
    /// An absent gift, a gift addressed to someone else, and an
    /// already-settled gift all fail identically with `NotFound`, so gift
    /// ids cannot be probed for other users' gifts.
    pub async fn claim(&self, gift_id: Uuid, acting_user_id: Uuid) -> ApiResult<Gift> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE gifts
            SET status = 'claimed', claimed_at = now()
            WHERE id = $1 AND recipient_id = $2 AND status = 'pending'
            RETURNING {GIFT_COLUMNS}
            "#,
        ))
        .bind(gift_id)
        .bind(acting_user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let gift = match row {
            Some(row) => map_gift(&row)?,
            None => return Err(ApiError::NotFound("Gift")),
        };

        match gift.item_type {
            ItemType::Character => {
                inventory::insert(
                    &mut tx,
                    gift.recipient_id,
                    &snapshot_item(&gift.item_data, ItemSource::Gift),
                )
                .await?;

                // Idempotent union: a character the recipient already owns
                // is not added twice.
                if let Some(character_id) = &gift.item_data.character_id {
                    sqlx::query(
                        r#"
                        UPDATE users
                        SET owned_characters = array_append(owned_characters, $2),
                            updated_at = now()
                        WHERE id = $1 AND NOT ($2 = ANY(owned_characters))
                        "#,
                    )
                    .bind(gift.recipient_id)
                    .bind(character_id)
                    .execute(&mut *tx)
                    .await?;
                }
            }
            ItemType::Credits => {
                let amount = gift.item_data.amount.ok_or_else(|| {
                    ApiError::InvalidState("Credit gift carries no amount".to_string())
                })?;
                ledger::adjust(&mut tx, gift.recipient_id, amount, CreditOperation::Add).await?;
            }
        }

        tx.commit().await?;

        info!("Gift {} claimed by {}", gift.id, acting_user_id);

        Ok(gift)
    }

    /// Reject a pending gift.
    ///
    /// A rejected character gift is returned to the sender as a new
    /// inventory row with source `returned`; the recipient's inventory and
    /// balance are untouched. Same visibility rule as `claim`.
    pub async fn reject(&self, gift_id: Uuid, acting_user_id: Uuid) -> ApiResult<Gift> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE gifts
            SET status = 'rejected'
            WHERE id = $1 AND recipient_id = $2 AND status = 'pending'
            RETURNING {GIFT_COLUMNS}
            "#,
        ))
        .bind(gift_id)
        .bind(acting_user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let gift = match row {
            Some(row) => map_gift(&row)?,
            None => return Err(ApiError::NotFound("Gift")),
        };

        if gift.item_type == ItemType::Character {
            inventory::insert(
                &mut tx,
                gift.sender_id,
                &snapshot_item(&gift.item_data, ItemSource::Returned),
            )
            .await?;
        }

        tx.commit().await?;

        info!("Gift {} rejected by {}", gift.id, acting_user_id);

        Ok(gift)
    }
}

/// Build the inventory row for a settled character gift from its snapshot
fn snapshot_item(data: &GiftItemData, source: ItemSource) -> NewInventoryItem {
    NewInventoryItem {
        item_type: "character".to_string(),
        character_id: data.character_id.clone(),
        name: data.name.clone(),
        icon: data.icon.clone(),
        description: data.description.clone(),
        price: data.price,
        source,
    }
}

fn map_gift(row: &sqlx::postgres::PgRow) -> ApiResult<Gift> {
    let item_type: String = row.get("item_type");
    let item_type = ItemType::parse(&item_type)
        .ok_or_else(|| sqlx::Error::Decode(format!("Unknown item type: {}", item_type).into()))?;

    let status: String = row.get("status");
    let status = GiftStatus::parse(&status)
        .ok_or_else(|| sqlx::Error::Decode(format!("Unknown gift status: {}", status).into()))?;

    let item_data: serde_json::Value = row.get("item_data");
    let item_data: GiftItemData = serde_json::from_value(item_data)
        .map_err(|e| sqlx::Error::Decode(format!("Invalid gift item data: {}", e).into()))?;

    Ok(Gift {
        id: row.get("id"),
        sender_id: row.get("sender_id"),
        recipient_id: row.get("recipient_id"),
        item_type,
        item_data,
        message: row.get("message"),
        status,
        created_at: row.get("created_at"),
        claimed_at: row.get("claimed_at"),
    })
}
