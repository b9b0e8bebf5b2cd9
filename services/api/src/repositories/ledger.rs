//! Ledger repository: the authoritative record of credit balances
//!
//! Every balance mutation appends one row to the transactions audit trail.
//! The balance update and the audit row always share one database
//! transaction.

use sqlx::{PgConnection, PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{CreditOperation, Transaction};

/// Ledger repository
#[derive(Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    /// Create a new ledger repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Adjust a user's credit balance and append the audit record.
    ///
    /// A `Subtract` that exceeds the current balance is rejected wholesale
    /// and leaves the balance unchanged.
    pub async fn adjust_balance(
        &self,
        user_id: Uuid,
        amount: i64,
        operation: CreditOperation,
    ) -> ApiResult<i64> {
        let mut tx = self.pool.begin().await?;
        let new_balance = adjust(&mut tx, user_id, amount, operation).await?;
        tx.commit().await?;

        info!(
            "Adjusted balance for user {}: {} {} -> {}",
            user_id,
            operation.as_str(),
            amount,
            new_balance
        );

        Ok(new_balance)
    }

    /// List a user's transaction history, newest first
    pub async fn history(&self, user_id: Uuid) -> ApiResult<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, amount, tx_type, balance_after, created_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_transaction).collect()
    }
}

/// Apply a balance mutation inside an open transaction.
///
/// The update is a single atomic increment guarded by the non-negativity
/// predicate, so two racing mutations on the same user cannot lose an
/// update or drive the balance below zero.
pub(crate) async fn adjust(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: i64,
    operation: CreditOperation,
) -> ApiResult<i64> {
    if amount <= 0 {
        return Err(ApiError::Validation("Amount must be positive".to_string()));
    }

    let delta = match operation {
        CreditOperation::Add => amount,
        CreditOperation::Subtract => -amount,
    };

    let row = sqlx::query(
        r#"
        UPDATE users
        SET game_credits = game_credits + $2, updated_at = now()
        WHERE id = $1 AND game_credits + $2 >= 0
        RETURNING game_credits
        "#,
    )
    .bind(user_id)
    .bind(delta)
    .fetch_optional(&mut *conn)
    .await?;

    let new_balance: i64 = match row {
        Some(row) => row.get("game_credits"),
        None => {
            // The update misses both for an absent user and for an
            // overdraft; disambiguate before reporting.
            let exists = sqlx::query("SELECT 1 FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?;

            return Err(match exists {
                Some(_) => ApiError::InvalidState("Insufficient funds".to_string()),
                None => ApiError::NotFound("User"),
            });
        }
    };

    sqlx::query(
        r#"
        INSERT INTO transactions (user_id, amount, tx_type, balance_after)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(operation.as_str())
    .bind(new_balance)
    .execute(&mut *conn)
    .await?;

    Ok(new_balance)
}

pub(crate) fn map_transaction(row: &sqlx::postgres::PgRow) -> ApiResult<Transaction> {
    let tx_type: String = row.get("tx_type");
    let tx_type = CreditOperation::parse(&tx_type)
        .ok_or_else(|| sqlx::Error::Decode(format!("Unknown tx_type: {}", tx_type).into()))?;

    Ok(Transaction {
        id: row.get("id"),
        user_id: row.get("user_id"),
        amount: row.get("amount"),
        tx_type,
        balance_after: row.get("balance_after"),
        created_at: row.get("created_at"),
    })
}
