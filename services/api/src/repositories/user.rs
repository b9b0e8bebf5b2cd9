//! User directory repository
//!
//! Lookup and update of user records. Balance and owned-character mutations
//! go through atomic SQL updates so concurrent ledger and gift settlements
//! on the same user cannot lose writes.

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{Character, CreditOperation, ItemSource, NewInventoryItem, NewUser, User};
use crate::repositories::{inventory, ledger};

/// User directory repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a new user with the default balance, the starter character
    /// already owned and selected, and a matching inventory row.
    pub async fn create(&self, new_user: &NewUser, starter: &Character) -> ApiResult<User> {
        info!("Creating new user: {}", new_user.username);

        let salt = SaltString::generate(&mut rand::thread_rng());
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(new_user.password.as_bytes(), &salt)
            .map_err(|e| ApiError::Validation(format!("Failed to hash password: {}", e)))?
            .to_string();

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, current_character, owned_characters)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, game_credits, current_character,
                      owned_characters, activated, created_at, updated_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&password_hash)
        .bind(&starter.id)
        .bind(vec![starter.id.clone()])
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::InvalidState("Username or email already taken".to_string())
            }
            _ => ApiError::Storage(e),
        })?;

        let user = map_user(&row);

        inventory::insert(
            &mut tx,
            user.id,
            &NewInventoryItem {
                item_type: "character".to_string(),
                character_id: Some(starter.id.clone()),
                name: starter.name.clone(),
                icon: starter.icon.clone(),
                description: starter.description.clone(),
                price: starter.price,
                source: ItemSource::Default,
            },
        )
        .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, game_credits, current_character,
                   owned_characters, activated, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_user))
    }

    /// Find a user by username or email
    pub async fn find_by_username_or_email(&self, username_or_email: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, game_credits, current_character,
                   owned_characters, activated, created_at, updated_at
            FROM users
            WHERE username = $1 OR email = $1
            "#,
        )
        .bind(username_or_email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_user))
    }

    /// Select the user's current character.
    ///
    /// Fails when the character is not in the user's owned set.
    pub async fn select_character(&self, user_id: Uuid, character_id: &str) -> ApiResult<User> {
        let row = sqlx::query(
            r#"
            UPDATE users
            SET current_character = $2, updated_at = now()
            WHERE id = $1 AND $2 = ANY(owned_characters)
            RETURNING id, username, email, password_hash, game_credits, current_character,
                      owned_characters, activated, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(character_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(map_user(&row)),
            None => {
                let exists = sqlx::query("SELECT 1 FROM users WHERE id = $1")
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .await?;

                Err(match exists {
                    Some(_) => ApiError::InvalidState("Character not owned".to_string()),
                    None => ApiError::NotFound("User"),
                })
            }
        }
    }

    /// Buy a catalog character in one transaction: debit the price, append
    /// the inventory row, and add the character to the owned set.
    pub async fn purchase_character(&self, user_id: Uuid, character: &Character) -> ApiResult<i64> {
        let mut tx = self.pool.begin().await?;

        // Lock the user row so the owned-set check and the debit cannot
        // race a concurrent purchase of the same character.
        let row = sqlx::query("SELECT owned_characters FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ApiError::NotFound("User"))?;

        let owned: Vec<String> = row.get("owned_characters");
        if owned.iter().any(|id| id == &character.id) {
            return Err(ApiError::InvalidState("Character already owned".to_string()));
        }

        // Free characters skip the ledger; there is nothing to debit or audit.
        let new_balance = if character.price > 0 {
            ledger::adjust(&mut tx, user_id, character.price, CreditOperation::Subtract).await?
        } else {
            sqlx::query_scalar("SELECT game_credits FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?
        };

        inventory::insert(
            &mut tx,
            user_id,
            &NewInventoryItem {
                item_type: "character".to_string(),
                character_id: Some(character.id.clone()),
                name: character.name.clone(),
                icon: character.icon.clone(),
                description: character.description.clone(),
                price: character.price,
                source: ItemSource::Purchase,
            },
        )
        .await?;

        sqlx::query(
            r#"
            UPDATE users
            SET owned_characters = array_append(owned_characters, $2), updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(&character.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("User {} purchased character {}", user_id, character.id);

        Ok(new_balance)
    }
}

pub(crate) fn map_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        game_credits: row.get("game_credits"),
        current_character: row.get("current_character"),
        owned_characters: row.get("owned_characters"),
        activated: row.get("activated"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
