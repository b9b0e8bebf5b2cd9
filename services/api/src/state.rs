//! Application state shared across handlers

use sqlx::PgPool;

use crate::repositories::{
    CatalogRepository, GiftRepository, InventoryRepository, LedgerRepository, MessageRepository,
    UserRepository,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub user_repository: UserRepository,
    pub catalog_repository: CatalogRepository,
    pub inventory_repository: InventoryRepository,
    pub ledger_repository: LedgerRepository,
    pub gift_repository: GiftRepository,
    pub message_repository: MessageRepository,
}
