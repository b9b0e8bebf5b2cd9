//! Repositories for database operations

pub mod catalog;
pub mod gift;
pub mod inventory;
pub mod ledger;
pub mod message;
pub mod user;

pub use catalog::CatalogRepository;
pub use gift::GiftRepository;
pub use inventory::InventoryRepository;
pub use ledger::LedgerRepository;
pub use message::MessageRepository;
pub use user::UserRepository;
