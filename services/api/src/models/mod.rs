//! Data models for the game backend

pub mod character;
pub mod gift;
pub mod inventory;
pub mod ledger;
pub mod message;
pub mod user;

pub use character::Character;
pub use gift::{Gift, GiftItemData, GiftStatus, ItemType, NewGift};
pub use inventory::{InventoryItem, ItemSource, NewInventoryItem};
pub use ledger::{CreditOperation, Transaction};
pub use message::{Message, NewMessage};
pub use user::{NewUser, User, UserResponse};
