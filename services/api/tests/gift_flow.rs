//! Integration tests for the gift protocol, ledger, and inventory
//!
//! These tests run against the live PostgreSQL instance named by
//! `DATABASE_URL` and skip themselves when the variable is unset, so the
//! suite still passes on machines without a database.

use serial_test::serial;
use sqlx::PgPool;
use uuid::Uuid;

use api::{
    error::ApiError,
    models::{
        CreditOperation, GiftItemData, GiftStatus, ItemSource, ItemType, NewGift,
        NewInventoryItem, NewUser, User,
    },
    repositories::{
        CatalogRepository, GiftRepository, InventoryRepository, LedgerRepository, UserRepository,
    },
    seed,
};
use common::database::{DatabaseConfig, init_pool};

async fn try_setup() -> Option<PgPool> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping");
        return None;
    }

    let config = DatabaseConfig::from_env().expect("Failed to read database config");
    let pool = init_pool(&config).await.expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    seed::seed_catalog(&CatalogRepository::new(pool.clone()))
        .await
        .expect("Failed to seed catalog");

    Some(pool)
}

async fn create_user(pool: &PgPool) -> User {
    let users = UserRepository::new(pool.clone());
    let catalog = CatalogRepository::new(pool.clone());

    let starter = catalog
        .get_by_id(seed::STARTER_CHARACTER)
        .await
        .expect("Failed to query catalog")
        .expect("Starter character not seeded");

    let suffix = Uuid::new_v4().simple().to_string();
    let username = format!("u{}", &suffix[..12]);

    users
        .create(
            &NewUser {
                username: username.clone(),
                email: format!("{}@example.com", username),
                password: "correct horse battery".to_string(),
            },
            &starter,
        )
        .await
        .expect("Failed to create user")
}

fn credit_gift(sender: &User, recipient: &User, amount: i64) -> NewGift {
    NewGift {
        sender_id: sender.id,
        recipient_id: recipient.id,
        item_type: ItemType::Credits,
        item_data: GiftItemData {
            name: format!("{} credits", amount),
            icon: "💰".to_string(),
            description: String::new(),
            price: 0,
            amount: Some(amount),
            character_id: None,
        },
        message: "for you".to_string(),
    }
}

fn character_gift(sender: &User, recipient: &User, character_id: &str, price: i64) -> NewGift {
    NewGift {
        sender_id: sender.id,
        recipient_id: recipient.id,
        item_type: ItemType::Character,
        item_data: GiftItemData {
            name: character_id.to_string(),
            icon: "🐉".to_string(),
            description: String::new(),
            price,
            amount: None,
            character_id: Some(character_id.to_string()),
        },
        message: String::new(),
    }
}

#[tokio::test]
#[serial]
async fn test_credit_gift_claim_settles_exactly_once() {
    let Some(pool) = try_setup().await else { return };
    let gifts = GiftRepository::new(pool.clone());
    let users = UserRepository::new(pool.clone());
    let ledger = LedgerRepository::new(pool.clone());

    let sender = create_user(&pool).await;
    let recipient = create_user(&pool).await;

    let gift = gifts
        .send(&credit_gift(&sender, &recipient, 50))
        .await
        .expect("Failed to send gift");
    assert_eq!(gift.status, GiftStatus::Pending);

    let claimed = gifts
        .claim(gift.id, recipient.id)
        .await
        .expect("Failed to claim gift");
    assert_eq!(claimed.status, GiftStatus::Claimed);
    assert!(claimed.claimed_at.is_some());

    let recipient_after = users
        .find_by_id(recipient.id)
        .await
        .unwrap()
        .expect("Recipient vanished");
    assert_eq!(recipient_after.game_credits, recipient.game_credits + 50);

    let sender_after = users.find_by_id(sender.id).await.unwrap().unwrap();
    assert_eq!(sender_after.game_credits, sender.game_credits);

    let history = ledger.history(recipient.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].amount, 50);
    assert_eq!(history[0].tx_type, CreditOperation::Add);
    assert_eq!(history[0].balance_after, recipient.game_credits + 50);

    // A second claim must find no pending row
    let second = gifts.claim(gift.id, recipient.id).await;
    assert!(matches!(second, Err(ApiError::NotFound(_))));

    let history = ledger.history(recipient.id).await.unwrap();
    assert_eq!(history.len(), 1, "Double claim settled twice");
}

#[tokio::test]
#[serial]
async fn test_concurrent_claims_settle_exactly_once() {
    let Some(pool) = try_setup().await else { return };
    let gifts = GiftRepository::new(pool.clone());
    let users = UserRepository::new(pool.clone());
    let inventory = InventoryRepository::new(pool.clone());

    let sender = create_user(&pool).await;
    let recipient = create_user(&pool).await;

    let gift = gifts
        .send(&character_gift(&sender, &recipient, "dragon", 500))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        gifts.claim(gift.id, recipient.id),
        gifts.claim(gift.id, recipient.id),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1, "Exactly one concurrent claim must win");

    let items = inventory.list_by_owner(recipient.id).await.unwrap();
    let dragons = items
        .iter()
        .filter(|i| i.character_id.as_deref() == Some("dragon"))
        .count();
    assert_eq!(dragons, 1, "Settlement granted the item more than once");

    let recipient_after = users.find_by_id(recipient.id).await.unwrap().unwrap();
    let owned_dragons = recipient_after
        .owned_characters
        .iter()
        .filter(|id| id.as_str() == "dragon")
        .count();
    assert_eq!(owned_dragons, 1);
}

#[tokio::test]
#[serial]
async fn test_reject_returns_copy_to_sender() {
    let Some(pool) = try_setup().await else { return };
    let gifts = GiftRepository::new(pool.clone());
    let users = UserRepository::new(pool.clone());
    let inventory = InventoryRepository::new(pool.clone());

    let sender = create_user(&pool).await;
    let recipient = create_user(&pool).await;

    let gift = gifts
        .send(&character_gift(&sender, &recipient, "dragon", 500))
        .await
        .unwrap();

    let rejected = gifts.reject(gift.id, recipient.id).await.unwrap();
    assert_eq!(rejected.status, GiftStatus::Rejected);

    let sender_items = inventory.list_by_owner(sender.id).await.unwrap();
    let returned: Vec<_> = sender_items
        .iter()
        .filter(|i| i.source == ItemSource::Returned)
        .collect();
    assert_eq!(returned.len(), 1);
    assert_eq!(returned[0].character_id.as_deref(), Some("dragon"));

    // Recipient is untouched: no new items, no owned-set change, no credits
    let recipient_items = inventory.list_by_owner(recipient.id).await.unwrap();
    assert_eq!(recipient_items.len(), 1, "Recipient should only hold the starter item");

    let recipient_after = users.find_by_id(recipient.id).await.unwrap().unwrap();
    assert!(!recipient_after.owned_characters.contains(&"dragon".to_string()));
    assert_eq!(recipient_after.game_credits, recipient.game_credits);

    // Terminal gifts cannot be rejected or claimed again
    assert!(matches!(
        gifts.reject(gift.id, recipient.id).await,
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        gifts.claim(gift.id, recipient.id).await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
#[serial]
async fn test_claim_by_non_recipient_looks_like_not_found() {
    let Some(pool) = try_setup().await else { return };
    let gifts = GiftRepository::new(pool.clone());

    let sender = create_user(&pool).await;
    let recipient = create_user(&pool).await;
    let outsider = create_user(&pool).await;

    let gift = gifts
        .send(&credit_gift(&sender, &recipient, 10))
        .await
        .unwrap();

    assert!(matches!(
        gifts.claim(gift.id, outsider.id).await,
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        gifts.claim(gift.id, sender.id).await,
        Err(ApiError::NotFound(_))
    ));

    // The failed attempts must not have consumed the gift
    let pending = gifts.list_pending_for_recipient(recipient.id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert!(gifts.claim(gift.id, recipient.id).await.is_ok());
}

#[tokio::test]
#[serial]
async fn test_send_to_unknown_party_fails() {
    let Some(pool) = try_setup().await else { return };
    let gifts = GiftRepository::new(pool.clone());

    let sender = create_user(&pool).await;
    let ghost = User {
        id: Uuid::new_v4(),
        ..sender.clone()
    };

    assert!(matches!(
        gifts.send(&credit_gift(&sender, &ghost, 10)).await,
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        gifts.send(&credit_gift(&ghost, &sender, 10)).await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
#[serial]
async fn test_overdraft_is_rejected_wholesale() {
    let Some(pool) = try_setup().await else { return };
    let ledger = LedgerRepository::new(pool.clone());
    let users = UserRepository::new(pool.clone());

    let user = create_user(&pool).await;

    let result = ledger
        .adjust_balance(user.id, user.game_credits + 1, CreditOperation::Subtract)
        .await;
    assert!(matches!(result, Err(ApiError::InvalidState(_))));

    let after = users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(after.game_credits, user.game_credits, "Overdraft left a partial debit");
    assert!(ledger.history(user.id).await.unwrap().is_empty());

    // A subtract within the balance still works
    let new_balance = ledger
        .adjust_balance(user.id, 100, CreditOperation::Subtract)
        .await
        .unwrap();
    assert_eq!(new_balance, user.game_credits - 100);
}

#[tokio::test]
#[serial]
async fn test_adjust_balance_unknown_user() {
    let Some(pool) = try_setup().await else { return };
    let ledger = LedgerRepository::new(pool.clone());

    let result = ledger
        .adjust_balance(Uuid::new_v4(), 10, CreditOperation::Add)
        .await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[tokio::test]
#[serial]
async fn test_purchase_and_select_character() {
    let Some(pool) = try_setup().await else { return };
    let users = UserRepository::new(pool.clone());
    let catalog = CatalogRepository::new(pool.clone());
    let inventory = InventoryRepository::new(pool.clone());

    let user = create_user(&pool).await;
    let pebble = catalog.get_by_id("pebble").await.unwrap().unwrap();

    let new_balance = users.purchase_character(user.id, &pebble).await.unwrap();
    assert_eq!(new_balance, user.game_credits - pebble.price);

    let after = users.find_by_id(user.id).await.unwrap().unwrap();
    assert!(after.owned_characters.contains(&"pebble".to_string()));

    let items = inventory.list_by_owner(user.id).await.unwrap();
    assert!(
        items
            .iter()
            .any(|i| i.source == ItemSource::Purchase
                && i.character_id.as_deref() == Some("pebble"))
    );

    // Buying the same character twice is rejected
    assert!(matches!(
        users.purchase_character(user.id, &pebble).await,
        Err(ApiError::InvalidState(_))
    ));

    // Selecting an owned character works; an unowned one fails
    let selected = users.select_character(user.id, "pebble").await.unwrap();
    assert_eq!(selected.current_character, "pebble");
    assert!(matches!(
        users.select_character(user.id, "aurora").await,
        Err(ApiError::InvalidState(_))
    ));
}

#[tokio::test]
#[serial]
async fn test_pending_gifts_are_newest_first() {
    let Some(pool) = try_setup().await else { return };
    let gifts = GiftRepository::new(pool.clone());

    let sender = create_user(&pool).await;
    let recipient = create_user(&pool).await;

    let first = gifts.send(&credit_gift(&sender, &recipient, 1)).await.unwrap();
    let second = gifts.send(&credit_gift(&sender, &recipient, 2)).await.unwrap();

    let pending = gifts.list_pending_for_recipient(recipient.id).await.unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending[0].created_at >= pending[1].created_at);
    assert_eq!(pending[1].id, first.id);
    assert_eq!(pending[0].id, second.id);

    // Settled gifts drop out of the pending view
    gifts.claim(first.id, recipient.id).await.unwrap();
    let pending = gifts.list_pending_for_recipient(recipient.id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, second.id);
}

#[tokio::test]
#[serial]
async fn test_concurrent_subtracts_cannot_overdraw() {
    let Some(pool) = try_setup().await else { return };
    let ledger = LedgerRepository::new(pool.clone());
    let users = UserRepository::new(pool.clone());

    let user = create_user(&pool).await;
    let stake = user.game_credits / 2 + 1;

    // Two racing debits that only the starting balance can cover once
    let (a, b) = tokio::join!(
        ledger.adjust_balance(user.id, stake, CreditOperation::Subtract),
        ledger.adjust_balance(user.id, stake, CreditOperation::Subtract),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1, "Exactly one racing subtract may win");

    let after = users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(after.game_credits, user.game_credits - stake);

    let history = ledger.history(user.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].balance_after, user.game_credits - stake);
}

#[tokio::test]
#[serial]
async fn test_inventory_append_allows_duplicates() {
    let Some(pool) = try_setup().await else { return };
    let inventory = InventoryRepository::new(pool.clone());

    let user = create_user(&pool).await;
    let item = NewInventoryItem {
        item_type: "character".to_string(),
        character_id: Some("ember".to_string()),
        name: "Ember".to_string(),
        icon: "🔥".to_string(),
        description: String::new(),
        price: 250,
        source: ItemSource::Gift,
    };

    let first = inventory.append(user.id, &item).await.unwrap();
    let second = inventory.append(user.id, &item).await.unwrap();

    // Identical content lands as two distinct rows
    assert_ne!(first.id, second.id);
    assert_eq!(first.owner_id, user.id);
    assert_eq!(first.source, ItemSource::Gift);
    assert!(second.acquired_at >= first.acquired_at);

    // Starter item plus the two appends, newest first
    let items = inventory.list_by_owner(user.id).await.unwrap();
    assert_eq!(items.len(), 3);
    assert!(items[0].acquired_at >= items[2].acquired_at);
    assert_eq!(items[2].source, ItemSource::Default);

    // Appending for an unknown owner fails like a missing user
    assert!(matches!(
        inventory.append(Uuid::new_v4(), &item).await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
#[serial]
async fn test_find_by_username_or_email() {
    let Some(pool) = try_setup().await else { return };
    let users = UserRepository::new(pool.clone());

    let user = create_user(&pool).await;

    let by_username = users
        .find_by_username_or_email(&user.username)
        .await
        .unwrap()
        .expect("Lookup by username failed");
    assert_eq!(by_username.id, user.id);

    let by_email = users
        .find_by_username_or_email(&user.email)
        .await
        .unwrap()
        .expect("Lookup by email failed");
    assert_eq!(by_email.id, user.id);

    let missing = users
        .find_by_username_or_email("nobody@example.com")
        .await
        .unwrap();
    assert!(missing.is_none());
}
