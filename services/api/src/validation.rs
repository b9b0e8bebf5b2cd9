//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{GiftItemData, ItemType};

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() < 3 {
        return Err("Username must be at least 3 characters long".to_string());
    }

    if username.len() > 32 {
        return Err("Username must be at most 32 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Validate a gift item snapshot against its declared item type.
///
/// A snapshot must carry a name, and the value it represents must be
/// positive: a credit amount for credit gifts, a catalog id for character
/// gifts.
pub fn validate_gift_item(item_type: ItemType, item: &GiftItemData) -> Result<(), String> {
    if item.name.trim().is_empty() {
        return Err("Gift item name is required".to_string());
    }

    match item_type {
        ItemType::Credits => match item.amount {
            Some(amount) if amount > 0 => Ok(()),
            Some(_) => Err("Credit gift amount must be positive".to_string()),
            None => Err("Credit gift requires an amount".to_string()),
        },
        ItemType::Character => {
            match &item.character_id {
                Some(id) if !id.trim().is_empty() => {}
                _ => return Err("Character gift requires a character id".to_string()),
            }
            if item.price < 0 {
                return Err("Gift item price cannot be negative".to_string());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(name: &str) -> GiftItemData {
        GiftItemData {
            name: name.to_string(),
            icon: String::new(),
            description: String::new(),
            price: 0,
            amount: None,
            character_id: None,
        }
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("player_one").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("no spaces").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("player@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("longenough1").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_credit_gift_requires_positive_amount() {
        let mut item = snapshot("50 credits");
        assert!(validate_gift_item(ItemType::Credits, &item).is_err());

        item.amount = Some(0);
        assert!(validate_gift_item(ItemType::Credits, &item).is_err());

        item.amount = Some(50);
        assert!(validate_gift_item(ItemType::Credits, &item).is_ok());
    }

    #[test]
    fn test_character_gift_requires_character_id() {
        let mut item = snapshot("Dragon");
        assert!(validate_gift_item(ItemType::Character, &item).is_err());

        item.character_id = Some("dragon".to_string());
        assert!(validate_gift_item(ItemType::Character, &item).is_ok());
    }

    #[test]
    fn test_empty_snapshot_rejected() {
        let item = snapshot("  ");
        assert!(validate_gift_item(ItemType::Character, &item).is_err());
    }
}
