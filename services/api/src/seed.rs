//! Default catalog data seeded at startup

use crate::error::ApiResult;
use crate::models::Character;
use crate::repositories::CatalogRepository;

/// Character every new user starts with
pub const STARTER_CHARACTER: &str = "sprout";

/// The built-in character catalog
pub fn default_catalog() -> Vec<Character> {
    let entries = [
        ("sprout", "Sprout", "🌱", "A cheerful seedling, free with every account", 0, "common", "starter"),
        ("pebble", "Pebble", "🪨", "Small, round, dependable", 100, "common", "forest"),
        ("finn", "Finn", "🐟", "Always swimming against the current", 150, "common", "ocean"),
        ("ember", "Ember", "🔥", "Warm company on a cold night", 250, "uncommon", "volcano"),
        ("willow", "Willow", "🌳", "Old soul of the grove", 300, "uncommon", "forest"),
        ("dragon", "Dragon", "🐉", "Hoards credits, shares warmth", 500, "rare", "volcano"),
        ("aurora", "Aurora", "✨", "Only appears on clear nights", 800, "legendary", "sky"),
    ];

    entries
        .into_iter()
        .map(|(id, name, icon, description, price, rarity, category)| Character {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            description: description.to_string(),
            price,
            rarity: rarity.to_string(),
            category: category.to_string(),
        })
        .collect()
}

/// Seed the catalog, inserting only entries whose id is absent
pub async fn seed_catalog(catalog: &CatalogRepository) -> ApiResult<()> {
    for character in default_catalog() {
        catalog.upsert_if_absent(&character).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_contains_starter() {
        let catalog = default_catalog();
        let starter = catalog
            .iter()
            .find(|c| c.id == STARTER_CHARACTER)
            .expect("Starter character missing from default catalog");
        assert_eq!(starter.price, 0);
    }

    #[test]
    fn test_default_catalog_ids_unique() {
        let catalog = default_catalog();
        let mut ids: Vec<_> = catalog.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
    }
}
