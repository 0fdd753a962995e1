//! Reference data the ledger needs but does not own: item names, purchase
//! limits and recipes.
//!
//! Fetching this data (wiki lookups, bundled tables) is the caller's concern;
//! the ledger only sees these traits.

use crate::domain::{ItemId, Recipe};
use std::collections::HashMap;
use std::fmt;

/// Static facts about one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMetadata {
    pub name: String,
    /// Units that can be bought per limit window.
    pub purchase_limit: u32,
}

/// Source of item names and purchase limits.
pub trait ItemMetadataSource: Send + Sync + fmt::Debug {
    /// Metadata for `item_id`, or `None` if the item is unknown.
    fn item_metadata(&self, item_id: ItemId) -> Option<ItemMetadata>;
}

/// Source of known recipes.
pub trait RecipeSource: Send + Sync + fmt::Debug {
    fn recipes(&self) -> Vec<Recipe>;

    /// Recipes in which `item_id` appears on either side.
    fn recipes_for(&self, item_id: ItemId) -> Vec<Recipe> {
        self.recipes()
            .into_iter()
            .filter(|recipe| recipe.contains(item_id))
            .collect()
    }
}

/// In-memory reference data, built up front.
#[derive(Debug, Clone, Default)]
pub struct StaticReferenceData {
    items: HashMap<ItemId, ItemMetadata>,
    recipes: Vec<Recipe>,
}

impl StaticReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(
        mut self,
        item_id: ItemId,
        name: impl Into<String>,
        purchase_limit: u32,
    ) -> Self {
        self.items.insert(
            item_id,
            ItemMetadata {
                name: name.into(),
                purchase_limit,
            },
        );
        self
    }

    pub fn with_recipe(mut self, recipe: Recipe) -> Self {
        self.recipes.push(recipe);
        self
    }

    pub fn with_recipes(mut self, recipes: Vec<Recipe>) -> Self {
        self.recipes.extend(recipes);
        self
    }
}

impl ItemMetadataSource for StaticReferenceData {
    fn item_metadata(&self, item_id: ItemId) -> Option<ItemMetadata> {
        self.items.get(&item_id).cloned()
    }
}

impl RecipeSource for StaticReferenceData {
    fn recipes(&self) -> Vec<Recipe> {
        self.recipes.clone()
    }
}
