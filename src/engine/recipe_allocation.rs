//! Allocation of offer quantity to recipe instances.

use crate::domain::{ItemId, PartialOffer, Recipe, Side};
use crate::error::LedgerError;
use std::collections::BTreeMap;
use tracing::debug;

/// Pool of not-yet-fully-consumed offers per item. Each entry's
/// `amount_consumed` is what earlier recipe flips already took from it.
pub type OfferPools = BTreeMap<ItemId, Vec<PartialOffer>>;

/// Result of allocating offers to `recipe_count` recipe instances. Each
/// partial offer's `amount_consumed` is the quantity newly taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub recipe_count: u32,
    pub consumed: BTreeMap<ItemId, Vec<PartialOffer>>,
}

/// Computes how many recipe instances the pools can complete and consumes
/// quantity from them.
pub struct RecipeAllocationEngine;

impl RecipeAllocationEngine {
    /// Side an item's offers must be on to count toward `recipe`.
    fn required_side(recipe: &Recipe, item_id: ItemId) -> Side {
        if recipe.is_input(item_id) {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    fn pool<'a>(
        recipe: &Recipe,
        pools: &'a OfferPools,
        item_id: ItemId,
    ) -> Result<impl Iterator<Item = &'a PartialOffer>, LedgerError> {
        let side = Self::required_side(recipe, item_id);
        let pool = pools
            .get(&item_id)
            .ok_or(LedgerError::RecipeItemMissing(item_id))?;
        Ok(pool.iter().filter(move |p| p.offer.side == side))
    }

    /// `floor(unconsumed quantity / quantity needed)` for every recipe item.
    ///
    /// # Errors
    /// Returns `RecipeItemMissing` if a recipe item has no pool entry.
    pub fn max_recipes_per_item(
        recipe: &Recipe,
        pools: &OfferPools,
    ) -> Result<BTreeMap<ItemId, u32>, LedgerError> {
        recipe
            .item_ids()
            .map(|item_id| {
                let needed = u64::from(recipe.quantity_needed(item_id).unwrap_or(1).max(1));
                let available: u64 = Self::pool(recipe, pools, item_id)?
                    .map(|p| u64::from(p.remaining()))
                    .sum();
                let max = u32::try_from(available / needed).unwrap_or(u32::MAX);
                Ok((item_id, max))
            })
            .collect()
    }

    /// Recipes completable overall, bounded by the scarcest item.
    pub fn max_recipes(recipe: &Recipe, pools: &OfferPools) -> Result<u32, LedgerError> {
        Ok(Self::max_recipes_per_item(recipe, pools)?
            .values()
            .copied()
            .min()
            .unwrap_or(0))
    }

    /// Units of each item consumed by `count` recipe instances.
    pub fn target_consumption(recipe: &Recipe, count: u32) -> BTreeMap<ItemId, u32> {
        recipe
            .item_ids()
            .map(|item_id| {
                let needed = recipe.quantity_needed(item_id).unwrap_or(0);
                (item_id, needed.saturating_mul(count))
            })
            .collect()
    }

    /// Consume offers for `requested` recipe instances (the maximum when
    /// `None`, clamped to it otherwise), oldest offers first.
    pub fn allocate(
        recipe: &Recipe,
        pools: &OfferPools,
        requested: Option<u32>,
    ) -> Result<Allocation, LedgerError> {
        recipe.validate()?;
        let max = Self::max_recipes(recipe, pools)?;
        let recipe_count = requested.map_or(max, |r| r.min(max));
        let targets = Self::target_consumption(recipe, recipe_count);

        let mut consumed = BTreeMap::new();
        for (item_id, target) in targets {
            let mut left = target;
            let mut taken = Vec::new();
            for partial in Self::pool(recipe, pools, item_id)? {
                if left == 0 {
                    break;
                }
                let take = partial.remaining().min(left);
                if take == 0 {
                    continue;
                }
                taken.push(PartialOffer::new(partial.offer.clone(), take));
                left -= take;
            }
            consumed.insert(item_id, taken);
        }

        debug!(
            parent = %recipe.parent_item_id,
            max,
            recipe_count,
            "recipe offers allocated"
        );
        Ok(Allocation {
            recipe_count,
            consumed,
        })
    }
}
