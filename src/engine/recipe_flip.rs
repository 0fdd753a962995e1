//! Recipe (combination) flips and the consumption they impose on offers.

use super::recipe_allocation::Allocation;
use crate::domain::{ItemId, PartialOffer, Recipe, TimeMs};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Offer id -> quantity of that offer attributed to recipe flips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumedAmounts(HashMap<Uuid, u32>);

impl ConsumedAmounts {
    pub fn get(&self, offer_id: Uuid) -> u32 {
        self.0.get(&offer_id).copied().unwrap_or(0)
    }

    pub fn add(&mut self, offer_id: Uuid, amount: u32) {
        let entry = self.0.entry(offer_id).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    pub fn from_flips<'a>(flips: impl IntoIterator<Item = &'a RecipeFlip>) -> Self {
        let mut consumed = Self::default();
        for partial in flips.into_iter().flat_map(RecipeFlip::partial_offers) {
            consumed.add(partial.offer_id(), partial.amount_consumed);
        }
        consumed
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// One or more completed instances of a recipe and the offer quantity they
/// consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeFlip {
    pub id: Uuid,
    pub recipe: Recipe,
    pub created_at: TimeMs,
    pub recipe_count: u32,
    /// Bought items consumed, by item.
    pub inputs: BTreeMap<ItemId, Vec<PartialOffer>>,
    /// Sold items consumed, by item.
    pub outputs: BTreeMap<ItemId, Vec<PartialOffer>>,
}

impl RecipeFlip {
    pub fn from_allocation(recipe: Recipe, allocation: Allocation, created_at: TimeMs) -> Self {
        let (inputs, outputs): (BTreeMap<_, _>, BTreeMap<_, _>) = allocation
            .consumed
            .into_iter()
            .partition(|(item_id, _)| recipe.is_input(*item_id));
        RecipeFlip {
            id: Uuid::new_v4(),
            recipe,
            created_at,
            recipe_count: allocation.recipe_count,
            inputs,
            outputs,
        }
    }

    pub fn parent_item_id(&self) -> ItemId {
        self.recipe.parent_item_id
    }

    /// True when the parent was bought and broken into the other items;
    /// false when it was constructed from them and sold.
    pub fn parent_was_bought(&self) -> bool {
        self.recipe.parent_is_input()
    }

    pub fn partial_offers(&self) -> impl Iterator<Item = &PartialOffer> {
        self.inputs.values().chain(self.outputs.values()).flatten()
    }

    /// Partial offers of the parent item.
    pub fn parent_offers(&self) -> &[PartialOffer] {
        let side = if self.parent_was_bought() {
            &self.inputs
        } else {
            &self.outputs
        };
        side.get(&self.recipe.parent_item_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Post-tax value of everything sold.
    pub fn revenue(&self) -> i64 {
        self.outputs.values().flatten().map(PartialOffer::value).sum()
    }

    /// Cost of everything bought.
    pub fn expense(&self) -> i64 {
        self.inputs.values().flatten().map(PartialOffer::value).sum()
    }

    /// Broken parent: children revenue minus parent cost. Constructed parent:
    /// parent revenue minus children cost.
    pub fn profit(&self) -> i64 {
        self.revenue() - self.expense()
    }

    /// Tax on the consumed part of each offer.
    pub fn tax_paid(&self) -> i64 {
        self.partial_offers().map(PartialOffer::tax_paid).sum()
    }

    pub fn references(&self, offer_id: Uuid) -> bool {
        self.partial_offers().any(|p| p.offer_id() == offer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OfferEvent, OfferState, Side, SlotIndex, TickDelta};

    fn offer(item: u32, side: Side, quantity: u32, price: i64, post_tax: i64) -> OfferEvent {
        OfferEvent {
            id: Uuid::new_v4(),
            side,
            item_id: ItemId::new(item),
            quantity,
            total_quantity: quantity,
            price,
            post_tax_price: post_tax,
            spent: 0,
            time: TimeMs::new(0),
            slot: SlotIndex::new(0),
            state: if side == Side::Buy { OfferState::Bought } else { OfferState::Sold },
            tick_arrived_at: 0,
            ticks_since_first_offer: TickDelta::new(9),
            trade_started_at: None,
            before_login: false,
        }
    }

    fn flip(recipe: Recipe, consumed: Vec<(ItemId, Vec<PartialOffer>)>) -> RecipeFlip {
        let allocation = Allocation {
            recipe_count: 1,
            consumed: consumed.into_iter().collect(),
        };
        RecipeFlip::from_allocation(recipe, allocation, TimeMs::new(10))
    }

    #[test]
    fn test_broken_parent_profit() {
        // Buy a set (parent), sell its two pieces.
        let recipe = Recipe::new(
            [(ItemId::new(100), 1)].into_iter().collect(),
            [(ItemId::new(1), 1), (ItemId::new(2), 1)].into_iter().collect(),
            ItemId::new(100),
        )
        .unwrap();
        let rf = flip(
            recipe,
            vec![
                (
                    ItemId::new(100),
                    vec![PartialOffer::new(offer(100, Side::Buy, 1, 1_000, 1_000), 1)],
                ),
                (ItemId::new(1), vec![PartialOffer::new(offer(1, Side::Sell, 1, 600, 588), 1)]),
                (ItemId::new(2), vec![PartialOffer::new(offer(2, Side::Sell, 1, 500, 490), 1)]),
            ],
        );
        assert!(rf.parent_was_bought());
        assert_eq!(rf.revenue(), 1_078);
        assert_eq!(rf.expense(), 1_000);
        assert_eq!(rf.profit(), 78);
        assert_eq!(rf.tax_paid(), 22);
        assert_eq!(rf.parent_offers().len(), 1);
    }

    #[test]
    fn test_constructed_parent_profit_and_proportional_tax() {
        let recipe = Recipe::new(
            [(ItemId::new(1), 2)].into_iter().collect(),
            [(ItemId::new(100), 1)].into_iter().collect(),
            ItemId::new(100),
        )
        .unwrap();
        let sell = offer(100, Side::Sell, 4, 1_000, 980);
        let rf = flip(
            recipe,
            vec![
                (ItemId::new(1), vec![PartialOffer::new(offer(1, Side::Buy, 5, 300, 300), 2)]),
                (ItemId::new(100), vec![PartialOffer::new(sell.clone(), 1)]),
            ],
        );
        assert!(!rf.parent_was_bought());
        assert_eq!(rf.profit(), 980 - 600);
        assert_eq!(rf.tax_paid(), 20);
        assert!(rf.references(sell.id));
    }

    #[test]
    fn test_consumed_amounts_sum_across_flips() {
        let recipe = Recipe::new(
            [(ItemId::new(1), 1)].into_iter().collect(),
            [(ItemId::new(2), 1)].into_iter().collect(),
            ItemId::new(2),
        )
        .unwrap();
        let buy = offer(1, Side::Buy, 10, 100, 100);
        let partial = |quantity| {
            vec![(ItemId::new(1), vec![PartialOffer::new(buy.clone(), quantity)])]
        };
        let a = flip(recipe.clone(), partial(3));
        let b = flip(recipe, partial(4));
        let consumed = ConsumedAmounts::from_flips([&a, &b]);
        assert_eq!(consumed.get(buy.id), 7);
        assert_eq!(consumed.get(Uuid::new_v4()), 0);
        assert_eq!(consumed.len(), 1);
    }
}
