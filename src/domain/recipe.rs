//! Static recipe reference data.

use crate::domain::ItemId;
use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fixed conversion of input items into output items.
///
/// Inputs are bought and outputs are sold. The parent item is either the
/// single item broken into the others (an input) or the item constructed from
/// them (an output); it owns the combination's profit for accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub inputs: BTreeMap<ItemId, u32>,
    pub outputs: BTreeMap<ItemId, u32>,
    pub parent_item_id: ItemId,
}

impl Recipe {
    /// Build and validate a recipe.
    ///
    /// # Errors
    /// Returns `InvalidRecipe` if either side is empty, any quantity is zero,
    /// an item appears on both sides, or the parent is not part of the recipe.
    pub fn new(
        inputs: BTreeMap<ItemId, u32>,
        outputs: BTreeMap<ItemId, u32>,
        parent_item_id: ItemId,
    ) -> Result<Self, LedgerError> {
        let recipe = Recipe {
            inputs,
            outputs,
            parent_item_id,
        };
        recipe.validate()?;
        Ok(recipe)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.inputs.is_empty() || self.outputs.is_empty() {
            return Err(LedgerError::InvalidRecipe(
                "recipe needs at least one input and one output".to_string(),
            ));
        }
        let mut quantities = self.inputs.iter().chain(self.outputs.iter());
        if let Some((id, _)) = quantities.find(|(_, q)| **q == 0) {
            return Err(LedgerError::InvalidRecipe(format!(
                "item {} has zero quantity",
                id
            )));
        }
        if let Some(id) = self.inputs.keys().find(|id| self.outputs.contains_key(*id)) {
            return Err(LedgerError::InvalidRecipe(format!(
                "item {} is both an input and an output",
                id
            )));
        }
        if self.quantity_needed(self.parent_item_id).is_none() {
            return Err(LedgerError::InvalidRecipe(format!(
                "parent {} is not part of the recipe",
                self.parent_item_id
            )));
        }
        Ok(())
    }

    /// Units of `item_id` one recipe instance uses or yields.
    pub fn quantity_needed(&self, item_id: ItemId) -> Option<u32> {
        self.inputs
            .get(&item_id)
            .or_else(|| self.outputs.get(&item_id))
            .copied()
    }

    pub fn is_input(&self, item_id: ItemId) -> bool {
        self.inputs.contains_key(&item_id)
    }

    /// Every item in the recipe, inputs first.
    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.inputs.keys().chain(self.outputs.keys()).copied()
    }

    /// True when the parent is bought and broken into the other items.
    pub fn parent_is_input(&self) -> bool {
        self.is_input(self.parent_item_id)
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.quantity_needed(item_id).is_some()
    }
}
