use crate::domain::{ItemId, SlotIndex};
use thiserror::Error;

/// Errors raised for caller misuse. Malformed or out-of-order offer data never
/// produces an error; the pipeline absorbs it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Slot {slot} out of range: ledger tracks {slot_count} slots")]
    SlotOutOfRange { slot: SlotIndex, slot_count: usize },
    #[error("Invalid recipe: {0}")]
    InvalidRecipe(String),
    #[error("No offer pool supplied for recipe item {0}")]
    RecipeItemMissing(ItemId),
    #[error("Recipe with parent {0} cannot be completed from the available offers")]
    NothingToAllocate(ItemId),
    #[error("Unknown item: {0}")]
    UnknownItem(ItemId),
}
