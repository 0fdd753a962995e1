//! Pure, synchronous engines for offer normalization and trade accounting.
//!
//! Data flows one way: raw notification -> `SlotEventFilter` ->
//! `OfferClassifier` -> `ItemHistory`. Recipe accounting reads item histories
//! through `RecipeAllocationEngine`.

pub mod classifier;
pub mod flips;
pub mod history;
pub mod limit_window;
pub mod recipe_allocation;
pub mod recipe_flip;
pub mod slot_filter;

pub use classifier::{AbsorbReason, Classification, OfferClassifier};
pub use flips::{ConsolidatedOffer, Lot};
pub use history::{ItemHistory, TradeStats};
pub use limit_window::{LimitWindow, LIMIT_WINDOW_MS};
pub use recipe_allocation::{Allocation, OfferPools, RecipeAllocationEngine};
pub use recipe_flip::{ConsumedAmounts, RecipeFlip};
pub use slot_filter::SlotEventFilter;
