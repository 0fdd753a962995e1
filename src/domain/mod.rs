//! Domain types for the trade ledger.
//!
//! This module provides:
//! - Domain primitives: TimeMs, ItemId, SlotIndex, Side
//! - Raw offer notifications and normalized, immutable offer events
//! - Tax rules, derived flips, partial offers and recipes

pub mod decimal;
pub mod flip;
pub mod offer;
pub mod partial_offer;
pub mod primitives;
pub mod recipe;
pub mod tax;
pub mod tick;

pub use decimal::Decimal;
pub use flip::Flip;
pub use offer::{is_margin_check, OfferEvent, OfferState, RawOfferUpdate, MARGIN_CHECK_MAX_TICKS};
pub use partial_offer::PartialOffer;
pub use primitives::{ItemId, Side, SlotIndex, TimeMs};
pub use recipe::Recipe;
pub use tax::{TaxPeriod, TaxSchedule};
pub use tick::TickDelta;
