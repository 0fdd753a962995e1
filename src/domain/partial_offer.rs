//! Partial consumption of an offer by a recipe flip.

use crate::domain::{ItemId, OfferEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The part of one standardized offer attributed to a single consumer.
///
/// Several partial offers may reference the same event as long as their
/// consumed amounts together stay within the event's quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialOffer {
    pub offer: OfferEvent,
    pub amount_consumed: u32,
}

impl PartialOffer {
    pub fn new(offer: OfferEvent, amount_consumed: u32) -> Self {
        Self {
            offer,
            amount_consumed,
        }
    }

    pub fn offer_id(&self) -> Uuid {
        self.offer.id
    }

    pub fn item_id(&self) -> ItemId {
        self.offer.item_id
    }

    /// Quantity of the offer not covered by `amount_consumed`.
    pub fn remaining(&self) -> u32 {
        self.offer.quantity.saturating_sub(self.amount_consumed)
    }

    /// Post-tax value of the consumed amount.
    pub fn value(&self) -> i64 {
        self.offer.value_of(self.amount_consumed)
    }

    /// Tax paid on the consumed amount only.
    pub fn tax_paid(&self) -> i64 {
        self.offer.tax_on(self.amount_consumed)
    }
}
