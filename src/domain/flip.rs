//! Derived buy/sell pairing.

use crate::domain::TimeMs;
use serde::{Deserialize, Serialize};

/// One matched buy and sell of `quantity` units.
///
/// Flips are derived from an item's offer log on demand and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flip {
    /// Unit buy price.
    pub buy_price: i64,
    /// Unit sell price, pre-tax.
    pub sell_price: i64,
    /// Unit sell price after tax.
    pub post_tax_sell_price: i64,
    pub quantity: u32,
    /// Time the closing offer arrived.
    pub time: TimeMs,
    pub margin_check: bool,
}

impl Flip {
    pub fn profit(&self) -> i64 {
        (self.post_tax_sell_price - self.buy_price) * i64::from(self.quantity)
    }

    pub fn tax_paid(&self) -> i64 {
        (self.sell_price - self.post_tax_sell_price) * i64::from(self.quantity)
    }
}
