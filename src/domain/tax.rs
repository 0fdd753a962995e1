//! Sales tax applied to sell offers.

use crate::domain::{Decimal, ItemId, Side, TimeMs};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 2021-12-09T00:00:00Z, when the 1% sales tax took effect.
const TAX_INTRODUCED_MS: i64 = 1_639_008_000_000;
/// 2025-05-29T00:00:00Z, when the rate rose to 2%.
const TAX_RAISED_MS: i64 = 1_748_476_800_000;

const DEFAULT_CAP_PER_UNIT: i64 = 5_000_000;
const DEFAULT_MIN_TAXED_PRICE: i64 = 50;

/// Items that are never taxed (bonds and the basic skilling tools).
const DEFAULT_EXEMPT_ITEMS: [u32; 14] = [
    13190, 2347, 1755, 1733, 233, 952, 5341, 5343, 8794, 1785, 1735, 5329, 5325, 5331,
];

/// A tax rate that applies from `effective_from` until the next period starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPeriod {
    pub effective_from: TimeMs,
    pub rate: Decimal,
}

/// Static tax rules: rate history, per-unit cap, minimum taxed price and
/// exempt items.
///
/// Tax only ever applies to the sell side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSchedule {
    periods: Vec<TaxPeriod>,
    cap_per_unit: i64,
    min_taxed_price: i64,
    exempt_items: BTreeSet<ItemId>,
}

impl TaxSchedule {
    /// Build a schedule from rate periods in any order.
    pub fn new(mut periods: Vec<TaxPeriod>, cap_per_unit: i64, min_taxed_price: i64) -> Self {
        periods.sort_by_key(|p| p.effective_from);
        Self {
            periods,
            cap_per_unit,
            min_taxed_price,
            exempt_items: BTreeSet::new(),
        }
    }

    /// A schedule that never taxes anything.
    pub fn untaxed() -> Self {
        Self::new(Vec::new(), 0, 0)
    }

    pub fn with_exempt_item(mut self, item_id: ItemId) -> Self {
        self.exempt_items.insert(item_id);
        self
    }

    pub fn is_exempt(&self, item_id: ItemId) -> bool {
        self.exempt_items.contains(&item_id)
    }

    /// Rate in force at `time`, if any period has started.
    pub fn rate_at(&self, time: TimeMs) -> Option<Decimal> {
        self.periods
            .iter()
            .rev()
            .find(|p| p.effective_from <= time)
            .map(|p| p.rate)
    }

    /// Tax charged per unit sold at `price`.
    pub fn tax_per_unit(&self, item_id: ItemId, price: i64, time: TimeMs) -> i64 {
        if price < self.min_taxed_price || self.is_exempt(item_id) {
            return 0;
        }
        let Some(rate) = self.rate_at(time) else {
            return 0;
        };
        rate.floor_mul(price)
            .unwrap_or(self.cap_per_unit)
            .clamp(0, self.cap_per_unit)
    }

    /// Price actually received per unit. Buys are never taxed.
    pub fn post_tax_price(&self, side: Side, item_id: ItemId, price: i64, time: TimeMs) -> i64 {
        match side {
            Side::Buy => price,
            Side::Sell => price - self.tax_per_unit(item_id, price, time),
        }
    }
}

impl Default for TaxSchedule {
    fn default() -> Self {
        let schedule = Self::new(
            vec![
                TaxPeriod {
                    effective_from: TimeMs::new(TAX_INTRODUCED_MS),
                    rate: Decimal::from_parts(1, 2),
                },
                TaxPeriod {
                    effective_from: TimeMs::new(TAX_RAISED_MS),
                    rate: Decimal::from_parts(2, 2),
                },
            ],
            DEFAULT_CAP_PER_UNIT,
            DEFAULT_MIN_TAXED_PRICE,
        );
        DEFAULT_EXEMPT_ITEMS
            .iter()
            .fold(schedule, |s, id| s.with_exempt_item(ItemId::new(*id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BEFORE_TAX: TimeMs = TimeMs(TAX_INTRODUCED_MS - 1);
    const ONE_PERCENT: TimeMs = TimeMs(TAX_INTRODUCED_MS + 1);
    const TWO_PERCENT: TimeMs = TimeMs(TAX_RAISED_MS);

    #[test]
    fn test_buys_are_never_taxed() {
        let tax = TaxSchedule::default();
        for time in [BEFORE_TAX, ONE_PERCENT, TWO_PERCENT] {
            for item in [ItemId::new(4151), ItemId::new(13190)] {
                assert_eq!(tax.post_tax_price(Side::Buy, item, 1_000_000, time), 1_000_000);
            }
        }
    }

    #[test]
    fn test_rate_change_boundary() {
        let tax = TaxSchedule::default();
        let whip = ItemId::new(4151);
        assert_eq!(tax.post_tax_price(Side::Sell, whip, 1_000, BEFORE_TAX), 1_000);
        assert_eq!(tax.post_tax_price(Side::Sell, whip, 1_000, ONE_PERCENT), 990);
        assert_eq!(tax.post_tax_price(Side::Sell, whip, 1_000, TWO_PERCENT), 980);
    }

    #[test]
    fn test_tax_floors_and_caps() {
        let tax = TaxSchedule::default();
        let whip = ItemId::new(4151);
        assert_eq!(tax.tax_per_unit(whip, 149, TWO_PERCENT), 2);
        assert_eq!(tax.tax_per_unit(whip, 49, TWO_PERCENT), 0);
        assert_eq!(tax.tax_per_unit(whip, 2_000_000_000, TWO_PERCENT), 5_000_000);
    }

    #[test]
    fn test_exempt_items() {
        let tax = TaxSchedule::default();
        let bond = ItemId::new(13190);
        assert!(tax.is_exempt(bond));
        assert_eq!(tax.post_tax_price(Side::Sell, bond, 8_000_000, TWO_PERCENT), 8_000_000);
    }

    #[test]
    fn test_untaxed_schedule() {
        let tax = TaxSchedule::untaxed();
        assert_eq!(tax.rate_at(TWO_PERCENT), None);
        assert_eq!(
            tax.post_tax_price(Side::Sell, ItemId::new(1), 5_000, TWO_PERCENT),
            5_000
        );
    }
}
