//! Valuation and FIFO flip matching over slices of an item's offer log.
//!
//! Every function here works on [`Lot`]s: an offer paired with the quantity
//! of it still available to the caller (the full standardized quantity, or
//! less when part of it was consumed by a recipe flip).

use crate::domain::{Flip, OfferEvent, SlotIndex, TimeMs};
use std::collections::HashMap;

/// An offer and the quantity of it under consideration.
#[derive(Debug, Clone, Copy)]
pub struct Lot<'a> {
    pub offer: &'a OfferEvent,
    pub quantity: u32,
}

impl<'a> Lot<'a> {
    pub fn new(offer: &'a OfferEvent, quantity: u32) -> Self {
        Self { offer, quantity }
    }

    pub fn whole(offer: &'a OfferEvent) -> Self {
        Self::new(offer, offer.quantity)
    }
}

/// Sum of quantities.
pub fn total_quantity(lots: &[Lot<'_>]) -> u64 {
    lots.iter().map(|lot| u64::from(lot.quantity)).sum()
}

/// Post-tax value of the first `limit` units, walking lots in arrival order.
///
/// The lot that crosses `limit` contributes only the units that fit.
pub fn value_of(lots: &[Lot<'_>], limit: u64) -> i64 {
    let mut counted: u64 = 0;
    let mut value: i64 = 0;
    for lot in lots {
        let quantity = u64::from(lot.quantity);
        if counted + quantity > limit {
            let rest = limit - counted;
            value += rest as i64 * lot.offer.post_tax_price;
            break;
        }
        counted += quantity;
        value += quantity as i64 * lot.offer.post_tax_price;
    }
    value
}

/// Tax paid on every lot.
pub fn tax_of(lots: &[Lot<'_>]) -> i64 {
    lots.iter().map(|lot| lot.offer.tax_on(lot.quantity)).sum()
}

/// Several events of one trade merged into a single offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidatedOffer {
    pub slot: SlotIndex,
    pub price: i64,
    pub post_tax_price: i64,
    pub quantity: u32,
    /// Time of the latest merged event.
    pub time: TimeMs,
}

/// Merge consecutive same-slot, same-price events until a terminal event
/// closes the group. Output keeps the order in which groups opened; empty
/// groups are dropped.
pub fn consolidate(lots: &[Lot<'_>]) -> Vec<ConsolidatedOffer> {
    let mut merged: Vec<ConsolidatedOffer> = Vec::new();
    let mut open: HashMap<SlotIndex, usize> = HashMap::new();

    for lot in lots {
        let offer = lot.offer;
        match open.get(&offer.slot) {
            Some(&idx) if merged[idx].price == offer.price => {
                let group = &mut merged[idx];
                group.quantity = group.quantity.saturating_add(lot.quantity);
                group.time = offer.time;
            }
            _ => {
                merged.push(ConsolidatedOffer {
                    slot: offer.slot,
                    price: offer.price,
                    post_tax_price: offer.post_tax_price,
                    quantity: lot.quantity,
                    time: offer.time,
                });
                open.insert(offer.slot, merged.len() - 1);
            }
        }
        if offer.is_terminal() {
            open.remove(&offer.slot);
        }
    }

    merged.retain(|group| group.quantity > 0);
    merged
}

/// Greedy FIFO matching of consolidated buys against consolidated sells.
///
/// Each step fully consumes whichever side has less remaining. This is not a
/// profit-optimal matching.
pub fn match_fifo(buys: &[ConsolidatedOffer], sells: &[ConsolidatedOffer]) -> Vec<Flip> {
    let mut flips = Vec::new();
    let mut buy_left: Vec<u32> = buys.iter().map(|b| b.quantity).collect();
    let mut sell_left: Vec<u32> = sells.iter().map(|s| s.quantity).collect();
    let (mut b, mut s) = (0, 0);

    while b < buys.len() && s < sells.len() {
        let quantity = buy_left[b].min(sell_left[s]);
        flips.push(Flip {
            buy_price: buys[b].price,
            sell_price: sells[s].price,
            post_tax_sell_price: sells[s].post_tax_price,
            quantity,
            time: sells[s].time,
            margin_check: false,
        });
        buy_left[b] -= quantity;
        sell_left[s] -= quantity;
        if buy_left[b] == 0 {
            b += 1;
        }
        if sell_left[s] == 0 {
            s += 1;
        }
    }

    flips
}

/// Pair the i-th margin-check buy with the i-th margin-check sell.
pub fn pair_margin_checks(buys: &[Lot<'_>], sells: &[Lot<'_>]) -> Vec<Flip> {
    buys.iter()
        .zip(sells.iter())
        .map(|(buy, sell)| Flip {
            buy_price: buy.offer.price,
            sell_price: sell.offer.price,
            post_tax_sell_price: sell.offer.post_tax_price,
            quantity: 1,
            time: sell.offer.time,
            margin_check: true,
        })
        .collect()
}

/// Split lots into margin checks and regular trades per side, match each, and
/// return all flips most recent first.
pub fn derive_flips(lots: &[Lot<'_>]) -> Vec<Flip> {
    let mut margin_buys = Vec::new();
    let mut margin_sells = Vec::new();
    let mut buys = Vec::new();
    let mut sells = Vec::new();

    // Zero-quantity regular lots still go to consolidation: a terminal event
    // closes its slot's group even when nothing is left of it.
    for lot in lots {
        let bucket = match (lot.offer.is_margin_check(), lot.offer.is_buy()) {
            (true, _) if lot.quantity == 0 => continue,
            (true, true) => &mut margin_buys,
            (true, false) => &mut margin_sells,
            (false, true) => &mut buys,
            (false, false) => &mut sells,
        };
        bucket.push(*lot);
    }

    let mut flips = pair_margin_checks(&margin_buys, &margin_sells);
    flips.extend(match_fifo(&consolidate(&buys), &consolidate(&sells)));
    flips.sort_by(|a, b| b.time.cmp(&a.time));
    flips
}
