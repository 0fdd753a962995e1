//! Per-item offer log and the statistics derived from it.

use super::flips::{self, Lot};
use super::limit_window::LimitWindow;
use super::recipe_flip::ConsumedAmounts;
use crate::domain::{Decimal, Flip, ItemId, OfferEvent, Side, SlotIndex, TimeMs};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

/// Aggregate figures for one item over a range of its log.
///
/// `expense` and `revenue` only count the matched quantity (the smaller of
/// bought and sold) so they stay comparable while offers are still open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeStats {
    pub quantity_bought: u64,
    pub quantity_sold: u64,
    pub matched_quantity: u64,
    pub expense: i64,
    pub revenue: i64,
    /// Everything spent on buys in the range, matched or not.
    pub total_spent: i64,
    /// Everything received from sells in the range, matched or not.
    pub total_received: i64,
    pub tax_paid: i64,
}

impl TradeStats {
    pub fn profit(&self) -> i64 {
        self.revenue - self.expense
    }

    /// Profit over expense; `None` when nothing was spent.
    pub fn roi(&self) -> Option<Decimal> {
        Decimal::ratio(self.profit(), self.expense)
    }

    /// `None` when nothing has been matched yet.
    pub fn profit_per_unit(&self) -> Option<Decimal> {
        let matched = i64::try_from(self.matched_quantity).ok()?;
        Decimal::ratio(self.profit(), matched)
    }

    /// Net coins moved, ignoring whether buys and sells match up.
    pub fn cashflow(&self) -> i64 {
        self.total_received - self.total_spent
    }
}

/// Cumulative quantity last seen for the trade open in one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct OpenTrade {
    side: Side,
    total_quantity: u32,
    cumulative: u32,
}

impl OpenTrade {
    fn continued_by(&self, event: &OfferEvent) -> bool {
        self.side == event.side
            && self.total_quantity == event.total_quantity
            && event.quantity >= self.cumulative
    }
}

/// Ordered, standardized offer log of one item plus its purchase-limit window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemHistory {
    item_id: ItemId,
    offers: Vec<OfferEvent>,
    open_trades: BTreeMap<SlotIndex, OpenTrade>,
    limit_window: LimitWindow,
}

impl ItemHistory {
    pub fn new(item_id: ItemId) -> Self {
        Self {
            item_id,
            offers: Vec::new(),
            open_trades: BTreeMap::new(),
            limit_window: LimitWindow::new(),
        }
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// The full standardized log, in arrival order.
    pub fn offers(&self) -> &[OfferEvent] {
        &self.offers
    }

    /// Offers strictly after `range_start` (all offers when `None`).
    pub fn offers_since(&self, range_start: Option<TimeMs>) -> impl Iterator<Item = &OfferEvent> {
        self.offers
            .iter()
            .filter(move |offer| range_start.map_or(true, |start| offer.time > start))
    }

    pub fn latest_offer(&self) -> Option<&OfferEvent> {
        self.offers.last()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    /// Standardize a finalized event and append it to the log.
    ///
    /// The stored copy carries the quantity traded since the previous event of
    /// the same trade, so the quantities of one trade sum to its final
    /// cumulative quantity.
    pub fn append(&mut self, event: OfferEvent) -> &OfferEvent {
        let cumulative = event.quantity;
        let slot = event.slot;
        let delta = match self.open_trades.get(&slot) {
            Some(open) if open.continued_by(&event) => cumulative - open.cumulative,
            Some(open) => {
                warn!(
                    item = %self.item_id,
                    %slot,
                    previous = open.cumulative,
                    cumulative,
                    "event does not continue the open trade, treating as a new trade"
                );
                cumulative
            }
            None => cumulative,
        };

        if event.is_terminal() {
            self.open_trades.remove(&slot);
        } else {
            self.open_trades.insert(
                slot,
                OpenTrade {
                    side: event.side,
                    total_quantity: event.total_quantity,
                    cumulative,
                },
            );
        }

        let is_buy = event.is_buy();
        self.offers.push(event.with_quantity(delta));
        if is_buy {
            self.update_limit_window();
        }

        let appended = &self.offers[self.offers.len() - 1];
        debug!(
            item = %self.item_id,
            %slot,
            side = %appended.side,
            quantity = appended.quantity,
            "offer appended"
        );
        appended
    }

    /// Forget the trade open in `slot`; the next event there starts a new one.
    pub fn close_slot(&mut self, slot: SlotIndex) {
        if self.open_trades.remove(&slot).is_some() {
            debug!(item = %self.item_id, %slot, "open trade closed");
        }
    }

    /// True if a trade is being accumulated in `slot`.
    pub fn has_open_trade(&self, slot: SlotIndex) -> bool {
        self.open_trades.contains_key(&slot)
    }

    /// Count the most recent buy into the limit window.
    fn update_limit_window(&mut self) {
        if let Some(buy) = self.offers.iter().rev().find(|offer| offer.is_buy()) {
            self.limit_window.record_buy(buy.time, buy.quantity);
        }
    }

    /// Reset the limit window if it expired by `now`. Idempotent.
    pub fn validate_limit_window(&mut self, now: TimeMs) -> bool {
        self.limit_window.validate(now)
    }

    pub fn limit_window(&self) -> &LimitWindow {
        &self.limit_window
    }

    pub fn next_limit_refresh(&self) -> Option<TimeMs> {
        self.limit_window.next_refresh()
    }

    pub fn remaining_limit(&self, purchase_limit: u32, now: TimeMs) -> u32 {
        self.limit_window.remaining(purchase_limit, now)
    }

    fn lots<'a>(
        &'a self,
        range_start: Option<TimeMs>,
        consumed: &ConsumedAmounts,
        side: Side,
    ) -> Vec<Lot<'a>> {
        self.offers_since(range_start)
            .filter(|offer| offer.side == side)
            .map(|offer| Lot::new(offer, offer.quantity.saturating_sub(consumed.get(offer.id))))
            .collect()
    }

    pub fn stats(&self, range_start: Option<TimeMs>) -> TradeStats {
        self.stats_excluding(range_start, &ConsumedAmounts::default())
    }

    /// Statistics over offers after `range_start`, leaving out quantity
    /// already attributed to recipe flips.
    pub fn stats_excluding(
        &self,
        range_start: Option<TimeMs>,
        consumed: &ConsumedAmounts,
    ) -> TradeStats {
        let buys = self.lots(range_start, consumed, Side::Buy);
        let sells = self.lots(range_start, consumed, Side::Sell);
        let quantity_bought = flips::total_quantity(&buys);
        let quantity_sold = flips::total_quantity(&sells);
        let matched_quantity = quantity_bought.min(quantity_sold);

        TradeStats {
            quantity_bought,
            quantity_sold,
            matched_quantity,
            expense: flips::value_of(&buys, matched_quantity),
            revenue: flips::value_of(&sells, matched_quantity),
            total_spent: flips::value_of(&buys, quantity_bought),
            total_received: flips::value_of(&sells, quantity_sold),
            tax_paid: flips::tax_of(&sells),
        }
    }

    pub fn profit(&self, range_start: Option<TimeMs>) -> i64 {
        self.stats(range_start).profit()
    }

    pub fn expense(&self, range_start: Option<TimeMs>) -> i64 {
        self.stats(range_start).expense
    }

    pub fn revenue(&self, range_start: Option<TimeMs>) -> i64 {
        self.stats(range_start).revenue
    }

    pub fn tax_paid(&self, range_start: Option<TimeMs>) -> i64 {
        self.stats(range_start).tax_paid
    }

    pub fn roi(&self, range_start: Option<TimeMs>) -> Option<Decimal> {
        self.stats(range_start).roi()
    }

    /// `min(total bought, total sold)` after `range_start`.
    pub fn count_flip_quantity(&self, range_start: Option<TimeMs>) -> u64 {
        self.stats(range_start).matched_quantity
    }

    /// Flips after `range_start`, most recent first.
    pub fn flips(&self, range_start: Option<TimeMs>) -> Vec<Flip> {
        self.flips_excluding(range_start, &ConsumedAmounts::default())
    }

    pub fn flips_excluding(
        &self,
        range_start: Option<TimeMs>,
        consumed: &ConsumedAmounts,
    ) -> Vec<Flip> {
        let lots: Vec<Lot<'_>> = self
            .offers_since(range_start)
            .map(|offer| Lot::new(offer, offer.quantity.saturating_sub(consumed.get(offer.id))))
            .collect();
        flips::derive_flips(&lots)
    }

    /// Most recent margin-check offer on `side`.
    pub fn latest_margin_check(&self, side: Side) -> Option<&OfferEvent> {
        self.offers
            .iter()
            .rev()
            .find(|offer| offer.side == side && offer.is_margin_check())
    }

    /// Remove the given offers from the log. Returns the ids actually removed.
    pub fn remove_offers(&mut self, ids: &HashSet<Uuid>) -> Vec<Uuid> {
        let mut removed = Vec::new();
        self.offers.retain(|offer| {
            if ids.contains(&offer.id) {
                removed.push(offer.id);
                false
            } else {
                true
            }
        });
        if !removed.is_empty() {
            self.limit_window = LimitWindow::rebuild(&self.offers);
            debug!(item = %self.item_id, removed = removed.len(), "offers removed");
        }
        removed
    }

    /// Remove every offer with `from <= time <= to`. A range matching
    /// nothing is a no-op.
    pub fn invalidate_between(&mut self, from: TimeMs, to: TimeMs) -> Vec<Uuid> {
        let ids: HashSet<Uuid> = self
            .offers
            .iter()
            .filter(|offer| offer.time >= from && offer.time <= to)
            .map(|offer| offer.id)
            .collect();
        if ids.is_empty() {
            return Vec::new();
        }
        self.remove_offers(&ids)
    }
}
