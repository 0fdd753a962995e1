//! Raw offer notifications and the normalized `OfferEvent`.

use crate::domain::{ItemId, Side, SlotIndex, TaxSchedule, TickDelta, TimeMs};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed 1-unit trade whose first and last events were at most this
/// many ticks apart is a margin check.
pub const MARGIN_CHECK_MAX_TICKS: u32 = 2;

/// Coarse state of a trading slot as reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferState {
    Empty,
    Buying,
    Bought,
    Selling,
    Sold,
    CancelledBuy,
    CancelledSell,
}

impl OfferState {
    /// Bought, sold, or cancelled: nothing further happens in this trade.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OfferState::Bought
                | OfferState::Sold
                | OfferState::CancelledBuy
                | OfferState::CancelledSell
        )
    }

    /// Filled completely.
    pub fn is_completed(&self) -> bool {
        matches!(self, OfferState::Bought | OfferState::Sold)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OfferState::CancelledBuy | OfferState::CancelledSell)
    }

    pub fn is_open(&self) -> bool {
        matches!(self, OfferState::Buying | OfferState::Selling)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, OfferState::Empty)
    }

    /// Direction implied by the state, `None` for an empty slot.
    pub fn side(&self) -> Option<Side> {
        match self {
            OfferState::Buying | OfferState::Bought | OfferState::CancelledBuy => Some(Side::Buy),
            OfferState::Selling | OfferState::Sold | OfferState::CancelledSell => Some(Side::Sell),
            OfferState::Empty => None,
        }
    }
}

/// One raw "offer changed" notification from the game client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOfferUpdate {
    pub slot: SlotIndex,
    pub item_id: ItemId,
    pub side: Side,
    /// Quantity filled so far in this trade.
    pub quantity_traded: u32,
    /// Quantity the offer was placed for.
    pub total_quantity: u32,
    /// Unit price, pre-tax.
    pub price: i64,
    /// Coins moved so far in this trade.
    pub spent: i64,
    pub state: OfferState,
    /// Client tick counter at arrival. Small and wrapping.
    pub tick: u32,
    /// Wall-clock arrival time.
    pub time: TimeMs,
}

impl RawOfferUpdate {
    pub fn is_empty_slot(&self) -> bool {
        self.state.is_empty()
    }

    /// Field-for-field comparison of everything the client reports about the
    /// offer, ignoring arrival tick and time.
    pub fn same_content(&self, other: &RawOfferUpdate) -> bool {
        self.item_id == other.item_id
            && self.side == other.side
            && self.quantity_traded == other.quantity_traded
            && self.total_quantity == other.total_quantity
            && self.price == other.price
            && self.spent == other.spent
            && self.state == other.state
    }
}

/// The pure margin-check heuristic.
///
/// A trade is a margin check when it completed (not cancelled), was placed for
/// exactly one unit, and completed within [`MARGIN_CHECK_MAX_TICKS`] of its
/// first event.
pub fn is_margin_check(state: OfferState, total_quantity: u32, ticks: TickDelta) -> bool {
    state.is_completed() && total_quantity == 1 && ticks.within(MARGIN_CHECK_MAX_TICKS)
}

/// A normalized observation of a trade.
///
/// Created once by the classifier. `quantity` is cumulative for the trade when
/// emitted; the item history stores a standardized copy whose `quantity` is the
/// delta since the previous event of the same trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferEvent {
    pub id: Uuid,
    pub side: Side,
    pub item_id: ItemId,
    pub quantity: u32,
    pub total_quantity: u32,
    /// Unit price, pre-tax.
    pub price: i64,
    /// Unit price actually received (equal to `price` for buys).
    pub post_tax_price: i64,
    pub spent: i64,
    pub time: TimeMs,
    pub slot: SlotIndex,
    pub state: OfferState,
    pub tick_arrived_at: u32,
    pub ticks_since_first_offer: TickDelta,
    /// When the trade was placed; `None` if it was placed before login.
    pub trade_started_at: Option<TimeMs>,
    /// Arrived on the login tick, so its timing is unreliable.
    pub before_login: bool,
}

impl OfferEvent {
    /// Build an event from a raw update, pricing tax once up front.
    pub fn from_update(
        update: &RawOfferUpdate,
        ticks_since_first_offer: TickDelta,
        trade_started_at: Option<TimeMs>,
        before_login: bool,
        tax: &TaxSchedule,
    ) -> Self {
        OfferEvent {
            id: Uuid::new_v4(),
            side: update.side,
            item_id: update.item_id,
            quantity: update.quantity_traded,
            total_quantity: update.total_quantity,
            price: update.price,
            post_tax_price: tax.post_tax_price(
                update.side,
                update.item_id,
                update.price,
                update.time,
            ),
            spent: update.spent,
            time: update.time,
            slot: update.slot,
            state: update.state,
            tick_arrived_at: update.tick,
            ticks_since_first_offer,
            trade_started_at,
            before_login,
        }
    }

    /// Copy of this event carrying `quantity` instead.
    pub fn with_quantity(&self, quantity: u32) -> Self {
        OfferEvent {
            quantity,
            ..self.clone()
        }
    }

    pub fn is_buy(&self) -> bool {
        self.side.is_buy()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_margin_check(&self) -> bool {
        is_margin_check(self.state, self.total_quantity, self.ticks_since_first_offer)
    }

    /// True for the open-state event that repeats the final quantity right
    /// before the terminal event arrives.
    pub fn is_redundant_before_completion(&self) -> bool {
        self.state.is_open() && self.quantity == self.total_quantity
    }

    /// Tax paid per unit.
    pub fn tax_per_unit(&self) -> i64 {
        self.price - self.post_tax_price
    }

    /// Post-tax value of `quantity` units of this event.
    pub fn value_of(&self, quantity: u32) -> i64 {
        i64::from(quantity) * self.post_tax_price
    }

    /// Tax paid on `quantity` units of this event.
    pub fn tax_on(&self, quantity: u32) -> i64 {
        i64::from(quantity) * self.tax_per_unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(state: OfferState, side: Side, traded: u32, total: u32) -> RawOfferUpdate {
        RawOfferUpdate {
            slot: SlotIndex::new(0),
            item_id: ItemId::new(4151),
            side,
            quantity_traded: traded,
            total_quantity: total,
            price: 2_000_000,
            spent: i64::from(traded) * 2_000_000,
            state,
            tick: 10,
            time: TimeMs::new(1_750_000_000_000),
        }
    }

    #[test]
    fn test_state_classes() {
        assert!(OfferState::Bought.is_terminal());
        assert!(OfferState::CancelledSell.is_terminal());
        assert!(!OfferState::Buying.is_terminal());
        assert!(!OfferState::Empty.is_terminal());
        assert!(OfferState::Sold.is_completed());
        assert!(!OfferState::CancelledBuy.is_completed());
        assert_eq!(OfferState::CancelledBuy.side(), Some(Side::Buy));
        assert_eq!(OfferState::Empty.side(), None);
    }

    #[test]
    fn test_same_content_ignores_tick_and_time() {
        let a = update(OfferState::Buying, Side::Buy, 3, 10);
        let mut b = a.clone();
        b.tick = 99;
        b.time = TimeMs::new(0);
        assert!(a.same_content(&b));
        b.spent += 1;
        assert!(!a.same_content(&b));
    }

    #[test]
    fn test_margin_check_heuristic() {
        assert!(is_margin_check(OfferState::Bought, 1, TickDelta::new(2)));
        assert!(is_margin_check(OfferState::Sold, 1, TickDelta::ZERO));
        assert!(!is_margin_check(OfferState::Bought, 1, TickDelta::new(3)));
        assert!(!is_margin_check(OfferState::Bought, 2, TickDelta::new(1)));
        assert!(!is_margin_check(OfferState::CancelledBuy, 1, TickDelta::new(1)));
        assert!(!is_margin_check(OfferState::Buying, 1, TickDelta::new(1)));
    }

    #[test]
    fn test_from_update_prices_tax_once() {
        let tax = TaxSchedule::default();
        let sell = OfferEvent::from_update(
            &update(OfferState::Sold, Side::Sell, 2, 2),
            TickDelta::new(5),
            None,
            false,
            &tax,
        );
        assert_eq!(sell.post_tax_price, 1_960_000);
        assert_eq!(sell.tax_on(2), 80_000);
        assert_eq!(sell.value_of(2), 3_920_000);

        let buy = OfferEvent::from_update(
            &update(OfferState::Bought, Side::Buy, 2, 2),
            TickDelta::new(5),
            None,
            false,
            &tax,
        );
        assert_eq!(buy.post_tax_price, buy.price);
    }

    #[test]
    fn test_with_quantity_keeps_identity() {
        let tax = TaxSchedule::untaxed();
        let event = OfferEvent::from_update(
            &update(OfferState::Buying, Side::Buy, 7, 10),
            TickDelta::ZERO,
            None,
            false,
            &tax,
        );
        let standardized = event.with_quantity(3);
        assert_eq!(standardized.id, event.id);
        assert_eq!(standardized.quantity, 3);
        assert_eq!(event.quantity, 7);
    }

    #[test]
    fn test_redundant_before_completion() {
        let tax = TaxSchedule::untaxed();
        let event = OfferEvent::from_update(
            &update(OfferState::Buying, Side::Buy, 10, 10),
            TickDelta::ZERO,
            None,
            false,
            &tax,
        );
        assert!(event.is_redundant_before_completion());
    }
}
