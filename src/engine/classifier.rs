//! Turns accepted raw notifications into finalized offer events.
//!
//! The classifier keeps, per slot, the first event of the open trade (used as
//! the tick reference) and the last event it emitted. Rules are applied in
//! arrival order; reordering notifications changes the outcome.

use crate::domain::{OfferEvent, RawOfferUpdate, SlotIndex, TaxSchedule, TickDelta};
use crate::error::LedgerError;
use tracing::{debug, warn};

pub use crate::domain::is_margin_check;

/// Why a notification produced no event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsorbReason {
    /// Quantity 0, not terminal: a new trade was placed.
    TradeStarted,
    /// Empty slot after a terminal event: the slot is idle again.
    SlotCleared,
    /// Empty slot while a trade is still open.
    SpuriousEmpty,
    /// Empty slot with no trade on record.
    IdleEmpty,
    /// Open-state event repeating the final quantity just before completion.
    RedundantBeforeCompletion,
    /// Terminal event with nothing filled.
    CancelledWithoutFill,
}

/// Outcome of classifying one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Emitted(OfferEvent),
    Absorbed(AbsorbReason),
}

impl Classification {
    pub fn into_event(self) -> Option<OfferEvent> {
        match self {
            Classification::Emitted(event) => Some(event),
            Classification::Absorbed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct SlotTradeState {
    first_event: Option<OfferEvent>,
    last_event: Option<OfferEvent>,
}

impl SlotTradeState {
    fn clear(&mut self) {
        self.first_event = None;
        self.last_event = None;
    }

    /// First event of the trade `update` continues, if there is one.
    fn continuing_trade(&self, update: &RawOfferUpdate) -> Option<&OfferEvent> {
        if self.last_event.as_ref().is_some_and(|e| e.is_terminal()) {
            return None;
        }
        self.first_event
            .as_ref()
            .filter(|first| first.item_id == update.item_id && first.side == update.side)
    }
}

/// Stateful classifier holding one trade state per slot.
#[derive(Debug, Clone)]
pub struct OfferClassifier {
    slots: Vec<SlotTradeState>,
    login_tick: Option<u32>,
    tax: TaxSchedule,
}

impl OfferClassifier {
    pub fn new(slot_count: usize, tax: TaxSchedule) -> Self {
        Self {
            slots: vec![SlotTradeState::default(); slot_count],
            login_tick: None,
            tax,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn tax_schedule(&self) -> &TaxSchedule {
        &self.tax
    }

    /// Record the tick on which login completed.
    pub fn on_login(&mut self, tick: u32) {
        self.login_tick = Some(tick);
    }

    /// Forget every open trade; tick references do not survive a logout.
    pub fn on_logout(&mut self) {
        self.login_tick = None;
        self.slots.iter_mut().for_each(SlotTradeState::clear);
    }

    /// First event of the trade open in `slot`.
    pub fn open_trade(&self, slot: SlotIndex) -> Option<&OfferEvent> {
        self.slots.get(slot.as_usize())?.first_event.as_ref()
    }

    /// Last event emitted for `slot`.
    pub fn last_event(&self, slot: SlotIndex) -> Option<&OfferEvent> {
        self.slots.get(slot.as_usize())?.last_event.as_ref()
    }

    /// Classify one notification already accepted by the slot filter.
    ///
    /// # Errors
    /// Returns `SlotOutOfRange` if the notification names an unknown slot.
    pub fn classify(&mut self, update: &RawOfferUpdate) -> Result<Classification, LedgerError> {
        let slot_count = self.slots.len();
        let state = self
            .slots
            .get_mut(update.slot.as_usize())
            .ok_or(LedgerError::SlotOutOfRange {
                slot: update.slot,
                slot_count,
            })?;
        let before_login = self.login_tick == Some(update.tick);

        if update.is_empty_slot() {
            let open = state.last_event.as_ref().or(state.first_event.as_ref());
            let reason = match open {
                None => AbsorbReason::IdleEmpty,
                Some(event) if event.is_terminal() => {
                    state.clear();
                    AbsorbReason::SlotCleared
                }
                Some(_) => AbsorbReason::SpuriousEmpty,
            };
            debug!(slot = %update.slot, ?reason, "empty slot notification");
            return Ok(Classification::Absorbed(reason));
        }

        if update.quantity_traded == 0 && !update.state.is_terminal() {
            let started_at = (!before_login).then_some(update.time);
            let first = OfferEvent::from_update(
                update,
                TickDelta::ZERO,
                started_at,
                before_login,
                &self.tax,
            );
            debug!(
                slot = %update.slot,
                item = %update.item_id,
                side = %update.side,
                total = update.total_quantity,
                "trade started"
            );
            state.first_event = Some(first);
            state.last_event = None;
            return Ok(Classification::Absorbed(AbsorbReason::TradeStarted));
        }

        if update.quantity_traded == 0 {
            state.clear();
            return Ok(Classification::Absorbed(AbsorbReason::CancelledWithoutFill));
        }

        if update.state.is_open() && update.quantity_traded == update.total_quantity {
            return Ok(Classification::Absorbed(
                AbsorbReason::RedundantBeforeCompletion,
            ));
        }

        let reference = state.continuing_trade(update).map(|first| {
            (
                TickDelta::between(update.tick, first.tick_arrived_at)
                    .saturating_add(first.ticks_since_first_offer),
                first.trade_started_at,
            )
        });

        let event = match reference {
            Some((ticks, started_at)) => {
                OfferEvent::from_update(update, ticks, started_at, before_login, &self.tax)
            }
            None => {
                warn!(
                    slot = %update.slot,
                    item = %update.item_id,
                    "continuation without an open trade, treating as a new trade"
                );
                let started_at = (!before_login).then_some(update.time);
                let event = OfferEvent::from_update(
                    update,
                    TickDelta::ZERO,
                    started_at,
                    before_login,
                    &self.tax,
                );
                state.first_event = Some(event.clone());
                event
            }
        };

        state.last_event = Some(event.clone());
        Ok(Classification::Emitted(event))
    }
}
