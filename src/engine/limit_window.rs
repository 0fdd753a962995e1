//! Rolling purchase-limit window for one item.

use crate::domain::{OfferEvent, TimeMs};
use serde::{Deserialize, Serialize};

/// A window resets this long after the first purchase in it.
pub const LIMIT_WINDOW_MS: i64 = 4 * TimeMs::HOUR;

/// Quantity bought in the current window and when the window expires.
///
/// Once `now >= next_refresh` the stored values are stale; call
/// [`LimitWindow::validate`] before trusting them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitWindow {
    next_refresh: Option<TimeMs>,
    quantity_bought: u32,
}

impl LimitWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_refresh(&self) -> Option<TimeMs> {
        self.next_refresh
    }

    pub fn quantity_bought(&self) -> u32 {
        self.quantity_bought
    }

    /// Count a purchase made at `time`, opening a new window if none is
    /// active at that time.
    pub fn record_buy(&mut self, time: TimeMs, quantity: u32) {
        match self.next_refresh {
            Some(refresh) if time < refresh => {
                self.quantity_bought = self.quantity_bought.saturating_add(quantity);
            }
            _ => {
                self.next_refresh = Some(time.plus_ms(LIMIT_WINDOW_MS));
                self.quantity_bought = quantity;
            }
        }
    }

    /// Clear the window if it expired. Returns true if it was cleared.
    pub fn validate(&mut self, now: TimeMs) -> bool {
        if self.is_expired(now) {
            *self = Self::default();
            return true;
        }
        false
    }

    pub fn is_expired(&self, now: TimeMs) -> bool {
        self.next_refresh.is_some_and(|refresh| now >= refresh)
    }

    /// Quantity bought as of `now`: 0 once the window has expired.
    pub fn quantity_bought_at(&self, now: TimeMs) -> u32 {
        if self.is_expired(now) {
            return 0;
        }
        self.quantity_bought
    }

    /// Refresh time as of `now`: `None` once the window has expired.
    pub fn next_refresh_at(&self, now: TimeMs) -> Option<TimeMs> {
        self.next_refresh.filter(|_| !self.is_expired(now))
    }

    /// Units that can still be bought this window, without mutating state.
    pub fn remaining(&self, purchase_limit: u32, now: TimeMs) -> u32 {
        if self.is_expired(now) {
            return purchase_limit;
        }
        purchase_limit.saturating_sub(self.quantity_bought)
    }

    /// Recompute the window from a log of standardized offers.
    pub fn rebuild<'a>(offers: impl IntoIterator<Item = &'a OfferEvent>) -> Self {
        let mut window = Self::default();
        for offer in offers.into_iter().filter(|o| o.is_buy()) {
            window.record_buy(offer.time, offer.quantity);
        }
        window
    }
}
