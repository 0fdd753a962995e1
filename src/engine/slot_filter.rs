//! Per-slot deduplication of raw offer notifications.

use crate::domain::RawOfferUpdate;
use tracing::trace;

/// Drops notifications that carry no new information for one slot.
///
/// The client emits an empty-slot notification for every slot once on login,
/// and frequently repeats the exact same notification.
#[derive(Debug, Clone, Default)]
pub struct SlotEventFilter {
    last_seen: Option<RawOfferUpdate>,
    seen_first_event: bool,
}

impl SlotEventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `update` should reach the classifier, remembering it if so.
    pub fn should_process(&mut self, update: &RawOfferUpdate) -> bool {
        let first_event = !self.seen_first_event;
        self.seen_first_event = true;

        if first_event && update.is_empty_slot() {
            trace!(slot = %update.slot, "dropping login empty-slot notification");
            return false;
        }

        if self
            .last_seen
            .as_ref()
            .is_some_and(|last| last.same_content(update))
        {
            trace!(slot = %update.slot, "dropping duplicate notification");
            return false;
        }

        self.last_seen = Some(update.clone());
        true
    }

    /// Re-arm the login empty-slot suppression.
    pub fn on_logout(&mut self) {
        self.seen_first_event = false;
    }

    pub fn last_seen(&self) -> Option<&RawOfferUpdate> {
        self.last_seen.as_ref()
    }
}
