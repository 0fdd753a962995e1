//! Background task keeping purchase-limit windows current.

use super::ledger::FlipLedger;
use crate::domain::TimeMs;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A ledger shared between the ingestion path and background tasks.
pub type SharedLedger = Arc<Mutex<FlipLedger>>;

pub fn shared(ledger: FlipLedger) -> SharedLedger {
    Arc::new(Mutex::new(ledger))
}

/// Spawn a task that resets expired limit windows every `interval`.
///
/// Validation takes the same lock as ingestion, so it never runs in the
/// middle of an append. The task runs until aborted.
pub fn spawn_limit_refresher(ledger: SharedLedger, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "limit refresher started");
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let reset = ledger.lock().validate_limit_windows(TimeMs::now());
            if reset > 0 {
                debug!(reset, "expired limit windows cleared");
            }
        }
    })
}
