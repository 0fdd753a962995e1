//! Session-level wiring: the ledger, its summaries and background upkeep.

pub mod ledger;
pub mod refresher;
pub mod summary;

pub use ledger::{FlipLedger, TrackedItem};
pub use refresher::{shared, spawn_limit_refresher, SharedLedger};
pub use summary::{AccountSummary, ItemSummary};
