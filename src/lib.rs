pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod reference;
pub mod session;
pub mod telemetry;

pub use config::{ConfigError, LedgerConfig};
pub use domain::{
    Decimal, Flip, ItemId, OfferEvent, OfferState, PartialOffer, RawOfferUpdate, Recipe, Side,
    SlotIndex, TaxSchedule, TickDelta, TimeMs,
};
pub use engine::{
    AbsorbReason, Classification, ConsumedAmounts, ItemHistory, OfferClassifier,
    RecipeAllocationEngine, RecipeFlip, SlotEventFilter, TradeStats,
};
pub use error::LedgerError;
pub use reference::{ItemMetadata, ItemMetadataSource, RecipeSource, StaticReferenceData};
pub use session::{
    shared, spawn_limit_refresher, AccountSummary, FlipLedger, ItemSummary, SharedLedger,
    TrackedItem,
};
