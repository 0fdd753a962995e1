use flipledger::{
    FlipLedger, ItemId, LedgerError, OfferState, RawOfferUpdate, Side, SlotIndex,
    StaticReferenceData, TaxSchedule, TimeMs,
};
use std::sync::Arc;

const T0: i64 = 1_700_000_000_000;
const ITEM: ItemId = ItemId(4151);

fn ledger() -> FlipLedger {
    let data = StaticReferenceData::new().with_item(ITEM, "Abyssal whip", 70);
    FlipLedger::new(8, TaxSchedule::untaxed(), Arc::new(data))
}

fn raw(
    slot: usize,
    side: Side,
    state: OfferState,
    traded: u32,
    total: u32,
    price: i64,
    tick: u32,
) -> RawOfferUpdate {
    RawOfferUpdate {
        slot: SlotIndex::new(slot),
        item_id: ITEM,
        side,
        quantity_traded: traded,
        total_quantity: total,
        price,
        spent: i64::from(traded) * price,
        state,
        tick,
        time: TimeMs::new(T0 + i64::from(tick) * 600),
    }
}

fn empty(slot: usize, tick: u32) -> RawOfferUpdate {
    RawOfferUpdate {
        slot: SlotIndex::new(slot),
        item_id: ItemId::new(0),
        side: Side::Buy,
        quantity_traded: 0,
        total_quantity: 0,
        price: 0,
        spent: 0,
        state: OfferState::Empty,
        tick,
        time: TimeMs::new(T0 + i64::from(tick) * 600),
    }
}

#[test]
fn test_partial_fills_standardize_to_deltas() {
    let mut ledger = ledger();
    let updates = [
        raw(0, Side::Buy, OfferState::Buying, 0, 100, 50, 10),
        raw(0, Side::Buy, OfferState::Buying, 20, 100, 50, 15),
        raw(0, Side::Buy, OfferState::Buying, 55, 100, 50, 25),
        raw(0, Side::Buy, OfferState::Buying, 100, 100, 50, 30),
        raw(0, Side::Buy, OfferState::Bought, 100, 100, 50, 31),
    ];
    let emitted: Vec<u32> = updates
        .iter()
        .filter_map(|u| ledger.ingest(u).unwrap())
        .map(|e| e.quantity)
        .collect();
    assert_eq!(emitted, vec![20, 35, 45]);

    let history = &ledger.item(ITEM).unwrap().history;
    let total: u32 = history.offers().iter().map(|o| o.quantity).sum();
    assert_eq!(total, 100);
    assert!(history.latest_offer().unwrap().is_terminal());
}

#[test]
fn test_duplicate_notifications_are_dropped() {
    let mut ledger = ledger();
    let mut ingest = |traded: u32, tick: u32| {
        ledger
            .ingest(&raw(0, Side::Buy, OfferState::Buying, traded, 10, 50, tick))
            .unwrap()
    };
    assert!(ingest(0, 1).is_none());
    assert!(ingest(4, 2).is_some());
    assert!(ingest(4, 3).is_none());
    assert!(ingest(4, 9).is_none());

    let history = &ledger.item(ITEM).unwrap().history;
    assert_eq!(history.offers().len(), 1);
    assert_eq!(history.stats(None).quantity_bought, 4);
}

#[test]
fn test_login_empty_notifications_are_ignored() {
    let mut ledger = ledger();
    ledger.on_login(5);
    for slot in 0..8 {
        assert!(ledger.ingest(&empty(slot, 5)).unwrap().is_none());
    }
    assert_eq!(ledger.items().count(), 0);
}

#[test]
fn test_events_on_login_tick_are_marked() {
    let mut ledger = ledger();
    ledger.on_login(40);
    let event = ledger
        .ingest(&raw(3, Side::Sell, OfferState::Selling, 2, 10, 90, 40))
        .unwrap()
        .unwrap();
    assert!(event.before_login);
    assert!(event.trade_started_at.is_none());

    let later = ledger
        .ingest(&raw(3, Side::Sell, OfferState::Sold, 10, 10, 90, 45))
        .unwrap()
        .unwrap();
    assert!(!later.before_login);
    assert_eq!(later.quantity, 8);
}

#[test]
fn test_slot_reuse_after_completion() {
    let mut ledger = ledger();
    ledger.ingest(&raw(0, Side::Buy, OfferState::Buying, 0, 5, 50, 1)).unwrap();
    ledger.ingest(&raw(0, Side::Buy, OfferState::Bought, 5, 5, 50, 20)).unwrap();
    ledger.ingest(&empty(0, 21)).unwrap();
    ledger.ingest(&raw(0, Side::Sell, OfferState::Selling, 0, 5, 70, 22)).unwrap();
    let sold = ledger
        .ingest(&raw(0, Side::Sell, OfferState::Sold, 5, 5, 70, 40))
        .unwrap()
        .unwrap();
    assert_eq!(sold.quantity, 5);
    assert_eq!(sold.ticks_since_first_offer.as_u32(), 18);
    assert_eq!(ledger.item_stats(ITEM, None).unwrap().profit(), 100);
}

#[test]
fn test_margin_check_round_trip() {
    let mut ledger = ledger();
    ledger.ingest(&raw(0, Side::Buy, OfferState::Buying, 0, 1, 1_200, 100)).unwrap();
    let buy = ledger
        .ingest(&raw(0, Side::Buy, OfferState::Bought, 1, 1, 1_200, 101))
        .unwrap()
        .unwrap();
    assert!(buy.is_margin_check());

    ledger.ingest(&raw(1, Side::Sell, OfferState::Selling, 0, 1, 1_000, 103)).unwrap();
    let sell = ledger
        .ingest(&raw(1, Side::Sell, OfferState::Sold, 1, 1, 1_000, 105))
        .unwrap()
        .unwrap();
    assert!(sell.is_margin_check());

    let flips = ledger.item_flips(ITEM, None).unwrap();
    assert_eq!(flips.len(), 1);
    assert!(flips[0].margin_check);
    assert_eq!(flips[0].quantity, 1);
    assert_eq!(flips[0].profit(), -200);

    let history = &ledger.item(ITEM).unwrap().history;
    assert_eq!(history.latest_margin_check(Side::Buy).unwrap().price, 1_200);
    assert_eq!(history.latest_margin_check(Side::Sell).unwrap().price, 1_000);
}

#[test]
fn test_slow_single_unit_trade_is_not_a_margin_check() {
    let mut ledger = ledger();
    ledger.ingest(&raw(0, Side::Buy, OfferState::Buying, 0, 1, 1_200, 100)).unwrap();
    let buy = ledger
        .ingest(&raw(0, Side::Buy, OfferState::Bought, 1, 1, 1_200, 103))
        .unwrap()
        .unwrap();
    assert!(!buy.is_margin_check());
}

#[test]
fn test_cancelled_partial_fill_keeps_filled_quantity() {
    let mut ledger = ledger();
    ledger.ingest(&raw(2, Side::Buy, OfferState::Buying, 0, 50, 10, 1)).unwrap();
    ledger.ingest(&raw(2, Side::Buy, OfferState::Buying, 12, 50, 10, 4)).unwrap();
    let cancelled = ledger
        .ingest(&raw(2, Side::Buy, OfferState::CancelledBuy, 12, 50, 10, 9))
        .unwrap()
        .unwrap();
    assert_eq!(cancelled.quantity, 0);
    assert_eq!(ledger.item_stats(ITEM, None).unwrap().quantity_bought, 12);
}

#[test]
fn test_unknown_slot_is_an_error() {
    let mut ledger = ledger();
    let err = ledger.ingest(&empty(12, 1)).unwrap_err();
    assert!(matches!(err, LedgerError::SlotOutOfRange { slot_count: 8, .. }));
}

#[test]
fn test_logout_rearms_login_suppression() {
    let mut ledger = ledger();
    ledger.ingest(&raw(0, Side::Buy, OfferState::Buying, 0, 5, 50, 1)).unwrap();
    ledger.ingest(&raw(0, Side::Buy, OfferState::Buying, 2, 5, 50, 2)).unwrap();
    ledger.on_logout();
    ledger.on_login(500);

    let replayed = ledger
        .ingest(&raw(0, Side::Buy, OfferState::Buying, 2, 5, 50, 500))
        .unwrap();
    assert!(replayed.is_none());
    let resumed = ledger
        .ingest(&raw(0, Side::Buy, OfferState::Bought, 5, 5, 50, 510))
        .unwrap()
        .unwrap();
    assert_eq!(resumed.quantity, 3);
    assert_eq!(ledger.item_stats(ITEM, None).unwrap().quantity_bought, 5);
}

#[test]
fn test_new_trade_after_missed_terminal_standardizes_fresh() {
    let mut ledger = ledger();
    ledger.ingest(&raw(0, Side::Buy, OfferState::Buying, 0, 10, 50, 1)).unwrap();
    ledger.ingest(&raw(0, Side::Buy, OfferState::Buying, 5, 10, 50, 3)).unwrap();
    // The completion of that trade never arrived; a new one was placed.
    ledger.ingest(&raw(0, Side::Buy, OfferState::Buying, 0, 20, 50, 8)).unwrap();
    let stored = ledger
        .ingest(&raw(0, Side::Buy, OfferState::Buying, 8, 20, 50, 12))
        .unwrap()
        .unwrap();
    assert_eq!(stored.quantity, 8);
    assert_eq!(ledger.item_stats(ITEM, None).unwrap().quantity_bought, 13);
}

#[test]
fn test_new_trade_after_logout_standardizes_fresh() {
    let mut ledger = ledger();
    ledger.ingest(&raw(0, Side::Buy, OfferState::Buying, 0, 10, 50, 1)).unwrap();
    ledger.ingest(&raw(0, Side::Buy, OfferState::Buying, 5, 10, 50, 3)).unwrap();
    ledger.on_logout();
    ledger.on_login(500);

    let stored = ledger
        .ingest(&raw(0, Side::Buy, OfferState::Buying, 8, 20, 50, 510))
        .unwrap()
        .unwrap();
    assert_eq!(stored.quantity, 8);
    assert_eq!(ledger.item_stats(ITEM, None).unwrap().quantity_bought, 13);
}
