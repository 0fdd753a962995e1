//! The ingestion pipeline and per-item arena for one session.

use super::summary::{AccountSummary, ItemSummary};
use crate::config::LedgerConfig;
use crate::domain::{
    Flip, ItemId, OfferEvent, PartialOffer, RawOfferUpdate, Recipe, SlotIndex, TaxSchedule, TimeMs,
};
use crate::engine::{
    AbsorbReason, Classification, ConsumedAmounts, ItemHistory, OfferClassifier, OfferPools,
    RecipeAllocationEngine, RecipeFlip, SlotEventFilter, TradeStats,
};
use crate::error::LedgerError;
use crate::reference::ItemMetadataSource;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// An item's history plus the reference data resolved when it was first seen.
#[derive(Debug, Clone)]
pub struct TrackedItem {
    pub item_id: ItemId,
    pub name: String,
    pub purchase_limit: u32,
    pub history: ItemHistory,
}

impl TrackedItem {
    fn new(item_id: ItemId, metadata: &dyn ItemMetadataSource) -> Self {
        let (name, purchase_limit) = match metadata.item_metadata(item_id) {
            Some(meta) => (meta.name, meta.purchase_limit),
            None => {
                debug!(item = %item_id, "no metadata for item");
                (String::new(), 0)
            }
        };
        TrackedItem {
            item_id,
            name,
            purchase_limit,
            history: ItemHistory::new(item_id),
        }
    }

    pub fn remaining_limit(&self, now: TimeMs) -> u32 {
        self.history.remaining_limit(self.purchase_limit, now)
    }
}

/// Owns the slot filters, the classifier, every item history and every
/// recipe flip of a session.
///
/// All mutation goes through `&mut self`; share it across tasks with
/// [`super::SharedLedger`].
#[derive(Debug)]
pub struct FlipLedger {
    filters: Vec<SlotEventFilter>,
    classifier: OfferClassifier,
    /// Item whose history holds the trade open in each slot.
    slot_items: Vec<Option<ItemId>>,
    items: BTreeMap<ItemId, TrackedItem>,
    recipe_flips: Vec<RecipeFlip>,
    metadata: Arc<dyn ItemMetadataSource>,
    summaries: HashMap<Option<TimeMs>, AccountSummary>,
}

impl FlipLedger {
    pub fn new(slot_count: usize, tax: TaxSchedule, metadata: Arc<dyn ItemMetadataSource>) -> Self {
        FlipLedger {
            filters: vec![SlotEventFilter::new(); slot_count],
            classifier: OfferClassifier::new(slot_count, tax),
            slot_items: vec![None; slot_count],
            items: BTreeMap::new(),
            recipe_flips: Vec::new(),
            metadata,
            summaries: HashMap::new(),
        }
    }

    pub fn from_config(config: &LedgerConfig, metadata: Arc<dyn ItemMetadataSource>) -> Self {
        Self::new(config.slot_count, TaxSchedule::default(), metadata)
    }

    pub fn slot_count(&self) -> usize {
        self.filters.len()
    }

    fn touch(&mut self) {
        self.summaries.clear();
    }

    /// Run one raw notification through the pipeline.
    ///
    /// Returns the standardized event appended to the item's history, or
    /// `None` if the notification was filtered or absorbed.
    ///
    /// # Errors
    /// Returns `SlotOutOfRange` for a slot the ledger was not sized for.
    pub fn ingest(&mut self, update: &RawOfferUpdate) -> Result<Option<OfferEvent>, LedgerError> {
        let slot_count = self.filters.len();
        let filter = self
            .filters
            .get_mut(update.slot.as_usize())
            .ok_or(LedgerError::SlotOutOfRange {
                slot: update.slot,
                slot_count,
            })?;
        if !filter.should_process(update) {
            return Ok(None);
        }

        let event = match self.classifier.classify(update)? {
            Classification::Emitted(event) => event,
            Classification::Absorbed(reason) => {
                debug!(slot = %update.slot, ?reason, "notification absorbed");
                if reason == AbsorbReason::TradeStarted {
                    self.release_slot(update.slot);
                }
                return Ok(None);
            }
        };

        let item_id = event.item_id;
        let slot = event.slot;
        if self.slot_items[slot.as_usize()] != Some(item_id) {
            self.release_slot(slot);
        }
        let metadata = &self.metadata;
        let item = self
            .items
            .entry(item_id)
            .or_insert_with(|| TrackedItem::new(item_id, metadata.as_ref()));
        let appended = item.history.append(event).clone();
        self.slot_items[slot.as_usize()] = (!appended.is_terminal()).then_some(item_id);
        if appended.is_terminal() {
            info!(
                item = %appended.item_id,
                slot = %appended.slot,
                side = %appended.side,
                state = ?appended.state,
                price = appended.price,
                "trade finished"
            );
        }
        self.touch();
        Ok(Some(appended))
    }

    /// Close whatever trade an item history still has open in `slot`.
    fn release_slot(&mut self, slot: SlotIndex) {
        let Some(item_id) = self.slot_items[slot.as_usize()].take() else {
            return;
        };
        if let Some(item) = self.items.get_mut(&item_id) {
            item.history.close_slot(slot);
        }
    }

    pub fn on_login(&mut self, tick: u32) {
        self.classifier.on_login(tick);
    }

    pub fn on_logout(&mut self) {
        self.filters.iter_mut().for_each(SlotEventFilter::on_logout);
        self.classifier.on_logout();
    }

    /// Reset every limit window that expired by `now`. Returns how many
    /// were reset.
    pub fn validate_limit_windows(&mut self, now: TimeMs) -> usize {
        let reset = self
            .items
            .values_mut()
            .filter_map(|item| item.history.validate_limit_window(now).then_some(item.item_id))
            .count();
        if reset > 0 {
            debug!(reset, "limit windows refreshed");
            self.touch();
        }
        reset
    }

    pub fn item(&self, item_id: ItemId) -> Option<&TrackedItem> {
        self.items.get(&item_id)
    }

    pub fn items(&self) -> impl Iterator<Item = &TrackedItem> {
        self.items.values()
    }

    fn tracked(&self, item_id: ItemId) -> Result<&TrackedItem, LedgerError> {
        self.items
            .get(&item_id)
            .ok_or(LedgerError::UnknownItem(item_id))
    }

    /// Quantity of each offer already used by recipe flips.
    pub fn consumed_amounts(&self) -> ConsumedAmounts {
        ConsumedAmounts::from_flips(&self.recipe_flips)
    }

    /// Item statistics after `range_start`, excluding recipe-consumed quantity.
    pub fn item_stats(
        &self,
        item_id: ItemId,
        range_start: Option<TimeMs>,
    ) -> Result<TradeStats, LedgerError> {
        let item = self.tracked(item_id)?;
        Ok(item.history.stats_excluding(range_start, &self.consumed_amounts()))
    }

    /// Item flips after `range_start`, most recent first, excluding
    /// recipe-consumed quantity.
    pub fn item_flips(
        &self,
        item_id: ItemId,
        range_start: Option<TimeMs>,
    ) -> Result<Vec<Flip>, LedgerError> {
        let item = self.tracked(item_id)?;
        Ok(item.history.flips_excluding(range_start, &self.consumed_amounts()))
    }

    /// Every offer of the recipe's items, paired with what earlier recipe
    /// flips already consumed from it.
    pub fn recipe_pools(&self, recipe: &Recipe) -> OfferPools {
        let consumed = self.consumed_amounts();
        recipe
            .item_ids()
            .map(|item_id| {
                let pool = self
                    .items
                    .get(&item_id)
                    .map(|item| {
                        item.history
                            .offers()
                            .iter()
                            .filter(|offer| offer.quantity > 0)
                            .map(|offer| PartialOffer::new(offer.clone(), consumed.get(offer.id)))
                            .filter(|partial| partial.remaining() > 0)
                            .collect()
                    })
                    .unwrap_or_default();
                (item_id, pool)
            })
            .collect()
    }

    /// Recipes completable from the unconsumed offers of its items.
    pub fn max_recipes(&self, recipe: &Recipe) -> Result<u32, LedgerError> {
        recipe.validate()?;
        RecipeAllocationEngine::max_recipes(recipe, &self.recipe_pools(recipe))
    }

    /// Allocate offers to `requested` instances of `recipe` (as many as
    /// possible when `None`) and record the resulting recipe flip.
    ///
    /// # Errors
    /// `InvalidRecipe` for a malformed recipe, `NothingToAllocate` if not even
    /// one instance can be completed.
    pub fn record_recipe_flip(
        &mut self,
        recipe: Recipe,
        requested: Option<u32>,
        now: TimeMs,
    ) -> Result<&RecipeFlip, LedgerError> {
        let pools = self.recipe_pools(&recipe);
        let allocation = RecipeAllocationEngine::allocate(&recipe, &pools, requested)?;
        if allocation.recipe_count == 0 {
            return Err(LedgerError::NothingToAllocate(recipe.parent_item_id));
        }

        let flip = RecipeFlip::from_allocation(recipe, allocation, now);
        info!(
            id = %flip.id,
            parent = %flip.parent_item_id(),
            recipe_count = flip.recipe_count,
            profit = flip.profit(),
            "recipe flip recorded"
        );
        self.recipe_flips.push(flip);
        self.touch();
        let last = self.recipe_flips.len() - 1;
        Ok(&self.recipe_flips[last])
    }

    pub fn recipe_flips(&self) -> &[RecipeFlip] {
        &self.recipe_flips
    }

    /// Recipe flips whose parent is `item_id`.
    pub fn recipe_flips_for(&self, item_id: ItemId) -> impl Iterator<Item = &RecipeFlip> {
        self.recipe_flips
            .iter()
            .filter(move |flip| flip.parent_item_id() == item_id)
    }

    /// Delete a recipe flip, releasing the quantity it consumed.
    pub fn remove_recipe_flip(&mut self, id: Uuid) -> Option<RecipeFlip> {
        let idx = self.recipe_flips.iter().position(|flip| flip.id == id)?;
        self.touch();
        Some(self.recipe_flips.remove(idx))
    }

    /// Remove `item_id`'s offers with `from <= time <= to`. Recipe flips that
    /// consumed any removed offer are removed with them.
    ///
    /// Returns the ids of the removed offers.
    pub fn invalidate_offers(
        &mut self,
        item_id: ItemId,
        from: TimeMs,
        to: TimeMs,
    ) -> Result<Vec<Uuid>, LedgerError> {
        let item = self
            .items
            .get_mut(&item_id)
            .ok_or(LedgerError::UnknownItem(item_id))?;
        let removed = item.history.invalidate_between(from, to);
        if removed.is_empty() {
            return Ok(removed);
        }

        let removed_ids: HashSet<Uuid> = removed.iter().copied().collect();
        let before = self.recipe_flips.len();
        self.recipe_flips
            .retain(|flip| {
                !flip
                    .partial_offers()
                    .any(|p| removed_ids.contains(&p.offer_id()))
            });
        info!(
            item = %item_id,
            offers = removed.len(),
            recipe_flips = before - self.recipe_flips.len(),
            "offers invalidated"
        );
        self.touch();
        Ok(removed)
    }

    /// Summary of one item after `range_start`. The limit fields reflect the
    /// window as of `now`, even if it has not been validated yet.
    pub fn item_summary(
        &self,
        item_id: ItemId,
        range_start: Option<TimeMs>,
        now: TimeMs,
    ) -> Result<ItemSummary, LedgerError> {
        let item = self.tracked(item_id)?;
        Ok(self.summarize(item, range_start, &self.consumed_amounts(), now))
    }

    fn summarize(
        &self,
        item: &TrackedItem,
        range_start: Option<TimeMs>,
        consumed: &ConsumedAmounts,
        now: TimeMs,
    ) -> ItemSummary {
        let in_range = |t: TimeMs| range_start.map_or(true, |start| t > start);
        ItemSummary {
            item_id: item.item_id,
            name: item.name.clone(),
            stats: item.history.stats_excluding(range_start, consumed),
            recipe_profit: self
                .recipe_flips_for(item.item_id)
                .filter(|flip| in_range(flip.created_at))
                .map(RecipeFlip::profit)
                .sum(),
            flip_count: item.history.flips_excluding(range_start, consumed).len(),
            purchase_limit: item.purchase_limit,
            limit_used: item.history.limit_window().quantity_bought_at(now),
            next_limit_refresh: item.history.limit_window().next_refresh_at(now),
        }
    }

    /// Account-wide summary after `range_start`. Limit windows expired by
    /// `now` are reset first; the result is cached until the ledger next
    /// changes.
    pub fn account_summary(&mut self, range_start: Option<TimeMs>, now: TimeMs) -> AccountSummary {
        self.validate_limit_windows(now);
        if let Some(cached) = self.summaries.get(&range_start) {
            return cached.clone();
        }

        let consumed = self.consumed_amounts();
        let in_range = |t: TimeMs| range_start.map_or(true, |start| t > start);
        let items: Vec<ItemSummary> = self
            .items
            .values()
            .filter(|item| {
                item.history.offers_since(range_start).next().is_some()
                    || self
                        .recipe_flips_for(item.item_id)
                        .any(|flip| in_range(flip.created_at))
            })
            .map(|item| self.summarize(item, range_start, &consumed, now))
            .collect();
        let recipe_flip_count = self
            .recipe_flips
            .iter()
            .filter(|flip| in_range(flip.created_at))
            .count();

        let summary = AccountSummary::from_items(range_start, items, recipe_flip_count);
        self.summaries.insert(range_start, summary.clone());
        summary
    }
}
