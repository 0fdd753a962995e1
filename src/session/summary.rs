//! Read-only aggregates over the ledger.

use crate::domain::{Decimal, ItemId, TimeMs};
use crate::engine::TradeStats;
use serde::{Deserialize, Serialize};

/// Figures for one item over a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub item_id: ItemId,
    pub name: String,
    /// Offer statistics with recipe-consumed quantity left out.
    pub stats: TradeStats,
    /// Profit of recipe flips whose parent is this item.
    pub recipe_profit: i64,
    pub flip_count: usize,
    pub purchase_limit: u32,
    /// Units bought in the current limit window.
    pub limit_used: u32,
    pub next_limit_refresh: Option<TimeMs>,
}

impl ItemSummary {
    pub fn total_profit(&self) -> i64 {
        self.stats.profit() + self.recipe_profit
    }
}

/// Account-wide fold of every tracked item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub range_start: Option<TimeMs>,
    /// Items with activity in the range, most profitable first.
    pub items: Vec<ItemSummary>,
    pub profit: i64,
    pub expense: i64,
    pub revenue: i64,
    pub tax_paid: i64,
    pub recipe_flip_count: usize,
}

impl AccountSummary {
    pub fn from_items(
        range_start: Option<TimeMs>,
        mut items: Vec<ItemSummary>,
        recipe_flip_count: usize,
    ) -> Self {
        items.sort_by(|a, b| {
            b.total_profit()
                .cmp(&a.total_profit())
                .then(a.item_id.cmp(&b.item_id))
        });
        AccountSummary {
            range_start,
            profit: items.iter().map(ItemSummary::total_profit).sum(),
            expense: items.iter().map(|i| i.stats.expense).sum(),
            revenue: items.iter().map(|i| i.stats.revenue).sum(),
            tax_paid: items.iter().map(|i| i.stats.tax_paid).sum(),
            recipe_flip_count,
            items,
        }
    }

    /// Profit over matched expense.
    pub fn roi(&self) -> Option<Decimal> {
        Decimal::ratio(self.profit, self.expense)
    }

    pub fn item(&self, item_id: ItemId) -> Option<&ItemSummary> {
        self.items.iter().find(|i| i.item_id == item_id)
    }
}
