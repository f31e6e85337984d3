//! Supply and lot models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One purchased batch of a supply item
///
/// Lots are owned exclusively by their parent [`Supply`]. A lot is created on
/// restock (or synthesized from a legacy single-lot record), its quantity is
/// decremented by consumption, and it is removed entirely once the quantity
/// reaches zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    /// Expiry date of this batch
    pub date: NaiveDate,

    /// Remaining quantity in this batch; always > 0 while the lot exists
    pub quantity: i64,

    /// When this batch was acquired
    pub added_at: DateTime<Utc>,

    /// Price paid for this batch, if recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Decimal>,
}

/// A trackable inventory item owned by a team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supply {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub category: String,

    /// Counting unit, e.g. "本" (bottles) or "缶" (cans)
    pub unit: String,

    /// Where this item is usually bought
    pub purchase_location: Option<String>,

    /// Total quantity across all lots. Derived; kept in sync by the stock
    /// engine whenever lots change.
    pub quantity: i64,

    /// Nearest lot expiry. Doubles as the legacy single-lot expiry field for
    /// records created before multi-lot tracking existed.
    pub expiry_date: Option<NaiveDate>,

    /// Per-batch expiry tracking. Authoritative when non-empty.
    #[serde(rename = "expiry_dates")]
    pub lots: Vec<Lot>,

    /// Lifetime total of requested consumption; never decreases
    pub consumption_count: i64,

    pub last_consumed_date: Option<DateTime<Utc>>,

    /// Set when the total quantity drops to 0, cleared when it rises above 0
    pub zero_stock_since: Option<DateTime<Utc>>,

    pub is_archived: bool,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Supply {
    /// Whether the lot bookkeeping is internally consistent: the derived
    /// total matches the lot sum and no exhausted lot survived.
    pub fn lots_consistent(&self) -> bool {
        if self.lots.is_empty() {
            return true;
        }
        let sum: i64 = self.lots.iter().map(|l| l.quantity).sum();
        sum == self.quantity && self.lots.iter().all(|l| l.quantity > 0)
    }
}
