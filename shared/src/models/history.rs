//! Consumption history models

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Principal recorded as the archiver for automatic sweeps
pub const SYSTEM_PRINCIPAL: &str = "system";

/// An archival aggregate of past consumption, keyed by
/// `(team_id, name, category)`
///
/// Created once per unique key; later archivals of items with the same key
/// merge into the existing record instead of creating a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyHistory {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub category: String,
    pub unit: String,

    /// Cumulative consumption across all archived incarnations
    pub total_consumed: i64,

    /// Stock level observed at archive time; averaged on merge
    pub average_stock: Decimal,

    /// Deduplicated set of places this item was bought
    pub purchase_locations: BTreeSet<String>,

    pub last_used_date: DateTime<Utc>,
    pub first_registered_date: DateTime<Utc>,

    pub has_reviews: bool,
    pub review_count: i64,

    pub archived_at: DateTime<Utc>,

    /// User id string, or [`SYSTEM_PRINCIPAL`] for the auto-archive sweep
    pub archived_by: String,
}

impl SupplyHistory {
    /// Merge key. Exact, case-sensitive match decides merge-vs-create.
    pub fn key(&self) -> (Uuid, &str, &str) {
        (self.team_id, self.name.as_str(), self.category.as_str())
    }

    /// Whether `other` archives the same logical item
    pub fn same_key(&self, other: &SupplyHistory) -> bool {
        self.key() == other.key()
    }
}
