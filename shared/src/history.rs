//! History reconciliation engine and auto-archive policy
//!
//! Converts an archived supply (plus its reviews) into a canonical
//! [`SupplyHistory`] record and merges records sharing the same
//! `(team_id, name, category)` key. The merge-vs-create lookup itself is the
//! caller's job; these functions only perform the transform and the merge
//! arithmetic.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{Review, Supply, SupplyHistory};

/// Days a supply must sit at zero stock before the sweep archives it
pub const AUTO_ARCHIVE_THRESHOLD_DAYS: i64 = 30;

/// Build the history record for a freshly archived supply
///
/// Pure transform; no lookup of any existing history record.
pub fn to_history(
    supply: &Supply,
    archived_by: &str,
    reviews: &[Review],
    now: DateTime<Utc>,
) -> SupplyHistory {
    let mut purchase_locations = BTreeSet::new();
    if let Some(location) = supply.purchase_location.as_deref() {
        let trimmed = location.trim();
        if !trimmed.is_empty() {
            purchase_locations.insert(trimmed.to_string());
        }
    }

    SupplyHistory {
        id: Uuid::new_v4(),
        team_id: supply.team_id,
        name: supply.name.clone(),
        category: supply.category.clone(),
        unit: supply.unit.clone(),
        total_consumed: supply.consumption_count,
        average_stock: Decimal::from(supply.quantity),
        purchase_locations,
        last_used_date: supply.last_consumed_date.unwrap_or(supply.registered_at),
        first_registered_date: supply.registered_at,
        has_reviews: !reviews.is_empty(),
        review_count: reviews.len() as i64,
        archived_at: now,
        archived_by: archived_by.to_string(),
    }
}

/// Merge a new archival into the existing record for the same key
///
/// Identity fields stay with `existing`; the most recent archival wins the
/// timestamps. The stock average is the arithmetic mean of the two snapshots,
/// which undercounts items archived more than twice.
pub fn merge_history(existing: &SupplyHistory, incoming: &SupplyHistory) -> SupplyHistory {
    let mut purchase_locations = existing.purchase_locations.clone();
    purchase_locations.extend(incoming.purchase_locations.iter().cloned());

    SupplyHistory {
        id: existing.id,
        team_id: existing.team_id,
        name: existing.name.clone(),
        category: existing.category.clone(),
        unit: existing.unit.clone(),
        total_consumed: existing.total_consumed + incoming.total_consumed,
        average_stock: (existing.average_stock + incoming.average_stock) / Decimal::from(2),
        purchase_locations,
        last_used_date: incoming.last_used_date,
        first_registered_date: existing.first_registered_date,
        has_reviews: existing.has_reviews || incoming.has_reviews,
        review_count: existing.review_count + incoming.review_count,
        archived_at: incoming.archived_at,
        archived_by: incoming.archived_by.clone(),
    }
}

/// Whether a supply qualifies for the automatic archival sweep
///
/// Requires zero stock held continuously for longer than `threshold_days`.
pub fn is_auto_archive_candidate(
    supply: &Supply,
    now: DateTime<Utc>,
    threshold_days: i64,
) -> bool {
    if supply.quantity != 0 || supply.is_archived {
        return false;
    }
    match supply.zero_stock_since {
        Some(since) => since < now - Duration::days(threshold_days),
        None => false,
    }
}

/// Filter the supplies the sweep should archive
pub fn select_auto_archive_candidates<'a>(
    supplies: &'a [Supply],
    now: DateTime<Utc>,
    threshold_days: i64,
) -> Vec<&'a Supply> {
    supplies
        .iter()
        .filter(|s| is_auto_archive_candidate(s, now, threshold_days))
        .collect()
}
