//! Lot-based stock engine: consumption, restock and legacy-lot migration
//!
//! All functions here are pure and synchronous. They take one consistent
//! snapshot of a [`Supply`], mutate it in memory, and return a summary of
//! what changed. Persisting the result transactionally is the caller's
//! responsibility.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::models::{Lot, Supply};

/// Validation failures rejected before any mutation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StockError {
    #[error("Quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),

    #[error("Purchase price cannot be negative")]
    NegativePrice,
}

/// One slice of a consumption, attributed to the lot it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumedLot {
    pub date: NaiveDate,
    pub quantity: i64,
}

/// Result of a consumption operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumeOutcome {
    /// Per-lot breakdown in the order lots were drawn down
    pub consumed: Vec<ConsumedLot>,

    /// What the caller asked for
    pub requested: i64,

    /// What the lots could actually cover; less than `requested` when the
    /// request exceeded available stock
    pub fulfilled: i64,
}

/// Result of a restock operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestockOutcome {
    pub date: NaiveDate,
    pub added: i64,

    /// True when the quantity was merged into an existing lot with the same
    /// expiry date instead of creating a new one
    pub merged: bool,

    /// New total quantity across all lots
    pub total: i64,
}

/// Normalize a legacy single-lot record into the multi-lot representation
///
/// Records created before per-batch tracking carry only the flat
/// `quantity`/`expiry_date` pair. When such a record has stock but no lots,
/// synthesize one lot from the legacy fields so every later operation can
/// work on lots alone. Idempotent: a record that already has lots (or has no
/// stock) is left untouched.
pub fn ensure_lots(supply: &mut Supply, now: DateTime<Utc>) {
    if supply.lots.is_empty() && supply.quantity > 0 {
        let date = supply
            .expiry_date
            .unwrap_or_else(|| now.date_naive());
        supply.lots.push(Lot {
            date,
            quantity: supply.quantity,
            added_at: supply.registered_at,
            purchase_price: None,
        });
    }
}

/// Nearest expiry across lots, falling back to the legacy field
pub fn nearest_expiry(supply: &Supply) -> Option<NaiveDate> {
    supply
        .lots
        .iter()
        .map(|l| l.date)
        .min()
        .or(supply.expiry_date)
}

/// Total quantity across lots, falling back to the legacy field
pub fn total_quantity(supply: &Supply) -> i64 {
    if supply.lots.is_empty() {
        supply.quantity
    } else {
        supply.lots.iter().map(|l| l.quantity).sum()
    }
}

/// Consume `requested` units in first-expired-first-out order
///
/// Lots are drawn down earliest expiry first to minimize waste. A request
/// exceeding available stock drains every lot and silently drops the
/// unsatisfied remainder; `consumption_count` is still credited with the full
/// requested amount. The zero-stock marker is edge-triggered: it is stamped
/// only on a >0 to 0 crossing and cleared only on a 0 to >0 crossing.
pub fn consume(
    supply: &mut Supply,
    requested: i64,
    now: DateTime<Utc>,
) -> Result<ConsumeOutcome, StockError> {
    if requested <= 0 {
        return Err(StockError::NonPositiveQuantity(requested));
    }

    ensure_lots(supply, now);

    // Fallback if consumption empties every lot
    let previous_expiry = nearest_expiry(supply);

    supply.lots.sort_by_key(|l| l.date);

    let mut consumed = Vec::new();
    let mut remaining = requested;
    for lot in supply.lots.iter_mut() {
        if remaining == 0 {
            break;
        }
        let take = lot.quantity.min(remaining);
        consumed.push(ConsumedLot {
            date: lot.date,
            quantity: take,
        });
        lot.quantity -= take;
        remaining -= take;
    }

    supply.lots.retain(|l| l.quantity > 0);

    let new_total: i64 = supply.lots.iter().map(|l| l.quantity).sum();
    supply.quantity = new_total;
    supply.expiry_date = supply
        .lots
        .iter()
        .map(|l| l.date)
        .min()
        .or(previous_expiry);

    supply.last_consumed_date = Some(now);
    supply.consumption_count += requested;

    if new_total == 0 {
        if supply.zero_stock_since.is_none() {
            supply.zero_stock_since = Some(now);
        }
    } else if supply.zero_stock_since.is_some() {
        supply.zero_stock_since = None;
    }

    Ok(ConsumeOutcome {
        consumed,
        requested,
        fulfilled: requested - remaining,
    })
}

/// Add a purchased batch, merging into an existing lot with the same date
///
/// A supply sitting at zero stock starts from an empty lot list here; the
/// legacy expiry date is not resurrected into a phantom lot. Restocking
/// always ends a zero-stock period.
pub fn restock(
    supply: &mut Supply,
    quantity: i64,
    expiry_date: NaiveDate,
    purchase_price: Option<Decimal>,
    now: DateTime<Utc>,
) -> Result<RestockOutcome, StockError> {
    if quantity <= 0 {
        return Err(StockError::NonPositiveQuantity(quantity));
    }
    if matches!(purchase_price, Some(p) if p < Decimal::ZERO) {
        return Err(StockError::NegativePrice);
    }

    ensure_lots(supply, now);

    let merged = match supply.lots.iter_mut().find(|l| l.date == expiry_date) {
        Some(lot) => {
            lot.quantity += quantity;
            if purchase_price.is_some() {
                lot.purchase_price = purchase_price;
            }
            true
        }
        None => {
            supply.lots.push(Lot {
                date: expiry_date,
                quantity,
                added_at: now,
                purchase_price,
            });
            false
        }
    };

    let total: i64 = supply.lots.iter().map(|l| l.quantity).sum();
    supply.quantity = total;
    supply.expiry_date = supply.lots.iter().map(|l| l.date).min();
    supply.zero_stock_since = None;

    Ok(RestockOutcome {
        date: expiry_date,
        added: quantity,
        merged,
        total,
    })
}
