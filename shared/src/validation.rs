//! Validation utilities for the Stockpile Management Platform

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Maximum length accepted for supply names
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length accepted for free-text fields (category, unit, location)
pub const MAX_LABEL_LENGTH: usize = 50;

// ============================================================================
// Stock Validations
// ============================================================================

/// Validate a consume/restock quantity is a positive integer
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be a positive integer");
    }
    Ok(())
}

/// Validate and parse an expiry date string (ISO calendar date)
pub fn validate_expiry_date(date: &str) -> Result<NaiveDate, &'static str> {
    if date.trim().is_empty() {
        return Err("Expiry date is required");
    }
    date.parse()
        .map_err(|_| "Expiry date must be an ISO date (YYYY-MM-DD)")
}

/// Validate an optional purchase price is not negative
pub fn validate_purchase_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Purchase price cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Supply Field Validations
// ============================================================================

/// Validate a supply name is present and within bounds
pub fn validate_supply_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Supply name cannot be empty");
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err("Supply name is too long");
    }
    Ok(())
}

/// Validate a short label field (category, unit, purchase location)
pub fn validate_label(label: &str) -> Result<(), &'static str> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err("Field cannot be empty");
    }
    if trimmed.chars().count() > MAX_LABEL_LENGTH {
        return Err("Field is too long");
    }
    Ok(())
}

/// Validate a review rating (1-5 stars)
pub fn validate_rating(rating: i16) -> Result<(), &'static str> {
    if !(1..=5).contains(&rating) {
        return Err("Rating must be between 1 and 5");
    }
    Ok(())
}

// ============================================================================
// Category Suggestions
// ============================================================================

/// Well-known emergency supply categories
pub const SUPPLY_CATEGORIES: &[&str] = &[
    "water",
    "staple_food",
    "canned_goods",
    "retort_food",
    "seasoning",
    "medicine",
    "hygiene",
    "battery_fuel",
    "other",
];

/// Japanese display names, index-aligned with [`SUPPLY_CATEGORIES`]
pub const SUPPLY_CATEGORIES_JA: &[&str] = &[
    "飲料水",
    "主食",
    "缶詰",
    "レトルト食品",
    "調味料",
    "医薬品",
    "衛生用品",
    "電池・燃料",
    "その他",
];

/// Whether a category is one of the suggested ones. Categories are free-form;
/// unknown values are accepted, this only drives UI hints.
pub fn is_known_category(category: &str) -> bool {
    SUPPLY_CATEGORIES.contains(&category)
}
