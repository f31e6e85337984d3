//! Stock engine tests
//!
//! Tests for lot-based consumption and restocking including:
//! - Quantity invariant: total always equals the lot sum
//! - FEFO ordering: earliest expiry is consumed first
//! - Zero-stock transitions are edge-triggered

use chrono::{DateTime, NaiveDate, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use shared::models::{Lot, Supply};
use shared::stock::{consume, ensure_lots, nearest_expiry, restock, total_quantity, ConsumedLot};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn ts(s: &str) -> DateTime<Utc> {
    format!("{s}T00:00:00Z").parse().unwrap()
}

/// Supply with the given (expiry, quantity) lots
fn make_supply(lots: &[(&str, i64)]) -> Supply {
    let registered = ts("2025-01-01");
    let lots: Vec<Lot> = lots
        .iter()
        .map(|(d, q)| Lot {
            date: date(d),
            quantity: *q,
            added_at: registered,
            purchase_price: None,
        })
        .collect();
    let quantity = lots.iter().map(|l| l.quantity).sum();
    let expiry_date = lots.iter().map(|l| l.date).min();
    Supply {
        id: Uuid::new_v4(),
        team_id: Uuid::new_v4(),
        name: "保存水 2L".to_string(),
        category: "water".to_string(),
        unit: "本".to_string(),
        purchase_location: None,
        quantity,
        expiry_date,
        lots,
        consumption_count: 0,
        last_consumed_date: None,
        zero_stock_since: None,
        is_archived: false,
        registered_at: registered,
        updated_at: registered,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Earliest expiry is drawn down first, spilling into later lots
    #[test]
    fn test_fefo_consumption_order() {
        let mut supply = make_supply(&[("2025-03-01", 5), ("2025-01-01", 3)]);

        let outcome = consume(&mut supply, 4, ts("2025-01-02")).unwrap();

        assert_eq!(
            outcome.consumed,
            vec![
                ConsumedLot { date: date("2025-01-01"), quantity: 3 },
                ConsumedLot { date: date("2025-03-01"), quantity: 1 },
            ]
        );
        assert_eq!(supply.lots.len(), 1);
        assert_eq!(supply.lots[0].date, date("2025-03-01"));
        assert_eq!(supply.lots[0].quantity, 4);
    }

    /// Consuming a lot's full quantity removes the lot entirely
    #[test]
    fn test_exhausted_lot_is_pruned() {
        let mut supply = make_supply(&[("2025-01-01", 3), ("2025-03-01", 5)]);

        consume(&mut supply, 3, ts("2025-01-02")).unwrap();

        assert_eq!(supply.lots.len(), 1);
        assert!(supply.lots.iter().all(|l| l.quantity > 0));
        assert_eq!(supply.expiry_date, Some(date("2025-03-01")));
    }

    /// Consuming the last unit stamps the marker; a repeat no-op consume
    /// leaves it alone; a restock clears it
    #[test]
    fn test_zero_stock_edge_trigger() {
        let mut supply = make_supply(&[("2025-01-01", 1)]);

        consume(&mut supply, 1, ts("2025-02-01")).unwrap();
        assert_eq!(supply.zero_stock_since, Some(ts("2025-02-01")));

        consume(&mut supply, 1, ts("2025-02-10")).unwrap();
        assert_eq!(supply.zero_stock_since, Some(ts("2025-02-01")));

        restock(&mut supply, 2, date("2025-08-01"), None, ts("2025-02-20")).unwrap();
        assert_eq!(supply.zero_stock_since, None);
    }

    /// Restocking an existing date merges into one lot instead of two
    #[test]
    fn test_restock_merges_matching_date() {
        let mut supply = make_supply(&[("2025-06-01", 2)]);

        restock(&mut supply, 3, date("2025-06-01"), None, ts("2025-01-10")).unwrap();

        assert_eq!(supply.lots.len(), 1);
        assert_eq!(supply.lots[0].quantity, 5);
    }

    /// Over-consumption drains all lots and still credits the full request
    #[test]
    fn test_over_consumption_is_absorbed() {
        let mut supply = make_supply(&[("2025-01-01", 2), ("2025-02-01", 1)]);

        let outcome = consume(&mut supply, 10, ts("2025-01-02")).unwrap();

        assert_eq!(outcome.fulfilled, 3);
        assert_eq!(outcome.requested, 10);
        assert_eq!(supply.quantity, 0);
        assert!(supply.lots.is_empty());
        assert_eq!(supply.consumption_count, 10);
    }

    /// Legacy migration is idempotent
    #[test]
    fn test_ensure_lots_round_trip() {
        let mut supply = make_supply(&[]);
        supply.quantity = 4;
        supply.expiry_date = Some(date("2025-10-01"));

        ensure_lots(&mut supply, ts("2025-01-02"));
        let once = supply.lots.clone();
        ensure_lots(&mut supply, ts("2025-01-03"));

        assert_eq!(supply.lots, once);
        assert_eq!(total_quantity(&supply), 4);
    }

    /// Derived field helpers fall back to the legacy columns
    #[test]
    fn test_derived_field_fallbacks() {
        let mut supply = make_supply(&[]);
        supply.quantity = 7;
        supply.expiry_date = Some(date("2025-05-05"));

        assert_eq!(nearest_expiry(&supply), Some(date("2025-05-05")));
        assert_eq!(total_quantity(&supply), 7);

        supply.expiry_date = None;
        assert_eq!(nearest_expiry(&supply), None);
    }

    /// Consumption normalizes a legacy record before drawing down
    #[test]
    fn test_consume_migrates_legacy_record() {
        let mut supply = make_supply(&[]);
        supply.quantity = 5;
        supply.expiry_date = Some(date("2025-04-01"));

        let outcome = consume(&mut supply, 2, ts("2025-01-02")).unwrap();

        assert_eq!(outcome.fulfilled, 2);
        assert_eq!(supply.quantity, 3);
        assert_eq!(supply.lots.len(), 1);
        assert_eq!(supply.lots[0].date, date("2025-04-01"));
    }

    /// A zero-stock supply restocks from an empty lot list
    #[test]
    fn test_restock_from_zero_keeps_single_lot() {
        let mut supply = make_supply(&[]);
        supply.expiry_date = Some(date("2023-12-01"));

        restock(&mut supply, 6, date("2026-03-01"), None, ts("2025-01-10")).unwrap();

        assert_eq!(supply.lots.len(), 1);
        assert_eq!(supply.expiry_date, Some(date("2026-03-01")));
        assert_eq!(supply.quantity, 6);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    const BASE_DATE: &str = "2025-01-01";

    fn day_offset(days: i64) -> NaiveDate {
        date(BASE_DATE) + chrono::Duration::days(days)
    }

    /// Strategy for a single lot as (expiry offset in days, quantity)
    fn lot_strategy() -> impl Strategy<Value = (i64, i64)> {
        (0i64..720, 1i64..50)
    }

    /// One random engine operation
    #[derive(Debug, Clone)]
    enum Op {
        Consume(i64),
        Restock { days: i64, quantity: i64 },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1i64..80).prop_map(Op::Consume),
            (0i64..720, 1i64..50).prop_map(|(days, quantity)| Op::Restock { days, quantity }),
        ]
    }

    fn supply_from_lots(lots: Vec<(i64, i64)>) -> Supply {
        let spec: Vec<(String, i64)> = lots
            .into_iter()
            .map(|(d, q)| (day_offset(d).to_string(), q))
            .collect();
        let borrowed: Vec<(&str, i64)> = spec.iter().map(|(d, q)| (d.as_str(), *q)).collect();
        make_supply(&borrowed)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Quantity invariant: after every operation the derived total
        /// equals the sum of lot quantities and no empty lot survives
        #[test]
        fn prop_quantity_matches_lot_sum(
            initial in prop::collection::vec(lot_strategy(), 1..6),
            ops in prop::collection::vec(op_strategy(), 1..20)
        ) {
            let mut supply = supply_from_lots(initial);
            let mut clock = ts("2025-01-02");

            for op in ops {
                clock = clock + chrono::Duration::hours(1);
                match op {
                    Op::Consume(q) => {
                        consume(&mut supply, q, clock).unwrap();
                    }
                    Op::Restock { days, quantity } => {
                        restock(&mut supply, quantity, day_offset(days), None, clock).unwrap();
                    }
                }

                prop_assert!(supply.lots_consistent());
                prop_assert!(supply.quantity >= 0);
                prop_assert!(supply.lots.iter().all(|l| l.quantity > 0));
            }
        }

        /// The consumed breakdown is ordered by expiry date
        #[test]
        fn prop_breakdown_ordered_by_expiry(
            initial in prop::collection::vec(lot_strategy(), 1..6),
            requested in 1i64..200
        ) {
            let mut supply = supply_from_lots(initial);

            let outcome = consume(&mut supply, requested, ts("2025-01-02")).unwrap();

            let dates: Vec<NaiveDate> = outcome.consumed.iter().map(|c| c.date).collect();
            let mut sorted = dates.clone();
            sorted.sort();
            prop_assert_eq!(dates, sorted);
        }

        /// Fulfilled amount is capped by available stock, and the breakdown
        /// sums to exactly the fulfilled amount
        #[test]
        fn prop_fulfilled_is_min_of_request_and_stock(
            initial in prop::collection::vec(lot_strategy(), 1..6),
            requested in 1i64..300
        ) {
            let mut supply = supply_from_lots(initial);
            let available = supply.quantity;

            let outcome = consume(&mut supply, requested, ts("2025-01-02")).unwrap();

            prop_assert_eq!(outcome.fulfilled, requested.min(available));
            let breakdown_sum: i64 = outcome.consumed.iter().map(|c| c.quantity).sum();
            prop_assert_eq!(breakdown_sum, outcome.fulfilled);
            prop_assert_eq!(supply.quantity, available - outcome.fulfilled);
        }

        /// The consumption counter credits the requested amount, not the
        /// fulfilled amount
        #[test]
        fn prop_consumption_count_credits_request(
            initial in prop::collection::vec(lot_strategy(), 1..4),
            requests in prop::collection::vec(1i64..100, 1..10)
        ) {
            let mut supply = supply_from_lots(initial);
            let expected: i64 = requests.iter().sum();

            for (i, q) in requests.iter().enumerate() {
                let clock = ts("2025-01-02") + chrono::Duration::hours(i as i64);
                consume(&mut supply, *q, clock).unwrap();
            }

            prop_assert_eq!(supply.consumption_count, expected);
        }

        /// Restocking always increases the total by exactly the added amount
        #[test]
        fn prop_restock_adds_exactly(
            initial in prop::collection::vec(lot_strategy(), 0..4),
            days in 0i64..720,
            quantity in 1i64..100
        ) {
            let mut supply = supply_from_lots(initial);
            let before = supply.quantity;

            let outcome =
                restock(&mut supply, quantity, day_offset(days), None, ts("2025-01-02")).unwrap();

            prop_assert_eq!(supply.quantity, before + quantity);
            prop_assert_eq!(outcome.total, supply.quantity);
            prop_assert_eq!(supply.zero_stock_since, None);
        }

        /// The zero-stock marker agrees with the quantity after every
        /// operation
        #[test]
        fn prop_zero_stock_marker_tracks_quantity(
            initial in prop::collection::vec(lot_strategy(), 1..4),
            ops in prop::collection::vec(op_strategy(), 1..20)
        ) {
            let mut supply = supply_from_lots(initial);
            let mut clock = ts("2025-01-02");

            for op in ops {
                clock = clock + chrono::Duration::hours(1);
                match op {
                    Op::Consume(q) => {
                        consume(&mut supply, q, clock).unwrap();
                    }
                    Op::Restock { days, quantity } => {
                        restock(&mut supply, quantity, day_offset(days), None, clock).unwrap();
                    }
                }

                prop_assert_eq!(supply.quantity == 0, supply.zero_stock_since.is_some());
            }
        }

        /// The nearest-expiry field always matches the minimum lot date
        /// while lots exist
        #[test]
        fn prop_expiry_tracks_minimum_lot_date(
            initial in prop::collection::vec(lot_strategy(), 1..6),
            ops in prop::collection::vec(op_strategy(), 1..15)
        ) {
            let mut supply = supply_from_lots(initial);
            let mut clock = ts("2025-01-02");

            for op in ops {
                clock = clock + chrono::Duration::hours(1);
                match op {
                    Op::Consume(q) => {
                        consume(&mut supply, q, clock).unwrap();
                    }
                    Op::Restock { days, quantity } => {
                        restock(&mut supply, quantity, day_offset(days), None, clock).unwrap();
                    }
                }

                if !supply.lots.is_empty() {
                    let min_date = supply.lots.iter().map(|l| l.date).min();
                    prop_assert_eq!(supply.expiry_date, min_date);
                }
            }
        }
    }
}
