//! Stock ledger tests
//!
//! Covers the ledger transition function behind every event applier:
//! - lot creation on first credit, merge on later credits
//! - non-negativity: debits never take a lot below zero
//! - unit consistency across merges into the same lot
//! - conservation: on-hand quantity equals the sum of applied deltas

use std::collections::HashMap;
use std::str::FromStr;

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{plan_delta, LedgerPlan, LotKey, StockError, StockLot};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn make_lot(key: LotKey, unit_id: Uuid, quantity: Decimal) -> StockLot {
    StockLot {
        id: Uuid::new_v4(),
        product_id: key.product_id,
        supplier_id: key.supplier_id,
        price: key.price,
        unit_id,
        quantity,
    }
}

/// Apply a planned delta to an in-memory ledger, mirroring what the SQL
/// layer does under the row lock: plan first, then either insert or write
/// back. A failed plan leaves the ledger untouched.
fn apply(
    ledger: &mut HashMap<LotKey, StockLot>,
    key: LotKey,
    unit_id: Uuid,
    delta: Decimal,
) -> Result<Decimal, StockError> {
    match plan_delta(key, ledger.get(&key), unit_id, delta)? {
        LedgerPlan::Create { quantity } => {
            ledger.insert(key, make_lot(key, unit_id, quantity));
            Ok(quantity)
        }
        LedgerPlan::Update { new_quantity } => {
            if let Some(lot) = ledger.get_mut(&key) {
                lot.quantity = new_quantity;
            }
            Ok(new_quantity)
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_credit_creates_missing_lot() {
        let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("100.00"));
        let unit = Uuid::new_v4();

        let plan = plan_delta(key, None, unit, dec("20")).unwrap();
        assert_eq!(
            plan,
            LedgerPlan::Create {
                quantity: dec("20")
            }
        );
    }

    #[test]
    fn test_debit_against_missing_lot_fails() {
        let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("100.00"));
        let unit = Uuid::new_v4();

        let err = plan_delta(key, None, unit, dec("-5")).unwrap_err();
        assert_eq!(err, StockError::UnknownLot { key });
    }

    #[test]
    fn test_zero_delta_against_missing_lot_fails() {
        let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("100.00"));
        let unit = Uuid::new_v4();

        // Cannot seed a lot with nothing
        let err = plan_delta(key, None, unit, Decimal::ZERO).unwrap_err();
        assert_eq!(err, StockError::UnknownLot { key });
    }

    #[test]
    fn test_credit_merges_into_existing_lot() {
        let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("100.00"));
        let unit = Uuid::new_v4();
        let lot = make_lot(key, unit, dec("7.5"));

        let plan = plan_delta(key, Some(&lot), unit, dec("2.5")).unwrap();
        assert_eq!(
            plan,
            LedgerPlan::Update {
                new_quantity: dec("10.0")
            }
        );
    }

    #[test]
    fn test_debit_below_zero_fails() {
        let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("100.00"));
        let unit = Uuid::new_v4();
        let lot = make_lot(key, unit, dec("15"));

        let err = plan_delta(key, Some(&lot), unit, dec("-20")).unwrap_err();
        assert_eq!(
            err,
            StockError::InsufficientStock {
                key,
                on_hand: dec("15"),
                requested: dec("20"),
            }
        );
    }

    #[test]
    fn test_debit_to_exactly_zero_is_allowed() {
        let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("100.00"));
        let unit = Uuid::new_v4();
        let lot = make_lot(key, unit, dec("15"));

        let plan = plan_delta(key, Some(&lot), unit, dec("-15")).unwrap();
        assert_eq!(
            plan,
            LedgerPlan::Update {
                new_quantity: Decimal::ZERO
            }
        );
    }

    #[test]
    fn test_unit_mismatch_is_rejected_not_overwritten() {
        let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("100.00"));
        let pieces = Uuid::new_v4();
        let litres = Uuid::new_v4();
        let lot = make_lot(key, pieces, dec("10"));

        let err = plan_delta(key, Some(&lot), litres, dec("5")).unwrap_err();
        assert_eq!(
            err,
            StockError::InconsistentUnit {
                key,
                lot_unit_id: pieces,
                event_unit_id: litres,
            }
        );
    }

    /// Zero-count disposal boundary: a no-op, not an error
    #[test]
    fn test_zero_delta_on_existing_lot_is_noop() {
        let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("100.00"));
        let unit = Uuid::new_v4();
        let lot = make_lot(key, unit, dec("15"));

        let plan = plan_delta(key, Some(&lot), unit, Decimal::ZERO).unwrap();
        assert_eq!(
            plan,
            LedgerPlan::Update {
                new_quantity: dec("15")
            }
        );
    }

    #[test]
    fn test_lot_key_price_is_normalized_to_currency_precision() {
        let product = Uuid::new_v4();
        let supplier = Uuid::new_v4();

        let a = LotKey::new(product, supplier, dec("100.0"));
        let b = LotKey::new(product, supplier, dec("100.00"));
        assert_eq!(a, b);

        // A different price is a different lot, no tolerance
        let c = LotKey::new(product, supplier, dec("100.01"));
        assert_ne!(a, c);
    }

    #[test]
    fn test_lot_key_requires_all_three_fields_to_match() {
        let product = Uuid::new_v4();
        let supplier = Uuid::new_v4();
        let price = dec("100.00");

        let base = LotKey::new(product, supplier, price);
        assert_ne!(base, LotKey::new(Uuid::new_v4(), supplier, price));
        assert_ne!(base, LotKey::new(product, Uuid::new_v4(), price));
    }

    /// Scenario A: arrival creates the lot, a return-spend debits it, an
    /// oversized disposal fails and leaves the quantity unchanged.
    #[test]
    fn test_arrival_spend_disposal_scenario() {
        let mut ledger = HashMap::new();
        let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("100.0"));
        let unit = Uuid::new_v4();

        // Arrival of 20 creates the lot
        assert_eq!(apply(&mut ledger, key, unit, dec("20")).unwrap(), dec("20"));

        // Return-spend of 5
        assert_eq!(apply(&mut ledger, key, unit, dec("-5")).unwrap(), dec("15"));

        // Disposal of 20 fails, quantity stays 15
        let err = apply(&mut ledger, key, unit, dec("-20")).unwrap_err();
        assert!(matches!(err, StockError::InsufficientStock { .. }));
        assert_eq!(ledger.get(&key).unwrap().quantity, dec("15"));
    }

    /// Scenario B: two debits of 10 against a lot of 15. The row lock
    /// serializes them; whichever goes second sees quantity 5 and fails.
    /// Exactly one winner, never both.
    #[test]
    fn test_concurrent_debits_serialize_to_one_winner() {
        let mut ledger = HashMap::new();
        let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("50.00"));
        let unit = Uuid::new_v4();

        apply(&mut ledger, key, unit, dec("15")).unwrap();

        let first = apply(&mut ledger, key, unit, dec("-10"));
        let second = apply(&mut ledger, key, unit, dec("-10"));

        assert_eq!(first.unwrap(), dec("5"));
        assert!(matches!(
            second.unwrap_err(),
            StockError::InsufficientStock { .. }
        ));
        assert_eq!(ledger.get(&key).unwrap().quantity, dec("5"));
    }

    #[test]
    fn test_lot_replenished_after_reaching_zero() {
        let mut ledger = HashMap::new();
        let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("10.00"));
        let unit = Uuid::new_v4();

        apply(&mut ledger, key, unit, dec("8")).unwrap();
        apply(&mut ledger, key, unit, dec("-8")).unwrap();

        // Empty but still on the books
        assert_eq!(ledger.get(&key).unwrap().quantity, Decimal::ZERO);

        // A later arrival with the same key replenishes the same lot
        assert_eq!(apply(&mut ledger, key, unit, dec("3")).unwrap(), dec("3"));
        assert_eq!(ledger.len(), 1);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating positive quantities (0.1 to 1000.0)
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10_000i64).prop_map(|n| Decimal::new(n, 1))
    }

    /// Strategy for generating signed deltas (-1000.0 to 1000.0, non-zero)
    fn delta_strategy() -> impl Strategy<Value = Decimal> {
        prop_oneof![
            (1i64..=10_000i64).prop_map(|n| Decimal::new(n, 1)),
            (1i64..=10_000i64).prop_map(|n| -Decimal::new(n, 1)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// The quantity is never observable below zero, whatever sequence of
        /// credits and debits is thrown at the lot.
        #[test]
        fn prop_quantity_never_negative(deltas in prop::collection::vec(delta_strategy(), 1..40)) {
            let mut ledger = HashMap::new();
            let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("100.00"));
            let unit = Uuid::new_v4();

            for delta in deltas {
                // Failed applications leave the ledger unchanged
                let _ = apply(&mut ledger, key, unit, delta);
                if let Some(lot) = ledger.get(&key) {
                    prop_assert!(lot.quantity >= Decimal::ZERO);
                }
            }
        }

        /// Conservation: the on-hand quantity equals the sum of the deltas
        /// that were actually applied, reconstructible from the event log.
        #[test]
        fn prop_quantity_equals_sum_of_applied_deltas(
            deltas in prop::collection::vec(delta_strategy(), 1..40)
        ) {
            let mut ledger = HashMap::new();
            let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("100.00"));
            let unit = Uuid::new_v4();
            let mut applied = Decimal::ZERO;

            for delta in deltas {
                if apply(&mut ledger, key, unit, delta).is_ok() {
                    applied += delta;
                }
            }

            let on_hand = ledger.get(&key).map(|l| l.quantity).unwrap_or(Decimal::ZERO);
            prop_assert_eq!(on_hand, applied);
        }

        /// A lot can only ever come into existence through a credit.
        #[test]
        fn prop_lot_created_only_by_credit(delta in delta_strategy()) {
            let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("100.00"));
            let unit = Uuid::new_v4();

            let result = plan_delta(key, None, unit, delta);
            if delta > Decimal::ZERO {
                prop_assert_eq!(result.unwrap(), LedgerPlan::Create { quantity: delta });
            } else {
                prop_assert_eq!(result.unwrap_err(), StockError::UnknownLot { key });
            }
        }

        /// A debit succeeds exactly when the lot holds enough.
        #[test]
        fn prop_debit_succeeds_iff_covered(
            on_hand in quantity_strategy(),
            requested in quantity_strategy()
        ) {
            let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("100.00"));
            let unit = Uuid::new_v4();
            let lot = make_lot(key, unit, on_hand);

            let result = plan_delta(key, Some(&lot), unit, -requested);
            if requested <= on_hand {
                prop_assert_eq!(
                    result.unwrap(),
                    LedgerPlan::Update { new_quantity: on_hand - requested }
                );
            } else {
                prop_assert_eq!(
                    result.unwrap_err(),
                    StockError::InsufficientStock { key, on_hand, requested }
                );
            }
        }

        /// Credits and debits of the same total amount cancel out.
        #[test]
        fn prop_full_withdrawal_leaves_zero(amounts in prop::collection::vec(quantity_strategy(), 1..20)) {
            let mut ledger = HashMap::new();
            let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("100.00"));
            let unit = Uuid::new_v4();

            for amount in &amounts {
                apply(&mut ledger, key, unit, *amount).unwrap();
            }
            let total: Decimal = amounts.iter().sum();
            apply(&mut ledger, key, unit, -total).unwrap();

            prop_assert_eq!(ledger.get(&key).unwrap().quantity, Decimal::ZERO);
        }
    }
}
