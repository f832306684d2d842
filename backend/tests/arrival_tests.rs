//! Arrival applier tests
//!
//! An arrival is one invoice with many items; every item posts one credit
//! to the lot keyed by (product, supplier, retail price). The whole invoice
//! is atomic: one bad item discards every credit and every record.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{plan_delta, ArrivalStatus, LedgerPlan, LotKey, StockError, StockLot};
use shared::validation::validate_positive_quantity;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct Item {
    product_id: Uuid,
    unit_id: Uuid,
    count: Decimal,
    retail_price: Decimal,
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

/// Post every item of an invoice against a snapshot of the ledger, the way
/// the applier does inside one transaction: the snapshot replaces the real
/// ledger only if every single credit succeeded.
fn post_invoice(
    ledger: &mut HashMap<LotKey, StockLot>,
    supplier_id: Uuid,
    items: &[Item],
) -> Result<(), StockError> {
    let mut snapshot = ledger.clone();

    for item in items {
        let key = LotKey::new(item.product_id, supplier_id, item.retail_price);
        match plan_delta(key, snapshot.get(&key), item.unit_id, item.count)? {
            LedgerPlan::Create { quantity } => {
                snapshot.insert(key, make_lot(key, item.unit_id, quantity));
            }
            LedgerPlan::Update { new_quantity } => {
                if let Some(lot) = snapshot.get_mut(&key) {
                    lot.quantity = new_quantity;
                }
            }
        }
    }

    *ledger = snapshot;
    Ok(())
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_single_item_arrival_credits_lot() {
        let mut ledger = HashMap::new();
        let supplier = Uuid::new_v4();
        let item = Item {
            product_id: Uuid::new_v4(),
            unit_id: Uuid::new_v4(),
            count: dec("20"),
            retail_price: dec("100.0"),
        };

        post_invoice(&mut ledger, supplier, &[item]).unwrap();

        let key = LotKey::new(
            ledger.values().next().unwrap().product_id,
            supplier,
            dec("100.0"),
        );
        assert_eq!(ledger.get(&key).unwrap().quantity, dec("20"));
    }

    #[test]
    fn test_same_key_items_merge_into_one_lot() {
        let mut ledger = HashMap::new();
        let supplier = Uuid::new_v4();
        let product = Uuid::new_v4();
        let unit = Uuid::new_v4();

        let items = [
            Item {
                product_id: product,
                unit_id: unit,
                count: dec("5"),
                retail_price: dec("100.00"),
            },
            Item {
                product_id: product,
                unit_id: unit,
                count: dec("7"),
                retail_price: dec("100.0"),
            },
        ];

        post_invoice(&mut ledger, supplier, &items).unwrap();

        assert_eq!(ledger.len(), 1);
        let key = LotKey::new(product, supplier, dec("100.00"));
        assert_eq!(ledger.get(&key).unwrap().quantity, dec("12"));
    }

    #[test]
    fn test_different_price_makes_a_different_lot() {
        let mut ledger = HashMap::new();
        let supplier = Uuid::new_v4();
        let product = Uuid::new_v4();
        let unit = Uuid::new_v4();

        let items = [
            Item {
                product_id: product,
                unit_id: unit,
                count: dec("5"),
                retail_price: dec("100.00"),
            },
            Item {
                product_id: product,
                unit_id: unit,
                count: dec("5"),
                retail_price: dec("110.00"),
            },
        ];

        post_invoice(&mut ledger, supplier, &items).unwrap();
        assert_eq!(ledger.len(), 2);
    }

    /// Atomicity: a 3-item invoice whose middle item has a mismatched unit
    /// leaves nothing behind, not even the credits of items 1 and 3.
    #[test]
    fn test_bad_middle_item_discards_whole_invoice() {
        let supplier = Uuid::new_v4();
        let product = Uuid::new_v4();
        let pieces = Uuid::new_v4();
        let litres = Uuid::new_v4();

        // Pre-existing lot measured in pieces
        let key = LotKey::new(product, supplier, dec("100.00"));
        let mut ledger = HashMap::new();
        ledger.insert(key, make_lot(key, pieces, dec("10")));
        let before = ledger.clone();

        let items = [
            Item {
                product_id: Uuid::new_v4(),
                unit_id: pieces,
                count: dec("4"),
                retail_price: dec("50.00"),
            },
            // Same key as the existing lot but measured in litres
            Item {
                product_id: product,
                unit_id: litres,
                count: dec("2"),
                retail_price: dec("100.00"),
            },
            Item {
                product_id: Uuid::new_v4(),
                unit_id: pieces,
                count: dec("9"),
                retail_price: dec("70.00"),
            },
        ];

        let err = post_invoice(&mut ledger, supplier, &items).unwrap_err();
        assert!(matches!(err, StockError::InconsistentUnit { .. }));

        // No partial application
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_zero_count_item_is_rejected_up_front() {
        assert!(validate_positive_quantity(Decimal::ZERO).is_err());
        assert!(validate_positive_quantity(dec("-1")).is_err());
        assert!(validate_positive_quantity(dec("0.001")).is_ok());
    }

    #[test]
    fn test_arrival_default_status_is_open() {
        assert_eq!(ArrivalStatus::default(), ArrivalStatus::Open);
        assert_eq!(ArrivalStatus::default().code(), 1);
    }

    #[test]
    fn test_arrival_status_codes_round_trip() {
        for status in [
            ArrivalStatus::Draft,
            ArrivalStatus::Open,
            ArrivalStatus::Reconciled,
            ArrivalStatus::Cancelled,
        ] {
            assert_eq!(ArrivalStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(ArrivalStatus::from_code(7), None);
    }

    #[test]
    fn test_arrival_status_transitions() {
        use ArrivalStatus::*;

        assert!(Draft.can_transition(Open));
        assert!(Open.can_transition(Reconciled));
        assert!(Open.can_transition(Cancelled));

        // No way back and no skipping
        assert!(!Open.can_transition(Draft));
        assert!(!Draft.can_transition(Reconciled));
        assert!(!Reconciled.can_transition(Open));
        assert!(!Cancelled.can_transition(Open));
        assert!(!Reconciled.can_transition(Cancelled));
    }
}
