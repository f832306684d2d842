//! Sale-consume applier tests
//!
//! A sale debits every lot it draws on, all-or-nothing across the whole
//! sale. Lines naming the same lot are folded together first, so a single
//! sale can never jointly draw more than a lot has on hand.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{plan_delta, LedgerPlan, StockError, StockLot};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn make_lot(quantity: Decimal) -> StockLot {
    StockLot {
        id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        supplier_id: Uuid::new_v4(),
        price: dec("100.00"),
        unit_id: Uuid::new_v4(),
        quantity,
    }
}

/// Consume sale lines against a snapshot of the stock, the way the applier
/// does inside one transaction: fold lines per lot, debit each lot in id
/// order, and replace the real stock only if every debit succeeded.
fn consume(
    stock: &mut HashMap<Uuid, StockLot>,
    lines: &[(Uuid, Decimal)],
) -> Result<(), StockError> {
    let mut per_lot: BTreeMap<Uuid, Decimal> = BTreeMap::new();
    for (stock_id, count) in lines {
        *per_lot.entry(*stock_id).or_insert(Decimal::ZERO) += *count;
    }

    let mut snapshot = stock.clone();
    for (stock_id, count) in per_lot {
        let lot = snapshot
            .get(&stock_id)
            .expect("line references an existing lot")
            .clone();

        match plan_delta(lot.key(), Some(&lot), lot.unit_id, -count)? {
            LedgerPlan::Update { new_quantity } => {
                if let Some(entry) = snapshot.get_mut(&stock_id) {
                    entry.quantity = new_quantity;
                }
            }
            LedgerPlan::Create { .. } => unreachable!("consumption never creates a lot"),
        }
    }

    *stock = snapshot;
    Ok(())
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_sale_debits_each_referenced_lot() {
        let a = make_lot(dec("10"));
        let b = make_lot(dec("4"));
        let mut stock = HashMap::from([(a.id, a.clone()), (b.id, b.clone())]);

        consume(&mut stock, &[(a.id, dec("3")), (b.id, dec("4"))]).unwrap();

        assert_eq!(stock.get(&a.id).unwrap().quantity, dec("7"));
        assert_eq!(stock.get(&b.id).unwrap().quantity, Decimal::ZERO);
    }

    /// Two lines drawing 10 + 10 from a lot of 15 are folded together and
    /// rejected whole: the same unit cannot be sold twice.
    #[test]
    fn test_joint_overconsumption_of_one_lot_is_rejected() {
        let lot = make_lot(dec("15"));
        let mut stock = HashMap::from([(lot.id, lot.clone())]);

        let err = consume(&mut stock, &[(lot.id, dec("10")), (lot.id, dec("10"))]).unwrap_err();

        assert!(matches!(err, StockError::InsufficientStock { .. }));
        assert_eq!(stock.get(&lot.id).unwrap().quantity, dec("15"));
    }

    #[test]
    fn test_joint_consumption_within_bounds_accumulates() {
        let lot = make_lot(dec("15"));
        let mut stock = HashMap::from([(lot.id, lot.clone())]);

        consume(&mut stock, &[(lot.id, dec("10")), (lot.id, dec("5"))]).unwrap();

        assert_eq!(stock.get(&lot.id).unwrap().quantity, Decimal::ZERO);
    }

    /// All-or-nothing: one short lot rejects the whole sale, including the
    /// debits that would have succeeded on their own.
    #[test]
    fn test_one_short_lot_rejects_the_whole_sale() {
        let a = make_lot(dec("10"));
        let b = make_lot(dec("2"));
        let mut stock = HashMap::from([(a.id, a.clone()), (b.id, b.clone())]);
        let before = stock.clone();

        let err = consume(&mut stock, &[(a.id, dec("3")), (b.id, dec("5"))]).unwrap_err();

        assert!(matches!(err, StockError::InsufficientStock { .. }));
        assert_eq!(stock, before);
    }

    #[test]
    fn test_sale_without_lines_touches_nothing() {
        let lot = make_lot(dec("10"));
        let mut stock = HashMap::from([(lot.id, lot.clone())]);
        let before = stock.clone();

        consume(&mut stock, &[]).unwrap();

        assert_eq!(stock, before);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10_000i64).prop_map(|n| Decimal::new(n, 1))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// However a sale's lines are split across a lot, the fold accepts
        /// them exactly when their sum is covered by the on-hand quantity.
        #[test]
        fn prop_fold_accepts_iff_total_covered(
            on_hand in quantity_strategy(),
            parts in prop::collection::vec(quantity_strategy(), 1..6)
        ) {
            let lot = make_lot(on_hand);
            let mut stock = HashMap::from([(lot.id, lot.clone())]);
            let lines: Vec<(Uuid, Decimal)> = parts.iter().map(|p| (lot.id, *p)).collect();
            let total: Decimal = parts.iter().sum();

            let result = consume(&mut stock, &lines);
            if total <= on_hand {
                prop_assert!(result.is_ok());
                prop_assert_eq!(stock.get(&lot.id).unwrap().quantity, on_hand - total);
            } else {
                prop_assert!(result.is_err());
                prop_assert_eq!(stock.get(&lot.id).unwrap().quantity, on_hand);
            }
        }

        /// A rejected sale never leaves a partial debit behind.
        #[test]
        fn prop_rejected_sale_changes_nothing(
            quantities in prop::collection::vec(quantity_strategy(), 2..6)
        ) {
            let lots: Vec<StockLot> = quantities.iter().map(|q| make_lot(*q)).collect();
            let mut stock: HashMap<Uuid, StockLot> =
                lots.iter().map(|l| (l.id, l.clone())).collect();
            let before = stock.clone();

            // Draw everything from every lot, plus one over on the last
            let mut lines: Vec<(Uuid, Decimal)> =
                lots.iter().map(|l| (l.id, l.quantity)).collect();
            if let Some(last) = lines.last_mut() {
                last.1 += dec("0.1");
            }

            prop_assert!(consume(&mut stock, &lines).is_err());
            prop_assert_eq!(stock, before);
        }
    }
}
