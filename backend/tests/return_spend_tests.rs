//! Return-spend applier tests
//!
//! A product return is a promise: created pending, no ledger effect. The
//! spend transition is the only mutation path, is irreversible, debits the
//! lot exactly once and fails cleanly when the lot is missing or short.

use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{plan_delta, LedgerPlan, LotKey, ReturnStatus, StockError, StockLot};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// A return record plus the lot it resolves against, driven through the
/// same gate order the service uses: status first, lot second, quantity
/// third, then both writes.
struct ReturnFixture {
    status: ReturnStatus,
    count: Decimal,
    key: LotKey,
    lot: Option<StockLot>,
}

impl ReturnFixture {
    fn new(count: Decimal, on_hand: Option<Decimal>) -> Self {
        let key = LotKey::new(Uuid::new_v4(), Uuid::new_v4(), dec("100.00"));
        let unit = Uuid::new_v4();
        let lot = on_hand.map(|quantity| StockLot {
            id: Uuid::new_v4(),
            product_id: key.product_id,
            supplier_id: key.supplier_id,
            price: key.price,
            unit_id: unit,
            quantity,
        });
        Self {
            status: ReturnStatus::Pending,
            count,
            key,
            lot,
        }
    }

    fn spend(&mut self) -> Result<Decimal, StockError> {
        if self.status == ReturnStatus::Spent {
            return Err(StockError::AlreadySpent { id: Uuid::nil() });
        }

        let lot = self
            .lot
            .as_ref()
            .ok_or(StockError::LotNotFound { key: self.key })?;

        match plan_delta(self.key, Some(lot), lot.unit_id, -self.count)? {
            LedgerPlan::Update { new_quantity } => {
                // Both writes commit together
                if let Some(lot) = self.lot.as_mut() {
                    lot.quantity = new_quantity;
                }
                self.status = ReturnStatus::Spent;
                Ok(new_quantity)
            }
            LedgerPlan::Create { .. } => unreachable!("spend never creates a lot"),
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_spend_debits_lot_and_finalizes() {
        let mut fixture = ReturnFixture::new(dec("5"), Some(dec("20")));

        assert_eq!(fixture.spend().unwrap(), dec("15"));
        assert_eq!(fixture.status, ReturnStatus::Spent);
    }

    /// Spending twice succeeds once; the second attempt fails AlreadySpent
    /// and the ledger is debited exactly once.
    #[test]
    fn test_second_spend_fails_already_spent() {
        let mut fixture = ReturnFixture::new(dec("5"), Some(dec("20")));

        fixture.spend().unwrap();
        let err = fixture.spend().unwrap_err();

        assert!(matches!(err, StockError::AlreadySpent { .. }));
        assert_eq!(fixture.lot.as_ref().unwrap().quantity, dec("15"));
    }

    #[test]
    fn test_spend_without_matching_lot_fails() {
        let mut fixture = ReturnFixture::new(dec("5"), None);

        let err = fixture.spend().unwrap_err();
        assert_eq!(err, StockError::LotNotFound { key: fixture.key });
        assert_eq!(fixture.status, ReturnStatus::Pending);
    }

    /// A failed spend leaves everything unchanged: status stays pending,
    /// the lot keeps its quantity, and the spend can be retried later.
    #[test]
    fn test_short_lot_fails_and_leaves_state_unchanged() {
        let mut fixture = ReturnFixture::new(dec("25"), Some(dec("20")));

        let err = fixture.spend().unwrap_err();
        assert!(matches!(err, StockError::InsufficientStock { .. }));
        assert_eq!(fixture.status, ReturnStatus::Pending);
        assert_eq!(fixture.lot.as_ref().unwrap().quantity, dec("20"));

        // After a replenishing arrival the same return spends fine
        fixture.lot.as_mut().unwrap().quantity = dec("30");
        assert_eq!(fixture.spend().unwrap(), dec("5"));
    }

    #[test]
    fn test_spend_of_entire_lot_is_allowed() {
        let mut fixture = ReturnFixture::new(dec("20"), Some(dec("20")));

        assert_eq!(fixture.spend().unwrap(), Decimal::ZERO);
        assert_eq!(fixture.status, ReturnStatus::Spent);
    }

    #[test]
    fn test_return_status_codes_round_trip() {
        assert_eq!(ReturnStatus::Pending.code(), 0);
        assert_eq!(ReturnStatus::Spent.code(), 1);
        assert_eq!(ReturnStatus::from_code(0), Some(ReturnStatus::Pending));
        assert_eq!(ReturnStatus::from_code(1), Some(ReturnStatus::Spent));
        assert_eq!(ReturnStatus::from_code(2), None);
    }

    #[test]
    fn test_spent_is_terminal() {
        assert!(ReturnStatus::Pending.can_transition(ReturnStatus::Spent));
        assert!(!ReturnStatus::Spent.can_transition(ReturnStatus::Pending));
        assert!(!ReturnStatus::Spent.can_transition(ReturnStatus::Spent));
        assert!(!ReturnStatus::Pending.can_transition(ReturnStatus::Pending));
    }
}
