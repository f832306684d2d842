//! Stock lots and the ledger transition logic
//!
//! The ledger maps lot identities to on-hand quantities. Every
//! inventory-affecting event goes through [`plan_delta`]; no other code path
//! decides a lot quantity.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Currency precision used by the store (`NUMERIC(12,2)`).
pub const PRICE_SCALE: u32 = 2;

/// Identity of a stock lot.
///
/// Two events settle into the same lot if and only if product, supplier and
/// unit price all match. Prices are normalized to the store's currency
/// precision on construction and compared exactly, without tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LotKey {
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub price: Decimal,
}

impl LotKey {
    pub fn new(product_id: Uuid, supplier_id: Uuid, price: Decimal) -> Self {
        Self {
            product_id,
            supplier_id,
            price: price.round_dp(PRICE_SCALE),
        }
    }
}

impl fmt::Display for LotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "product {} from supplier {} at {}",
            self.product_id, self.supplier_id, self.price
        )
    }
}

/// A stock lot: one quantity of a product from one supplier at one fixed
/// unit price.
///
/// Quantity is never negative. A lot whose quantity reaches zero stays on
/// the books and may be replenished by a later arrival with the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLot {
    pub id: Uuid,
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub price: Decimal,
    pub unit_id: Uuid,
    pub quantity: Decimal,
}

impl StockLot {
    pub fn key(&self) -> LotKey {
        LotKey::new(self.product_id, self.supplier_id, self.price)
    }
}

/// Constraint violations raised by the stock ledger and the event appliers.
///
/// These are business-rule failures, not transient faults: they abort the
/// surrounding transaction and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// Debit against a lot that was never received.
    #[error("no stock lot exists for {key}")]
    UnknownLot { key: LotKey },

    /// Debit that would take the lot's quantity below zero.
    #[error("insufficient stock for {key}: on hand {on_hand}, requested {requested}")]
    InsufficientStock {
        key: LotKey,
        on_hand: Decimal,
        requested: Decimal,
    },

    /// The event's measurement unit does not match the unit already stored
    /// on the lot.
    #[error("unit mismatch for {key}")]
    InconsistentUnit {
        key: LotKey,
        lot_unit_id: Uuid,
        event_unit_id: Uuid,
    },

    /// The product return was already finalized.
    #[error("product return {id} is already spent")]
    AlreadySpent { id: Uuid },

    /// No lot matches the resolution keys for a spend or disposal.
    #[error("no stock lot matches {key}")]
    LotNotFound { key: LotKey },
}

/// Outcome of a ledger delta planned against the current lot state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerPlan {
    /// No lot existed for the key; create one holding `quantity`.
    Create { quantity: Decimal },
    /// The lot exists; write back `new_quantity`.
    Update { new_quantity: Decimal },
}

/// Decide how a signed quantity lands on a lot.
///
/// The caller holds the lot row locked for the duration of the surrounding
/// transaction; this function only decides, it never writes.
///
/// - absent lot, positive delta: the lot is created with the delta as its
///   quantity and the event's unit
/// - absent lot, zero or negative delta: [`StockError::UnknownLot`]
/// - existing lot with a different unit: [`StockError::InconsistentUnit`]
/// - existing lot where `quantity + delta` would go negative:
///   [`StockError::InsufficientStock`]
pub fn plan_delta(
    key: LotKey,
    existing: Option<&StockLot>,
    unit_id: Uuid,
    delta: Decimal,
) -> Result<LedgerPlan, StockError> {
    match existing {
        None => {
            if delta > Decimal::ZERO {
                Ok(LedgerPlan::Create { quantity: delta })
            } else {
                Err(StockError::UnknownLot { key })
            }
        }
        Some(lot) => {
            if lot.unit_id != unit_id {
                return Err(StockError::InconsistentUnit {
                    key,
                    lot_unit_id: lot.unit_id,
                    event_unit_id: unit_id,
                });
            }
            let new_quantity = lot.quantity + delta;
            if new_quantity < Decimal::ZERO {
                return Err(StockError::InsufficientStock {
                    key,
                    on_hand: lot.quantity,
                    requested: -delta,
                });
            }
            Ok(LedgerPlan::Update { new_quantity })
        }
    }
}
