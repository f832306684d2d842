//! Inventory-affecting event records and their status lifecycles
//!
//! Statuses are closed enumerations persisted as small integers; the
//! transition tables live next to the enums so every state change goes
//! through `can_transition`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Arrival lifecycle.
///
/// Transitions: Draft -> Open, Open -> Reconciled, Open -> Cancelled.
/// Status edits are bookkeeping annotations; they never re-post stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalStatus {
    Draft,
    Open,
    Reconciled,
    Cancelled,
}

impl ArrivalStatus {
    pub fn code(&self) -> i16 {
        match self {
            ArrivalStatus::Draft => 0,
            ArrivalStatus::Open => 1,
            ArrivalStatus::Reconciled => 2,
            ArrivalStatus::Cancelled => 3,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(ArrivalStatus::Draft),
            1 => Some(ArrivalStatus::Open),
            2 => Some(ArrivalStatus::Reconciled),
            3 => Some(ArrivalStatus::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition(&self, next: ArrivalStatus) -> bool {
        matches!(
            (self, next),
            (ArrivalStatus::Draft, ArrivalStatus::Open)
                | (ArrivalStatus::Open, ArrivalStatus::Reconciled)
                | (ArrivalStatus::Open, ArrivalStatus::Cancelled)
        )
    }
}

impl Default for ArrivalStatus {
    fn default() -> Self {
        ArrivalStatus::Open
    }
}

/// Product return lifecycle.
///
/// A return is created `Pending` (a promise of returned stock with no ledger
/// effect). `Pending -> Spent` is the only transition and is irreversible;
/// it is the moment the ledger is debited. Deletion and field updates are
/// permitted only while `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Pending,
    Spent,
}

impl ReturnStatus {
    pub fn code(&self) -> i16 {
        match self {
            ReturnStatus::Pending => 0,
            ReturnStatus::Spent => 1,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(ReturnStatus::Pending),
            1 => Some(ReturnStatus::Spent),
            _ => None,
        }
    }

    pub fn can_transition(&self, next: ReturnStatus) -> bool {
        matches!((self, next), (ReturnStatus::Pending, ReturnStatus::Spent))
    }
}

/// Inventory audit lifecycle: Open -> Closed, irreversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Open,
    Closed,
}

impl AuditStatus {
    pub fn code(&self) -> i16 {
        match self {
            AuditStatus::Open => 0,
            AuditStatus::Closed => 1,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(AuditStatus::Open),
            1 => Some(AuditStatus::Closed),
            _ => None,
        }
    }

    pub fn can_transition(&self, next: AuditStatus) -> bool {
        matches!((self, next), (AuditStatus::Open, AuditStatus::Closed))
    }
}

/// An arrival line: stock received from a supplier under one invoice.
///
/// Creating an arrival posts exactly one ledger credit of `count` to the lot
/// keyed by (product, supplier, retail price).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arrival {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub product_id: Uuid,
    pub unit_id: Uuid,
    pub invoice_number: String,
    pub date: NaiveDate,
    pub manufacturer: String,
    pub count: Decimal,
    pub purchase_price: Decimal,
    pub retail_price: Decimal,
    pub info: Option<String>,
    pub status: ArrivalStatus,
    pub user_id: Uuid,
}

/// A sale: services rendered plus parts drawn from stock lots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub date: NaiveDate,
    pub vehicle_model: String,
    pub vehicle_vin: String,
    pub vehicle_reg: Option<String>,
    pub master_id: Option<Uuid>,
    pub service: Option<String>,
    pub price: Decimal,
    pub user_id: Uuid,
}

/// One lot drawn on by a sale, with the quantity actually sold from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLine {
    pub stock_id: Uuid,
    pub quantity: Decimal,
}

/// Stock pledged to be given back to a supplier. Only affects the ledger
/// once spent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReturn {
    pub id: Uuid,
    pub date: NaiveDate,
    pub supplier_id: Uuid,
    pub product_id: Uuid,
    pub count: Decimal,
    pub invoice_number: String,
    pub price: Decimal,
    pub status: ReturnStatus,
    pub user_id: Uuid,
}

/// Destructive write-off of stock (breakage, expiry). Always a debit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disposal {
    pub id: Uuid,
    pub date: NaiveDate,
    pub stock_id: Uuid,
    pub product_id: Uuid,
    pub count: Decimal,
    pub cause: String,
    pub user_id: Uuid,
}

/// Manual audit annotation. Does not mutate the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryAudit {
    pub id: Uuid,
    pub date: NaiveDate,
    pub cause: String,
    pub info: Option<String>,
    pub status: AuditStatus,
    pub user_id: Uuid,
}
