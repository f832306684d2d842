//! Catalog entities: products, suppliers, measurement units, masters

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
}

/// A supplier stock is received from and returned to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
}

/// A measurement unit (piece, litre, kilogram).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
}

/// A master: the person performing the services a sale records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Master {
    pub id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub percentage: Decimal,
    pub user_id: Uuid,
}
