//! HTTP handlers for the Stockroom back-office

mod arrival;
mod auth;
mod disposal;
mod health;
mod inventory_audit;
mod master;
mod product;
mod product_return;
mod sale;
mod stock;
mod supplier;
mod unit;

pub use arrival::*;
pub use auth::*;
pub use disposal::*;
pub use health::*;
pub use inventory_audit::*;
pub use master::*;
pub use product::*;
pub use product_return::*;
pub use sale::*;
pub use stock::*;
pub use supplier::*;
pub use unit::*;
