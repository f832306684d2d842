//! Business logic services for the Stockroom back-office

pub mod arrival;
pub mod auth;
pub mod db;
pub mod disposal;
pub mod inventory_audit;
pub mod master;
pub mod product;
pub mod product_return;
pub mod sale;
pub mod stock;
pub mod supplier;
pub mod unit;

pub use arrival::ArrivalService;
pub use auth::AuthService;
pub use disposal::DisposalService;
pub use inventory_audit::InventoryAuditService;
pub use master::MasterService;
pub use product::ProductService;
pub use product_return::ProductReturnService;
pub use sale::SaleService;
pub use stock::StockService;
pub use supplier::SupplierService;
pub use unit::UnitService;
