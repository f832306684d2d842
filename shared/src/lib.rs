//! Shared types and models for the Stockroom back-office
//!
//! This crate contains the domain model and the pure stock-ledger logic
//! shared between the backend server and its test suites.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
