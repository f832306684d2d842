//! Database models for the Stockroom back-office
//!
//! Re-exports models from the shared crate.

pub use shared::models::*;
