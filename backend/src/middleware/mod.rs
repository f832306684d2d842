//! Middleware for the Stockroom back-office

mod auth;

pub use auth::{auth_middleware, AuthUser, CurrentUser};
