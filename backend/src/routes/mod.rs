//! Route definitions for the Stockroom back-office

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public + protected "me")
        .nest("/auth", auth_routes())
        // Catalog
        .nest("/products", product_routes())
        .nest("/suppliers", supplier_routes())
        .nest("/units", unit_routes())
        .nest("/masters", master_routes())
        // Inventory-affecting events
        .nest("/arrivals", arrival_routes())
        .nest("/sales", sale_routes())
        .nest("/returns", return_routes())
        .nest("/disposals", disposal_routes())
        .nest("/inventories", audit_routes())
        // Read-only ledger view
        .nest("/stock", stock_routes())
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .route(
            "/me",
            get(handlers::me).route_layer(middleware::from_fn(auth_middleware)),
        )
}

/// Product catalog routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/:product_id",
            get(handlers::get_product).put(handlers::update_product),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Supplier catalog routes (protected)
fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route(
            "/:supplier_id",
            get(handlers::get_supplier).put(handlers::update_supplier),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Measurement unit routes (protected)
fn unit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_units).post(handlers::create_unit))
        .route(
            "/:unit_id",
            get(handlers::get_unit).put(handlers::update_unit),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Master routes (protected)
fn master_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_masters).post(handlers::create_master),
        )
        .route(
            "/:master_id",
            get(handlers::get_master).put(handlers::update_master),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Arrival routes (protected)
fn arrival_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_arrivals).post(handlers::create_arrival),
        )
        .route(
            "/:arrival_id",
            get(handlers::get_arrival).put(handlers::update_arrival),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Sale routes (protected)
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route("/:sale_id", get(handlers::get_sale))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product return routes (protected)
fn return_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_returns).post(handlers::create_return),
        )
        .route(
            "/:return_id",
            get(handlers::get_return)
                .put(handlers::update_return)
                .delete(handlers::delete_return),
        )
        .route("/:return_id/spend", post(handlers::spend_return))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Disposal routes (protected)
fn disposal_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_disposals).post(handlers::create_disposal),
        )
        .route("/:disposal_id", get(handlers::get_disposal))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Inventory audit routes (protected)
fn audit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_audits).post(handlers::create_audit))
        .route(
            "/:audit_id",
            get(handlers::get_audit).put(handlers::update_audit),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Read-only stock listing (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}
