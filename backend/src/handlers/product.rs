//! HTTP handlers for product catalog endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::product::{CatalogListFilter, ProductInput};
use crate::services::ProductService;
use crate::AppState;
use shared::models::Product;
use shared::types::PaginatedResponse;

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service
        .create_product(current_user.0.user_id, input)
        .await?;
    Ok(Json(product))
}

/// Rename a product
pub async fn update_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<ProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service.update_product(product_id, input).await?;
    Ok(Json(product))
}

/// Get a product by id
pub async fn get_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service.get_product(product_id).await?;
    Ok(Json(product))
}

/// List products
pub async fn list_products(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<CatalogListFilter>,
) -> AppResult<Json<PaginatedResponse<Product>>> {
    let service = ProductService::new(state.db);
    let products = service.list_products(filter).await?;
    Ok(Json(products))
}
