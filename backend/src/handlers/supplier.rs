//! HTTP handlers for supplier catalog endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::product::CatalogListFilter;
use crate::services::supplier::SupplierInput;
use crate::services::SupplierService;
use crate::AppState;
use shared::models::Supplier;
use shared::types::PaginatedResponse;

/// Create a supplier
pub async fn create_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<SupplierInput>,
) -> AppResult<Json<Supplier>> {
    let service = SupplierService::new(state.db);
    let supplier = service
        .create_supplier(current_user.0.user_id, input)
        .await?;
    Ok(Json(supplier))
}

/// Rename a supplier
pub async fn update_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
    Json(input): Json<SupplierInput>,
) -> AppResult<Json<Supplier>> {
    let service = SupplierService::new(state.db);
    let supplier = service.update_supplier(supplier_id, input).await?;
    Ok(Json(supplier))
}

/// Get a supplier by id
pub async fn get_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<Json<Supplier>> {
    let service = SupplierService::new(state.db);
    let supplier = service.get_supplier(supplier_id).await?;
    Ok(Json(supplier))
}

/// List suppliers
pub async fn list_suppliers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<CatalogListFilter>,
) -> AppResult<Json<PaginatedResponse<Supplier>>> {
    let service = SupplierService::new(state.db);
    let suppliers = service.list_suppliers(filter).await?;
    Ok(Json(suppliers))
}
