//! HTTP handlers for sale endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::sale::{CreateSaleInput, SaleListFilter, SaleWithLines};
use crate::services::SaleService;
use crate::AppState;
use shared::models::Sale;
use shared::types::PaginatedResponse;

/// Record a sale and consume the referenced stock
pub async fn create_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<Json<SaleWithLines>> {
    let service = SaleService::new(state.db);
    let sale = service.create_sale(current_user.0.user_id, input).await?;
    Ok(Json(sale))
}

/// Get a sale with its stock lines
pub async fn get_sale(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<SaleWithLines>> {
    let service = SaleService::new(state.db);
    let sale = service.get_sale(sale_id).await?;
    Ok(Json(sale))
}

/// List sales with filters
pub async fn list_sales(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<SaleListFilter>,
) -> AppResult<Json<PaginatedResponse<Sale>>> {
    let service = SaleService::new(state.db);
    let sales = service.list_sales(filter).await?;
    Ok(Json(sales))
}
