//! HTTP handlers for the read-only stock listing

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stock::{StockListFilter, StockWithNames};
use crate::services::StockService;
use crate::AppState;
use shared::types::PaginatedResponse;

/// List stock lots with on-hand quantity, filters and pagination
pub async fn list_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<StockListFilter>,
) -> AppResult<Json<PaginatedResponse<StockWithNames>>> {
    let service = StockService::new(state.db);
    let stock = service.list_stock(filter).await?;
    Ok(Json(stock))
}
