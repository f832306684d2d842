//! HTTP handlers for product return endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::product_return::{
    CreateReturnInput, ReturnListFilter, ReturnWithNames, UpdateReturnInput,
};
use crate::services::ProductReturnService;
use crate::AppState;
use shared::models::ProductReturn;
use shared::types::PaginatedResponse;

/// Record a product return in the pending state
pub async fn create_return(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateReturnInput>,
) -> AppResult<Json<ProductReturn>> {
    let service = ProductReturnService::new(state.db);
    let product_return = service.create_return(current_user.0.user_id, input).await?;
    Ok(Json(product_return))
}

/// Spend a pending return: debit the lot and finalize the record
pub async fn spend_return(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(return_id): Path<Uuid>,
) -> AppResult<Json<ProductReturn>> {
    let service = ProductReturnService::new(state.db);
    let product_return = service.spend_return(return_id).await?;
    Ok(Json(product_return))
}

/// Delete a pending return
pub async fn delete_return(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(return_id): Path<Uuid>,
) -> AppResult<Json<ProductReturn>> {
    let service = ProductReturnService::new(state.db);
    let product_return = service.delete_return(return_id).await?;
    Ok(Json(product_return))
}

/// Update a pending return
pub async fn update_return(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(return_id): Path<Uuid>,
    Json(input): Json<UpdateReturnInput>,
) -> AppResult<Json<ProductReturn>> {
    let service = ProductReturnService::new(state.db);
    let product_return = service.update_return(return_id, input).await?;
    Ok(Json(product_return))
}

/// Get a return by id
pub async fn get_return(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(return_id): Path<Uuid>,
) -> AppResult<Json<ProductReturn>> {
    let service = ProductReturnService::new(state.db);
    let product_return = service.get_return(return_id).await?;
    Ok(Json(product_return))
}

/// List returns with filters
pub async fn list_returns(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ReturnListFilter>,
) -> AppResult<Json<PaginatedResponse<ReturnWithNames>>> {
    let service = ProductReturnService::new(state.db);
    let returns = service.list_returns(filter).await?;
    Ok(Json(returns))
}
