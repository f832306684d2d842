//! HTTP handlers for disposal endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::disposal::{CreateDisposalInput, DisposalListFilter, DisposalWithNames};
use crate::services::DisposalService;
use crate::AppState;
use shared::models::Disposal;
use shared::types::PaginatedResponse;

/// Record a disposal: write stock off a named lot
pub async fn create_disposal(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateDisposalInput>,
) -> AppResult<Json<Disposal>> {
    let service = DisposalService::new(state.db);
    let disposal = service
        .create_disposal(current_user.0.user_id, input)
        .await?;
    Ok(Json(disposal))
}

/// Get a disposal by id
pub async fn get_disposal(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(disposal_id): Path<Uuid>,
) -> AppResult<Json<Disposal>> {
    let service = DisposalService::new(state.db);
    let disposal = service.get_disposal(disposal_id).await?;
    Ok(Json(disposal))
}

/// List disposals with filters
pub async fn list_disposals(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<DisposalListFilter>,
) -> AppResult<Json<PaginatedResponse<DisposalWithNames>>> {
    let service = DisposalService::new(state.db);
    let disposals = service.list_disposals(filter).await?;
    Ok(Json(disposals))
}
