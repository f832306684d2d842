//! HTTP handlers for master endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::master::{CreateMasterInput, UpdateMasterInput};
use crate::services::product::CatalogListFilter;
use crate::services::MasterService;
use crate::AppState;
use shared::models::Master;
use shared::types::PaginatedResponse;

/// Create a master
pub async fn create_master(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateMasterInput>,
) -> AppResult<Json<Master>> {
    let service = MasterService::new(state.db);
    let master = service.create_master(current_user.0.user_id, input).await?;
    Ok(Json(master))
}

/// Update a master
pub async fn update_master(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(master_id): Path<Uuid>,
    Json(input): Json<UpdateMasterInput>,
) -> AppResult<Json<Master>> {
    let service = MasterService::new(state.db);
    let master = service.update_master(master_id, input).await?;
    Ok(Json(master))
}

/// Get a master by id
pub async fn get_master(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(master_id): Path<Uuid>,
) -> AppResult<Json<Master>> {
    let service = MasterService::new(state.db);
    let master = service.get_master(master_id).await?;
    Ok(Json(master))
}

/// List masters
pub async fn list_masters(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<CatalogListFilter>,
) -> AppResult<Json<PaginatedResponse<Master>>> {
    let service = MasterService::new(state.db);
    let masters = service.list_masters(filter).await?;
    Ok(Json(masters))
}
