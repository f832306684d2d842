//! HTTP handlers for measurement unit endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::product::CatalogListFilter;
use crate::services::unit::UnitInput;
use crate::services::UnitService;
use crate::AppState;
use shared::models::Unit;
use shared::types::PaginatedResponse;

/// Create a unit
pub async fn create_unit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<UnitInput>,
) -> AppResult<Json<Unit>> {
    let service = UnitService::new(state.db);
    let unit = service.create_unit(current_user.0.user_id, input).await?;
    Ok(Json(unit))
}

/// Rename a unit
pub async fn update_unit(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(unit_id): Path<Uuid>,
    Json(input): Json<UnitInput>,
) -> AppResult<Json<Unit>> {
    let service = UnitService::new(state.db);
    let unit = service.update_unit(unit_id, input).await?;
    Ok(Json(unit))
}

/// Get a unit by id
pub async fn get_unit(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(unit_id): Path<Uuid>,
) -> AppResult<Json<Unit>> {
    let service = UnitService::new(state.db);
    let unit = service.get_unit(unit_id).await?;
    Ok(Json(unit))
}

/// List units
pub async fn list_units(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<CatalogListFilter>,
) -> AppResult<Json<PaginatedResponse<Unit>>> {
    let service = UnitService::new(state.db);
    let units = service.list_units(filter).await?;
    Ok(Json(units))
}
