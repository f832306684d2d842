//! HTTP handlers for arrival endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::arrival::{
    ArrivalListFilter, ArrivalWithNames, CreateArrivalInput, UpdateArrivalInput,
};
use crate::services::ArrivalService;
use crate::AppState;
use shared::models::Arrival;
use shared::types::PaginatedResponse;

/// Record an arrival: one invoice, one or more items, atomic overall
pub async fn create_arrival(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateArrivalInput>,
) -> AppResult<Json<Vec<Arrival>>> {
    let service = ArrivalService::new(state.db);
    let arrivals = service
        .create_arrival(current_user.0.user_id, input)
        .await?;
    Ok(Json(arrivals))
}

/// Update arrival bookkeeping fields
pub async fn update_arrival(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(arrival_id): Path<Uuid>,
    Json(input): Json<UpdateArrivalInput>,
) -> AppResult<Json<Arrival>> {
    let service = ArrivalService::new(state.db);
    let arrival = service.update_arrival(arrival_id, input).await?;
    Ok(Json(arrival))
}

/// Get an arrival by id
pub async fn get_arrival(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(arrival_id): Path<Uuid>,
) -> AppResult<Json<Arrival>> {
    let service = ArrivalService::new(state.db);
    let arrival = service.get_arrival(arrival_id).await?;
    Ok(Json(arrival))
}

/// List arrivals with filters
pub async fn list_arrivals(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ArrivalListFilter>,
) -> AppResult<Json<PaginatedResponse<ArrivalWithNames>>> {
    let service = ArrivalService::new(state.db);
    let arrivals = service.list_arrivals(filter).await?;
    Ok(Json(arrivals))
}
