//! HTTP handlers for inventory audit endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::inventory_audit::{AuditListFilter, CreateAuditInput, UpdateAuditInput};
use crate::services::InventoryAuditService;
use crate::AppState;
use shared::models::InventoryAudit;
use shared::types::PaginatedResponse;

/// Record an inventory audit
pub async fn create_audit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateAuditInput>,
) -> AppResult<Json<InventoryAudit>> {
    let service = InventoryAuditService::new(state.db);
    let audit = service.create_audit(current_user.0.user_id, input).await?;
    Ok(Json(audit))
}

/// Update an inventory audit
pub async fn update_audit(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(audit_id): Path<Uuid>,
    Json(input): Json<UpdateAuditInput>,
) -> AppResult<Json<InventoryAudit>> {
    let service = InventoryAuditService::new(state.db);
    let audit = service.update_audit(audit_id, input).await?;
    Ok(Json(audit))
}

/// Get an inventory audit by id
pub async fn get_audit(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(audit_id): Path<Uuid>,
) -> AppResult<Json<InventoryAudit>> {
    let service = InventoryAuditService::new(state.db);
    let audit = service.get_audit(audit_id).await?;
    Ok(Json(audit))
}

/// List inventory audits with filters
pub async fn list_audits(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<AuditListFilter>,
) -> AppResult<Json<PaginatedResponse<InventoryAudit>>> {
    let service = InventoryAuditService::new(state.db);
    let audits = service.list_audits(filter).await?;
    Ok(Json(audits))
}
