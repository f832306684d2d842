//! Inventory audit service: manual stocktake annotations
//!
//! Audits record that a stocktake happened and why; they never mutate the
//! ledger. The only lifecycle transition is Open -> Closed.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{AuditStatus, InventoryAudit};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::validate_required_text;

/// Inventory audit service
#[derive(Clone)]
pub struct InventoryAuditService {
    db: PgPool,
}

/// Input for recording an audit
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuditInput {
    pub cause: String,
    pub info: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Input for updating an audit
#[derive(Debug, Deserialize)]
pub struct UpdateAuditInput {
    pub cause: Option<String>,
    pub info: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<AuditStatus>,
}

/// Filters for the audit listing
#[derive(Debug, Default, Deserialize)]
pub struct AuditListFilter {
    pub cause: Option<String>,
    pub info: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl AuditListFilter {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(1),
            per_page: self.per_page.unwrap_or(20),
        }
    }
}

#[derive(Debug, FromRow)]
struct AuditRow {
    id: Uuid,
    date: NaiveDate,
    cause: String,
    info: Option<String>,
    status: i16,
    user_id: Uuid,
}

impl AuditRow {
    fn into_model(self) -> AppResult<InventoryAudit> {
        let status = AuditStatus::from_code(self.status)
            .ok_or_else(|| AppError::Internal(format!("unknown audit status {}", self.status)))?;
        Ok(InventoryAudit {
            id: self.id,
            date: self.date,
            cause: self.cause,
            info: self.info,
            status,
            user_id: self.user_id,
        })
    }
}

const AUDIT_COLUMNS: &str = "id, date, cause, info, status, user_id";

impl InventoryAuditService {
    /// Create a new InventoryAuditService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record an audit in the `Open` state
    pub async fn create_audit(
        &self,
        user_id: Uuid,
        input: CreateAuditInput,
    ) -> AppResult<InventoryAudit> {
        validate_required_text(&input.cause).map_err(|msg| AppError::Validation {
            field: "cause".to_string(),
            message: msg.to_string(),
        })?;

        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());

        let row = sqlx::query_as::<_, AuditRow>(&format!(
            "INSERT INTO inventory_audits (date, cause, info, status, user_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {AUDIT_COLUMNS}"
        ))
        .bind(date)
        .bind(&input.cause)
        .bind(&input.info)
        .bind(AuditStatus::Open.code())
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        row.into_model()
    }

    /// Update an audit; closing is irreversible
    pub async fn update_audit(
        &self,
        audit_id: Uuid,
        input: UpdateAuditInput,
    ) -> AppResult<InventoryAudit> {
        let existing = self.get_audit(audit_id).await?;

        let status = match input.status {
            Some(next) if next != existing.status => {
                if !existing.status.can_transition(next) {
                    return Err(AppError::InvalidStateTransition(format!(
                        "audit cannot move from {:?} to {:?}",
                        existing.status, next
                    )));
                }
                next
            }
            _ => existing.status,
        };

        let row = sqlx::query_as::<_, AuditRow>(&format!(
            "UPDATE inventory_audits SET date = $1, cause = $2, info = $3, status = $4 \
             WHERE id = $5 \
             RETURNING {AUDIT_COLUMNS}"
        ))
        .bind(input.date.unwrap_or(existing.date))
        .bind(input.cause.unwrap_or(existing.cause))
        .bind(input.info.or(existing.info))
        .bind(status.code())
        .bind(audit_id)
        .fetch_one(&self.db)
        .await?;

        row.into_model()
    }

    /// Get an audit by id
    pub async fn get_audit(&self, audit_id: Uuid) -> AppResult<InventoryAudit> {
        let row = sqlx::query_as::<_, AuditRow>(&format!(
            "SELECT {AUDIT_COLUMNS} FROM inventory_audits WHERE id = $1"
        ))
        .bind(audit_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory audit".to_string()))?;

        row.into_model()
    }

    /// List audits with filters and pagination
    pub async fn list_audits(
        &self,
        filter: AuditListFilter,
    ) -> AppResult<PaginatedResponse<InventoryAudit>> {
        let pagination = filter.pagination();

        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM inventory_audits i WHERE TRUE");
        push_audit_filters(&mut count_query, &filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.db)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {AUDIT_COLUMNS} FROM inventory_audits i WHERE TRUE"
        ));
        push_audit_filters(&mut query, &filter);
        query
            .push(" ORDER BY i.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query
            .build_query_as::<AuditRow>()
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse {
            pagination: PaginationMeta::new(&pagination, total as u64),
            data: rows
                .into_iter()
                .map(AuditRow::into_model)
                .collect::<AppResult<Vec<_>>>()?,
        })
    }
}

fn push_audit_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &AuditListFilter) {
    if let Some(cause) = &filter.cause {
        query
            .push(" AND i.cause ILIKE ")
            .push_bind(format!("%{}%", cause));
    }
    if let Some(info) = &filter.info {
        query
            .push(" AND i.info ILIKE ")
            .push_bind(format!("%{}%", info));
    }
    if let Some(from) = filter.from_date {
        query.push(" AND i.date >= ").push_bind(from);
    }
    if let Some(to) = filter.to_date {
        query.push(" AND i.date <= ").push_bind(to);
    }
}
