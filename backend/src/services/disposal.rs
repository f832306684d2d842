//! Disposal service: destructive write-off of stock
//!
//! A disposal always debits the ledger: breakage, expiry, shrinkage. The
//! request names the exact lot to write off; a zero count is accepted as a
//! no-op write-off. Insufficient stock fails the whole request, it is never
//! clamped.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{db, StockService};
use shared::models::Disposal;
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::{validate_non_negative_quantity, validate_required_text};

/// Disposal service
#[derive(Clone)]
pub struct DisposalService {
    db: PgPool,
}

/// Input for recording a disposal
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDisposalInput {
    pub stock_id: Uuid,
    pub count: Decimal,
    pub cause: String,
    pub date: Option<NaiveDate>,
}

/// Filters for the disposal listing
#[derive(Debug, Default, Deserialize)]
pub struct DisposalListFilter {
    pub product_id: Option<Uuid>,
    pub cause: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl DisposalListFilter {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(1),
            per_page: self.per_page.unwrap_or(20),
        }
    }
}

/// Disposal with the product name joined in for listings
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DisposalWithNames {
    pub id: Uuid,
    pub date: NaiveDate,
    pub stock_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub count: Decimal,
    pub cause: String,
    pub user_id: Uuid,
}

#[derive(Debug, FromRow)]
struct DisposalRow {
    id: Uuid,
    date: NaiveDate,
    stock_id: Uuid,
    product_id: Uuid,
    count: Decimal,
    cause: String,
    user_id: Uuid,
}

impl DisposalRow {
    fn into_model(self) -> Disposal {
        Disposal {
            id: self.id,
            date: self.date,
            stock_id: self.stock_id,
            product_id: self.product_id,
            count: self.count,
            cause: self.cause,
            user_id: self.user_id,
        }
    }
}

const DISPOSAL_COLUMNS: &str = "id, date, stock_id, product_id, count, cause, user_id";

impl DisposalService {
    /// Create a new DisposalService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a disposal: debit the named lot and persist the record, both
    /// in one transaction.
    pub async fn create_disposal(
        &self,
        user_id: Uuid,
        input: CreateDisposalInput,
    ) -> AppResult<Disposal> {
        validate_non_negative_quantity(input.count).map_err(|msg| AppError::Validation {
            field: "count".to_string(),
            message: msg.to_string(),
        })?;
        validate_required_text(&input.cause).map_err(|msg| AppError::Validation {
            field: "cause".to_string(),
            message: msg.to_string(),
        })?;

        match self.try_create_disposal(user_id, &input).await {
            Err(AppError::Database(err)) if db::is_transient(&err) => {
                self.try_create_disposal(user_id, &input).await
            }
            result => result,
        }
    }

    async fn try_create_disposal(
        &self,
        user_id: Uuid,
        input: &CreateDisposalInput,
    ) -> AppResult<Disposal> {
        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());
        let mut tx = self.db.begin().await?;

        let lot = StockService::find_by_id_for_update(&mut tx, input.stock_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock lot".to_string()))?;

        StockService::apply_delta_to_lot(&mut tx, &lot, -input.count).await?;

        let row = sqlx::query_as::<_, DisposalRow>(&format!(
            "INSERT INTO disposals (date, stock_id, product_id, count, cause, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {DISPOSAL_COLUMNS}"
        ))
        .bind(date)
        .bind(lot.id)
        .bind(lot.product_id)
        .bind(input.count)
        .bind(&input.cause)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(stock_id = %lot.id, count = %input.count, "stock disposed");

        Ok(row.into_model())
    }

    /// Get a disposal by id
    pub async fn get_disposal(&self, disposal_id: Uuid) -> AppResult<Disposal> {
        let row = sqlx::query_as::<_, DisposalRow>(&format!(
            "SELECT {DISPOSAL_COLUMNS} FROM disposals WHERE id = $1"
        ))
        .bind(disposal_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Disposal".to_string()))?;

        Ok(row.into_model())
    }

    /// List disposals with filters and pagination
    pub async fn list_disposals(
        &self,
        filter: DisposalListFilter,
    ) -> AppResult<PaginatedResponse<DisposalWithNames>> {
        let pagination = filter.pagination();

        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM disposals d WHERE TRUE");
        push_disposal_filters(&mut count_query, &filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.db)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT d.id, d.date, d.stock_id, d.product_id, p.name AS product_name, \
             d.count, d.cause, d.user_id \
             FROM disposals d \
             JOIN products p ON p.id = d.product_id \
             WHERE TRUE",
        );
        push_disposal_filters(&mut query, &filter);
        query
            .push(" ORDER BY d.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query
            .build_query_as::<DisposalWithNames>()
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse {
            pagination: PaginationMeta::new(&pagination, total as u64),
            data: rows,
        })
    }
}

fn push_disposal_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &DisposalListFilter) {
    if let Some(product_id) = filter.product_id {
        query.push(" AND d.product_id = ").push_bind(product_id);
    }
    if let Some(cause) = &filter.cause {
        query
            .push(" AND d.cause ILIKE ")
            .push_bind(format!("%{}%", cause));
    }
    if let Some(from) = filter.from_date {
        query.push(" AND d.date >= ").push_bind(from);
    }
    if let Some(to) = filter.to_date {
        query.push(" AND d.date <= ").push_bind(to);
    }
}
