//! Product return service: stock pledged back to a supplier
//!
//! A return is created `Pending` and has no ledger effect until it is
//! spent. Spending is irreversible: it debits the lot resolved by
//! (product, supplier, price) and flips the status, both inside one
//! transaction with the return row and the lot row locked.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{db, StockService};
use shared::models::{LotKey, ProductReturn, ReturnStatus, StockError};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::{validate_positive_quantity, validate_price, validate_required_text};

/// Product return service
#[derive(Clone)]
pub struct ProductReturnService {
    db: PgPool,
}

/// Input for recording a product return
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReturnInput {
    pub supplier_id: Uuid,
    pub product_id: Uuid,
    pub count: Decimal,
    pub price: Decimal,
    pub invoice_number: String,
    pub date: Option<NaiveDate>,
}

/// Input for updating a pending return
#[derive(Debug, Deserialize)]
pub struct UpdateReturnInput {
    pub count: Option<Decimal>,
    pub price: Option<Decimal>,
    pub invoice_number: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Filters for the return listing
#[derive(Debug, Default, Deserialize)]
pub struct ReturnListFilter {
    pub supplier_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub status: Option<ReturnStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub from_price: Option<Decimal>,
    pub to_price: Option<Decimal>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ReturnListFilter {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(1),
            per_page: self.per_page.unwrap_or(20),
        }
    }
}

/// Return with joined display names for listings
#[derive(Debug, Clone, Serialize)]
pub struct ReturnWithNames {
    pub id: Uuid,
    pub date: NaiveDate,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub product_id: Uuid,
    pub product_name: String,
    pub count: Decimal,
    pub invoice_number: String,
    pub price: Decimal,
    pub status: ReturnStatus,
    pub user_id: Uuid,
}

#[derive(Debug, FromRow)]
struct ReturnListRow {
    id: Uuid,
    date: NaiveDate,
    supplier_id: Uuid,
    supplier_name: String,
    product_id: Uuid,
    product_name: String,
    count: Decimal,
    invoice_number: String,
    price: Decimal,
    status: i16,
    user_id: Uuid,
}

impl ReturnListRow {
    fn into_model(self) -> AppResult<ReturnWithNames> {
        let status = ReturnStatus::from_code(self.status)
            .ok_or_else(|| AppError::Internal(format!("unknown return status {}", self.status)))?;
        Ok(ReturnWithNames {
            id: self.id,
            date: self.date,
            supplier_id: self.supplier_id,
            supplier_name: self.supplier_name,
            product_id: self.product_id,
            product_name: self.product_name,
            count: self.count,
            invoice_number: self.invoice_number,
            price: self.price,
            status,
            user_id: self.user_id,
        })
    }
}

#[derive(Debug, FromRow)]
struct ReturnRow {
    id: Uuid,
    date: NaiveDate,
    supplier_id: Uuid,
    product_id: Uuid,
    count: Decimal,
    invoice_number: String,
    price: Decimal,
    status: i16,
    user_id: Uuid,
}

impl ReturnRow {
    fn status(&self) -> AppResult<ReturnStatus> {
        ReturnStatus::from_code(self.status)
            .ok_or_else(|| AppError::Internal(format!("unknown return status {}", self.status)))
    }

    fn into_model(self) -> AppResult<ProductReturn> {
        let status = self.status()?;
        Ok(ProductReturn {
            id: self.id,
            date: self.date,
            supplier_id: self.supplier_id,
            product_id: self.product_id,
            count: self.count,
            invoice_number: self.invoice_number,
            price: self.price,
            status,
            user_id: self.user_id,
        })
    }
}

const RETURN_COLUMNS: &str =
    "id, date, supplier_id, product_id, count, invoice_number, price, status, user_id";

impl ProductReturnService {
    /// Create a new ProductReturnService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a return in the `Pending` state. No ledger effect yet.
    pub async fn create_return(
        &self,
        user_id: Uuid,
        input: CreateReturnInput,
    ) -> AppResult<ProductReturn> {
        validate_positive_quantity(input.count).map_err(|msg| AppError::Validation {
            field: "count".to_string(),
            message: msg.to_string(),
        })?;
        validate_price(input.price).map_err(|msg| AppError::Validation {
            field: "price".to_string(),
            message: msg.to_string(),
        })?;
        validate_required_text(&input.invoice_number).map_err(|msg| AppError::Validation {
            field: "invoice_number".to_string(),
            message: msg.to_string(),
        })?;

        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());

        let row = sqlx::query_as::<_, ReturnRow>(&format!(
            "INSERT INTO product_returns \
             (date, supplier_id, product_id, count, invoice_number, price, status, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {RETURN_COLUMNS}"
        ))
        .bind(date)
        .bind(input.supplier_id)
        .bind(input.product_id)
        .bind(input.count)
        .bind(&input.invoice_number)
        .bind(input.price)
        .bind(ReturnStatus::Pending.code())
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        row.into_model()
    }

    /// Spend a pending return: debit the lot and finalize the record.
    ///
    /// Irreversible. Spending an already-spent return fails `AlreadySpent`
    /// and the ledger is debited exactly once over the lifetime of the
    /// return.
    pub async fn spend_return(&self, return_id: Uuid) -> AppResult<ProductReturn> {
        match self.try_spend_return(return_id).await {
            Err(AppError::Database(err)) if db::is_transient(&err) => {
                self.try_spend_return(return_id).await
            }
            result => result,
        }
    }

    async fn try_spend_return(&self, return_id: Uuid) -> AppResult<ProductReturn> {
        let mut tx = self.db.begin().await?;

        // Lock the return row so two concurrent spends serialize on it
        let row = sqlx::query_as::<_, ReturnRow>(&format!(
            "SELECT {RETURN_COLUMNS} FROM product_returns WHERE id = $1 FOR UPDATE"
        ))
        .bind(return_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product return".to_string()))?;

        if row.status()? == ReturnStatus::Spent {
            return Err(StockError::AlreadySpent { id: return_id }.into());
        }

        let key = LotKey::new(row.product_id, row.supplier_id, row.price);
        let lot = StockService::find_by_key_for_update(&mut tx, key)
            .await?
            .ok_or(StockError::LotNotFound { key })?;

        StockService::apply_delta_to_lot(&mut tx, &lot, -row.count).await?;

        let updated = sqlx::query_as::<_, ReturnRow>(&format!(
            "UPDATE product_returns SET status = $1 WHERE id = $2 RETURNING {RETURN_COLUMNS}"
        ))
        .bind(ReturnStatus::Spent.code())
        .bind(return_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(%return_id, count = %row.count, "product return spent");

        updated.into_model()
    }

    /// Delete a return. Only permitted while pending.
    pub async fn delete_return(&self, return_id: Uuid) -> AppResult<ProductReturn> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, ReturnRow>(&format!(
            "SELECT {RETURN_COLUMNS} FROM product_returns WHERE id = $1 FOR UPDATE"
        ))
        .bind(return_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product return".to_string()))?;

        if row.status()? == ReturnStatus::Spent {
            return Err(StockError::AlreadySpent { id: return_id }.into());
        }

        sqlx::query("DELETE FROM product_returns WHERE id = $1")
            .bind(return_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        row.into_model()
    }

    /// Update a pending return's fields. Spent returns are immutable.
    pub async fn update_return(
        &self,
        return_id: Uuid,
        input: UpdateReturnInput,
    ) -> AppResult<ProductReturn> {
        if let Some(count) = input.count {
            validate_positive_quantity(count).map_err(|msg| AppError::Validation {
                field: "count".to_string(),
                message: msg.to_string(),
            })?;
        }
        if let Some(price) = input.price {
            validate_price(price).map_err(|msg| AppError::Validation {
                field: "price".to_string(),
                message: msg.to_string(),
            })?;
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, ReturnRow>(&format!(
            "SELECT {RETURN_COLUMNS} FROM product_returns WHERE id = $1 FOR UPDATE"
        ))
        .bind(return_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product return".to_string()))?;

        if row.status()? == ReturnStatus::Spent {
            return Err(StockError::AlreadySpent { id: return_id }.into());
        }

        let updated = sqlx::query_as::<_, ReturnRow>(&format!(
            "UPDATE product_returns \
             SET count = $1, price = $2, invoice_number = $3, date = $4 \
             WHERE id = $5 \
             RETURNING {RETURN_COLUMNS}"
        ))
        .bind(input.count.unwrap_or(row.count))
        .bind(input.price.unwrap_or(row.price))
        .bind(input.invoice_number.unwrap_or(row.invoice_number))
        .bind(input.date.unwrap_or(row.date))
        .bind(return_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        updated.into_model()
    }

    /// Get a return by id
    pub async fn get_return(&self, return_id: Uuid) -> AppResult<ProductReturn> {
        let row = sqlx::query_as::<_, ReturnRow>(&format!(
            "SELECT {RETURN_COLUMNS} FROM product_returns WHERE id = $1"
        ))
        .bind(return_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product return".to_string()))?;

        row.into_model()
    }

    /// List returns with filters and pagination
    pub async fn list_returns(
        &self,
        filter: ReturnListFilter,
    ) -> AppResult<PaginatedResponse<ReturnWithNames>> {
        let pagination = filter.pagination();

        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM product_returns r WHERE TRUE");
        push_return_filters(&mut count_query, &filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.db)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT r.id, r.date, r.supplier_id, sup.name AS supplier_name, \
             r.product_id, p.name AS product_name, \
             r.count, r.invoice_number, r.price, r.status, r.user_id \
             FROM product_returns r \
             JOIN suppliers sup ON sup.id = r.supplier_id \
             JOIN products p ON p.id = r.product_id \
             WHERE TRUE",
        );
        push_return_filters(&mut query, &filter);
        query
            .push(" ORDER BY r.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query
            .build_query_as::<ReturnListRow>()
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse {
            pagination: PaginationMeta::new(&pagination, total as u64),
            data: rows
                .into_iter()
                .map(ReturnListRow::into_model)
                .collect::<AppResult<Vec<_>>>()?,
        })
    }
}

fn push_return_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ReturnListFilter) {
    if let Some(supplier_id) = filter.supplier_id {
        query.push(" AND r.supplier_id = ").push_bind(supplier_id);
    }
    if let Some(product_id) = filter.product_id {
        query.push(" AND r.product_id = ").push_bind(product_id);
    }
    if let Some(status) = filter.status {
        query.push(" AND r.status = ").push_bind(status.code());
    }
    if let Some(from) = filter.from_date {
        query.push(" AND r.date >= ").push_bind(from);
    }
    if let Some(to) = filter.to_date {
        query.push(" AND r.date <= ").push_bind(to);
    }
    if let Some(from) = filter.from_price {
        query.push(" AND r.price >= ").push_bind(from);
    }
    if let Some(to) = filter.to_price {
        query.push(" AND r.price <= ").push_bind(to);
    }
}
