//! The stock ledger: authoritative on-hand quantities per lot
//!
//! Every quantity change goes through [`StockService::apply_delta`] or
//! [`StockService::apply_delta_to_lot`] inside the caller's transaction,
//! with the touched lot row locked for the duration. No other code path
//! writes `stock.count`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{plan_delta, LedgerPlan, LotKey, StockLot};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};

/// Stock service for ledger writes and the read-only stock listing
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Stock lot with joined display names for listings
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockWithNames {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub unit_id: Uuid,
    pub unit_name: String,
    pub price: Decimal,
    pub count: Decimal,
}

/// Filters for the read-only stock listing
#[derive(Debug, Default, Deserialize)]
pub struct StockListFilter {
    pub product_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub product_name: Option<String>,
    pub supplier_name: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl StockListFilter {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(1),
            per_page: self.per_page.unwrap_or(20),
        }
    }
}

const LOT_COLUMNS: &str = "id, product_id, supplier_id, price, unit_id, count";

type LotRow = (Uuid, Uuid, Uuid, Decimal, Uuid, Decimal);

fn lot_from_row(row: LotRow) -> StockLot {
    let (id, product_id, supplier_id, price, unit_id, quantity) = row;
    StockLot {
        id,
        product_id,
        supplier_id,
        price,
        unit_id,
        quantity,
    }
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Fetch the lot for a key, locking its row for the rest of the
    /// transaction. Two concurrent events on the same key serialize here.
    pub async fn find_by_key_for_update(
        tx: &mut Transaction<'_, Postgres>,
        key: LotKey,
    ) -> AppResult<Option<StockLot>> {
        let row = sqlx::query_as::<_, LotRow>(&format!(
            "SELECT {LOT_COLUMNS} FROM stock \
             WHERE product_id = $1 AND supplier_id = $2 AND price = $3 \
             FOR UPDATE"
        ))
        .bind(key.product_id)
        .bind(key.supplier_id)
        .bind(key.price)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(lot_from_row))
    }

    /// Fetch a lot by its surrogate id, locking its row.
    pub async fn find_by_id_for_update(
        tx: &mut Transaction<'_, Postgres>,
        stock_id: Uuid,
    ) -> AppResult<Option<StockLot>> {
        let row = sqlx::query_as::<_, LotRow>(&format!(
            "SELECT {LOT_COLUMNS} FROM stock WHERE id = $1 FOR UPDATE"
        ))
        .bind(stock_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(lot_from_row))
    }

    /// Apply a signed quantity to the lot for `key` inside the caller's
    /// transaction and return the new on-hand quantity.
    ///
    /// Creates the lot when a credit arrives for an unknown key
    /// (check-then-insert under the lock; the unique index over
    /// (product_id, supplier_id, price) backstops a racing create).
    pub async fn apply_delta(
        tx: &mut Transaction<'_, Postgres>,
        key: LotKey,
        unit_id: Uuid,
        delta: Decimal,
    ) -> AppResult<Decimal> {
        let existing = Self::find_by_key_for_update(tx, key).await?;

        match plan_delta(key, existing.as_ref(), unit_id, delta)? {
            LedgerPlan::Create { quantity } => {
                sqlx::query(
                    "INSERT INTO stock (product_id, supplier_id, price, unit_id, count) \
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(key.product_id)
                .bind(key.supplier_id)
                .bind(key.price)
                .bind(unit_id)
                .bind(quantity)
                .execute(&mut **tx)
                .await?;
                Ok(quantity)
            }
            LedgerPlan::Update { new_quantity } => {
                let lot_id = existing.map(|lot| lot.id).ok_or_else(|| {
                    AppError::Internal("ledger planned an update for a missing lot".to_string())
                })?;
                sqlx::query("UPDATE stock SET count = $1 WHERE id = $2")
                    .bind(new_quantity)
                    .bind(lot_id)
                    .execute(&mut **tx)
                    .await?;
                Ok(new_quantity)
            }
        }
    }

    /// Apply a signed quantity to a lot row the caller already locked with
    /// [`Self::find_by_id_for_update`] or [`Self::find_by_key_for_update`].
    pub async fn apply_delta_to_lot(
        tx: &mut Transaction<'_, Postgres>,
        lot: &StockLot,
        delta: Decimal,
    ) -> AppResult<Decimal> {
        match plan_delta(lot.key(), Some(lot), lot.unit_id, delta)? {
            LedgerPlan::Update { new_quantity } => {
                sqlx::query("UPDATE stock SET count = $1 WHERE id = $2")
                    .bind(new_quantity)
                    .bind(lot.id)
                    .execute(&mut **tx)
                    .await?;
                Ok(new_quantity)
            }
            LedgerPlan::Create { .. } => Err(AppError::Internal(
                "ledger planned a create for an existing lot".to_string(),
            )),
        }
    }

    /// Read-only stock listing: lots with stock on hand, joined display
    /// names, optional filters. No ledger mutation and no locks.
    pub async fn list_stock(
        &self,
        filter: StockListFilter,
    ) -> AppResult<PaginatedResponse<StockWithNames>> {
        let pagination = filter.pagination();

        let mut count_query = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM stock s \
             JOIN products p ON p.id = s.product_id \
             JOIN suppliers sup ON sup.id = s.supplier_id \
             WHERE s.count > 0",
        );
        push_stock_filters(&mut count_query, &filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.db)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT s.id, s.product_id, p.name AS product_name, \
             s.supplier_id, sup.name AS supplier_name, \
             s.unit_id, u.name AS unit_name, s.price, s.count \
             FROM stock s \
             JOIN products p ON p.id = s.product_id \
             JOIN suppliers sup ON sup.id = s.supplier_id \
             JOIN units u ON u.id = s.unit_id \
             WHERE s.count > 0",
        );
        push_stock_filters(&mut query, &filter);
        query
            .push(" ORDER BY s.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query
            .build_query_as::<StockWithNames>()
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse {
            pagination: PaginationMeta::new(&pagination, total as u64),
            data: rows,
        })
    }
}

fn push_stock_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &StockListFilter) {
    if let Some(product_id) = filter.product_id {
        query.push(" AND s.product_id = ").push_bind(product_id);
    }
    if let Some(supplier_id) = filter.supplier_id {
        query.push(" AND s.supplier_id = ").push_bind(supplier_id);
    }
    if let Some(name) = &filter.product_name {
        query
            .push(" AND p.name ILIKE ")
            .push_bind(format!("%{}%", name));
    }
    if let Some(name) = &filter.supplier_name {
        query
            .push(" AND sup.name ILIKE ")
            .push_bind(format!("%{}%", name));
    }
}
