//! Sale service: services rendered plus parts drawn from stock
//!
//! Creating a sale consumes stock: every referenced lot is debited by the
//! quantity sold from it, all-or-nothing across the whole sale. Lines
//! naming the same lot are folded together first, so one sale can never
//! jointly draw more than a lot has on hand.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{db, StockService};
use shared::models::{Sale, SaleLine};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::{validate_positive_quantity, validate_price, validate_required_text};

/// Sale service
#[derive(Clone)]
pub struct SaleService {
    db: PgPool,
}

/// One stock line of a sale
#[derive(Debug, Clone, Deserialize)]
pub struct SaleItemInput {
    pub stock_id: Uuid,
    pub count: Decimal,
}

/// Input for recording a sale
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSaleInput {
    pub date: Option<NaiveDate>,
    pub vehicle_model: String,
    pub vehicle_vin: String,
    pub vehicle_reg: Option<String>,
    pub master_id: Option<Uuid>,
    pub service: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub items: Vec<SaleItemInput>,
}

/// A sale with the lots it drew on
#[derive(Debug, Clone, Serialize)]
pub struct SaleWithLines {
    #[serde(flatten)]
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

/// Filters for the sale listing
#[derive(Debug, Default, Deserialize)]
pub struct SaleListFilter {
    pub vehicle_model: Option<String>,
    pub vehicle_vin: Option<String>,
    pub vehicle_reg: Option<String>,
    pub service: Option<String>,
    pub master_id: Option<Uuid>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub from_price: Option<Decimal>,
    pub to_price: Option<Decimal>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl SaleListFilter {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(1),
            per_page: self.per_page.unwrap_or(20),
        }
    }
}

#[derive(Debug, FromRow)]
struct SaleRow {
    id: Uuid,
    date: NaiveDate,
    vehicle_model: String,
    vehicle_vin: String,
    vehicle_reg: Option<String>,
    master_id: Option<Uuid>,
    service: Option<String>,
    price: Decimal,
    user_id: Uuid,
}

impl SaleRow {
    fn into_model(self) -> Sale {
        Sale {
            id: self.id,
            date: self.date,
            vehicle_model: self.vehicle_model,
            vehicle_vin: self.vehicle_vin,
            vehicle_reg: self.vehicle_reg,
            master_id: self.master_id,
            service: self.service,
            price: self.price,
            user_id: self.user_id,
        }
    }
}

const SALE_COLUMNS: &str =
    "id, date, vehicle_model, vehicle_vin, vehicle_reg, master_id, service, price, user_id";

impl SaleService {
    /// Create a new SaleService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a sale and consume the referenced stock.
    pub async fn create_sale(&self, user_id: Uuid, input: CreateSaleInput) -> AppResult<SaleWithLines> {
        self.validate_input(&input)?;

        if let Some(master_id) = input.master_id {
            let master_exists =
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM masters WHERE id = $1)")
                    .bind(master_id)
                    .fetch_one(&self.db)
                    .await?;
            if !master_exists {
                return Err(AppError::NotFound("Master".to_string()));
            }
        }

        match self.try_create_sale(user_id, &input).await {
            Err(AppError::Database(err)) if db::is_transient(&err) => {
                self.try_create_sale(user_id, &input).await
            }
            result => result,
        }
    }

    async fn try_create_sale(
        &self,
        user_id: Uuid,
        input: &CreateSaleInput,
    ) -> AppResult<SaleWithLines> {
        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());

        // Fold lines per lot; the BTreeMap also fixes the lock order, so two
        // concurrent sales touching the same lots cannot deadlock.
        let mut per_lot: BTreeMap<Uuid, Decimal> = BTreeMap::new();
        for item in &input.items {
            *per_lot.entry(item.stock_id).or_insert(Decimal::ZERO) += item.count;
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "INSERT INTO sales \
             (date, vehicle_model, vehicle_vin, vehicle_reg, master_id, service, price, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {SALE_COLUMNS}"
        ))
        .bind(date)
        .bind(&input.vehicle_model)
        .bind(&input.vehicle_vin)
        .bind(&input.vehicle_reg)
        .bind(input.master_id)
        .bind(&input.service)
        .bind(input.price)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut lines = Vec::with_capacity(per_lot.len());
        for (stock_id, count) in per_lot {
            let lot = StockService::find_by_id_for_update(&mut tx, stock_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Stock lot".to_string()))?;

            StockService::apply_delta_to_lot(&mut tx, &lot, -count).await?;

            sqlx::query("INSERT INTO sale_stock (sale_id, stock_id, count) VALUES ($1, $2, $3)")
                .bind(row.id)
                .bind(stock_id)
                .bind(count)
                .execute(&mut *tx)
                .await?;

            lines.push(SaleLine {
                stock_id,
                quantity: count,
            });
        }

        tx.commit().await?;

        tracing::debug!(sale_id = %row.id, lines = lines.len(), "sale recorded");

        Ok(SaleWithLines {
            sale: row.into_model(),
            lines,
        })
    }

    fn validate_input(&self, input: &CreateSaleInput) -> AppResult<()> {
        validate_price(input.price).map_err(|msg| AppError::Validation {
            field: "price".to_string(),
            message: msg.to_string(),
        })?;
        validate_required_text(&input.vehicle_model).map_err(|msg| AppError::Validation {
            field: "vehicle_model".to_string(),
            message: msg.to_string(),
        })?;
        validate_required_text(&input.vehicle_vin).map_err(|msg| AppError::Validation {
            field: "vehicle_vin".to_string(),
            message: msg.to_string(),
        })?;
        for item in &input.items {
            validate_positive_quantity(item.count).map_err(|msg| AppError::Validation {
                field: "count".to_string(),
                message: msg.to_string(),
            })?;
        }
        Ok(())
    }

    /// Get a sale with its stock lines
    pub async fn get_sale(&self, sale_id: Uuid) -> AppResult<SaleWithLines> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = $1"
        ))
        .bind(sale_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let lines = sqlx::query_as::<_, (Uuid, Decimal)>(
            "SELECT stock_id, count FROM sale_stock WHERE sale_id = $1 ORDER BY stock_id",
        )
        .bind(sale_id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|(stock_id, quantity)| SaleLine { stock_id, quantity })
        .collect();

        Ok(SaleWithLines {
            sale: row.into_model(),
            lines,
        })
    }

    /// List sales with filters and pagination
    pub async fn list_sales(&self, filter: SaleListFilter) -> AppResult<PaginatedResponse<Sale>> {
        let pagination = filter.pagination();

        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM sales s WHERE TRUE");
        push_sale_filters(&mut count_query, &filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.db)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {SALE_COLUMNS} FROM sales s WHERE TRUE"
        ));
        push_sale_filters(&mut query, &filter);
        query
            .push(" ORDER BY s.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query.build_query_as::<SaleRow>().fetch_all(&self.db).await?;

        Ok(PaginatedResponse {
            pagination: PaginationMeta::new(&pagination, total as u64),
            data: rows.into_iter().map(SaleRow::into_model).collect(),
        })
    }
}

fn push_sale_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &SaleListFilter) {
    if let Some(model) = &filter.vehicle_model {
        query
            .push(" AND s.vehicle_model ILIKE ")
            .push_bind(format!("%{}%", model));
    }
    if let Some(vin) = &filter.vehicle_vin {
        query
            .push(" AND s.vehicle_vin ILIKE ")
            .push_bind(format!("%{}%", vin));
    }
    if let Some(reg) = &filter.vehicle_reg {
        query
            .push(" AND s.vehicle_reg ILIKE ")
            .push_bind(format!("%{}%", reg));
    }
    if let Some(service) = &filter.service {
        query
            .push(" AND s.service ILIKE ")
            .push_bind(format!("%{}%", service));
    }
    if let Some(master_id) = filter.master_id {
        query.push(" AND s.master_id = ").push_bind(master_id);
    }
    if let Some(from) = filter.from_date {
        query.push(" AND s.date >= ").push_bind(from);
    }
    if let Some(to) = filter.to_date {
        query.push(" AND s.date <= ").push_bind(to);
    }
    if let Some(from) = filter.from_price {
        query.push(" AND s.price >= ").push_bind(from);
    }
    if let Some(to) = filter.to_price {
        query.push(" AND s.price <= ").push_bind(to);
    }
}
