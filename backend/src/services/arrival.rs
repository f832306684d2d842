//! Arrival service: receiving stock into inventory
//!
//! Creating an arrival posts one ledger credit per line item, all inside a
//! single transaction: if any item fails, no arrival record and no credit
//! survives.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{db, StockService};
use shared::models::{Arrival, ArrivalStatus, LotKey};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::{validate_positive_quantity, validate_price, validate_required_text};

/// Arrival service for recording received stock
#[derive(Clone)]
pub struct ArrivalService {
    db: PgPool,
}

/// One line item of an arrival
#[derive(Debug, Clone, Deserialize)]
pub struct ArrivalItemInput {
    pub product_id: Uuid,
    pub unit_id: Uuid,
    pub count: Decimal,
    pub purchase_price: Decimal,
    pub retail_price: Decimal,
    pub manufacturer: String,
    pub info: Option<String>,
}

/// Input for recording an arrival (one invoice, many items)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateArrivalInput {
    pub supplier_id: Uuid,
    pub invoice_number: String,
    pub date: Option<NaiveDate>,
    pub items: Vec<ArrivalItemInput>,
}

/// Input for updating arrival bookkeeping fields.
///
/// Status changes are validated against the transition table but never
/// re-post stock; quantities and prices are immutable once received.
#[derive(Debug, Deserialize)]
pub struct UpdateArrivalInput {
    pub invoice_number: Option<String>,
    pub manufacturer: Option<String>,
    pub info: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<ArrivalStatus>,
}

/// Filters for the arrival listing
#[derive(Debug, Default, Deserialize)]
pub struct ArrivalListFilter {
    pub supplier_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub status: Option<ArrivalStatus>,
    pub invoice_number: Option<String>,
    pub manufacturer: Option<String>,
    pub info: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub from_purchase_price: Option<Decimal>,
    pub to_purchase_price: Option<Decimal>,
    pub from_retail_price: Option<Decimal>,
    pub to_retail_price: Option<Decimal>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ArrivalListFilter {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(1),
            per_page: self.per_page.unwrap_or(20),
        }
    }
}

/// Arrival with joined display names for listings
#[derive(Debug, Clone, Serialize)]
pub struct ArrivalWithNames {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_id: Uuid,
    pub unit_name: String,
    pub invoice_number: String,
    pub date: NaiveDate,
    pub manufacturer: String,
    pub count: Decimal,
    pub purchase_price: Decimal,
    pub retail_price: Decimal,
    pub info: Option<String>,
    pub status: ArrivalStatus,
    pub user_id: Uuid,
}

#[derive(Debug, FromRow)]
struct ArrivalListRow {
    id: Uuid,
    supplier_id: Uuid,
    supplier_name: String,
    product_id: Uuid,
    product_name: String,
    unit_id: Uuid,
    unit_name: String,
    invoice_number: String,
    date: NaiveDate,
    manufacturer: String,
    count: Decimal,
    purchase_price: Decimal,
    retail_price: Decimal,
    info: Option<String>,
    status: i16,
    user_id: Uuid,
}

impl ArrivalListRow {
    fn into_model(self) -> AppResult<ArrivalWithNames> {
        let status = ArrivalStatus::from_code(self.status)
            .ok_or_else(|| AppError::Internal(format!("unknown arrival status {}", self.status)))?;
        Ok(ArrivalWithNames {
            id: self.id,
            supplier_id: self.supplier_id,
            supplier_name: self.supplier_name,
            product_id: self.product_id,
            product_name: self.product_name,
            unit_id: self.unit_id,
            unit_name: self.unit_name,
            invoice_number: self.invoice_number,
            date: self.date,
            manufacturer: self.manufacturer,
            count: self.count,
            purchase_price: self.purchase_price,
            retail_price: self.retail_price,
            info: self.info,
            status,
            user_id: self.user_id,
        })
    }
}

#[derive(Debug, FromRow)]
struct ArrivalRow {
    id: Uuid,
    supplier_id: Uuid,
    product_id: Uuid,
    unit_id: Uuid,
    invoice_number: String,
    date: NaiveDate,
    manufacturer: String,
    count: Decimal,
    purchase_price: Decimal,
    retail_price: Decimal,
    info: Option<String>,
    status: i16,
    user_id: Uuid,
}

impl ArrivalRow {
    fn into_model(self) -> AppResult<Arrival> {
        let status = ArrivalStatus::from_code(self.status)
            .ok_or_else(|| AppError::Internal(format!("unknown arrival status {}", self.status)))?;
        Ok(Arrival {
            id: self.id,
            supplier_id: self.supplier_id,
            product_id: self.product_id,
            unit_id: self.unit_id,
            invoice_number: self.invoice_number,
            date: self.date,
            manufacturer: self.manufacturer,
            count: self.count,
            purchase_price: self.purchase_price,
            retail_price: self.retail_price,
            info: self.info,
            status,
            user_id: self.user_id,
        })
    }
}

const ARRIVAL_COLUMNS: &str = "id, supplier_id, product_id, unit_id, invoice_number, date, \
     manufacturer, count, purchase_price, retail_price, info, status, user_id";

impl ArrivalService {
    /// Create a new ArrivalService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record an arrival: one row plus one ledger credit per item, atomic
    /// across the whole invoice.
    pub async fn create_arrival(
        &self,
        user_id: Uuid,
        input: CreateArrivalInput,
    ) -> AppResult<Vec<Arrival>> {
        self.validate_input(&input)?;

        // Validate supplier exists before opening the transaction
        let supplier_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)",
        )
        .bind(input.supplier_id)
        .fetch_one(&self.db)
        .await?;

        if !supplier_exists {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        match self.try_create_arrival(user_id, &input).await {
            Err(AppError::Database(err))
                if db::is_transient(&err) || db::is_lot_create_race(&err) =>
            {
                self.try_create_arrival(user_id, &input).await
            }
            result => result,
        }
    }

    async fn try_create_arrival(
        &self,
        user_id: Uuid,
        input: &CreateArrivalInput,
    ) -> AppResult<Vec<Arrival>> {
        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());
        let mut tx = self.db.begin().await?;
        let mut created = Vec::with_capacity(input.items.len());

        for item in &input.items {
            let row = sqlx::query_as::<_, ArrivalRow>(&format!(
                "INSERT INTO arrivals (supplier_id, product_id, unit_id, invoice_number, date, \
                 manufacturer, count, purchase_price, retail_price, info, status, user_id) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
                 RETURNING {ARRIVAL_COLUMNS}"
            ))
            .bind(input.supplier_id)
            .bind(item.product_id)
            .bind(item.unit_id)
            .bind(&input.invoice_number)
            .bind(date)
            .bind(&item.manufacturer)
            .bind(item.count)
            .bind(item.purchase_price)
            .bind(item.retail_price)
            .bind(&item.info)
            .bind(ArrivalStatus::default().code())
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

            // Credit the lot keyed by (product, supplier, retail price); a
            // failure here aborts the whole invoice.
            let key = LotKey::new(item.product_id, input.supplier_id, item.retail_price);
            StockService::apply_delta(&mut tx, key, item.unit_id, item.count).await?;

            created.push(row.into_model()?);
        }

        tx.commit().await?;

        tracing::debug!(
            invoice = %input.invoice_number,
            items = created.len(),
            "arrival recorded"
        );

        Ok(created)
    }

    fn validate_input(&self, input: &CreateArrivalInput) -> AppResult<()> {
        validate_required_text(&input.invoice_number).map_err(|msg| AppError::Validation {
            field: "invoice_number".to_string(),
            message: msg.to_string(),
        })?;

        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "An arrival needs at least one item".to_string(),
            });
        }

        for item in &input.items {
            validate_positive_quantity(item.count).map_err(|msg| AppError::Validation {
                field: "count".to_string(),
                message: msg.to_string(),
            })?;
            validate_price(item.purchase_price).map_err(|msg| AppError::Validation {
                field: "purchase_price".to_string(),
                message: msg.to_string(),
            })?;
            validate_price(item.retail_price).map_err(|msg| AppError::Validation {
                field: "retail_price".to_string(),
                message: msg.to_string(),
            })?;
            validate_required_text(&item.manufacturer).map_err(|msg| AppError::Validation {
                field: "manufacturer".to_string(),
                message: msg.to_string(),
            })?;
        }

        Ok(())
    }

    /// Get an arrival by id
    pub async fn get_arrival(&self, arrival_id: Uuid) -> AppResult<Arrival> {
        let row = sqlx::query_as::<_, ArrivalRow>(&format!(
            "SELECT {ARRIVAL_COLUMNS} FROM arrivals WHERE id = $1"
        ))
        .bind(arrival_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Arrival".to_string()))?;

        row.into_model()
    }

    /// Update arrival bookkeeping fields; never touches the ledger.
    pub async fn update_arrival(
        &self,
        arrival_id: Uuid,
        input: UpdateArrivalInput,
    ) -> AppResult<Arrival> {
        let existing = self.get_arrival(arrival_id).await?;

        let status = match input.status {
            Some(next) if next != existing.status => {
                if !existing.status.can_transition(next) {
                    return Err(AppError::InvalidStateTransition(format!(
                        "arrival cannot move from {:?} to {:?}",
                        existing.status, next
                    )));
                }
                next
            }
            _ => existing.status,
        };

        let row = sqlx::query_as::<_, ArrivalRow>(&format!(
            "UPDATE arrivals \
             SET invoice_number = $1, manufacturer = $2, info = $3, date = $4, status = $5 \
             WHERE id = $6 \
             RETURNING {ARRIVAL_COLUMNS}"
        ))
        .bind(input.invoice_number.unwrap_or(existing.invoice_number))
        .bind(input.manufacturer.unwrap_or(existing.manufacturer))
        .bind(input.info.or(existing.info))
        .bind(input.date.unwrap_or(existing.date))
        .bind(status.code())
        .bind(arrival_id)
        .fetch_one(&self.db)
        .await?;

        row.into_model()
    }

    /// List arrivals with filters and pagination
    pub async fn list_arrivals(
        &self,
        filter: ArrivalListFilter,
    ) -> AppResult<PaginatedResponse<ArrivalWithNames>> {
        let pagination = filter.pagination();

        let mut count_query = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM arrivals a WHERE TRUE",
        );
        push_arrival_filters(&mut count_query, &filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.db)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT a.id, a.supplier_id, sup.name AS supplier_name, \
             a.product_id, p.name AS product_name, \
             a.unit_id, u.name AS unit_name, \
             a.invoice_number, a.date, a.manufacturer, a.count, \
             a.purchase_price, a.retail_price, a.info, a.status, a.user_id \
             FROM arrivals a \
             JOIN suppliers sup ON sup.id = a.supplier_id \
             JOIN products p ON p.id = a.product_id \
             JOIN units u ON u.id = a.unit_id \
             WHERE TRUE",
        );
        push_arrival_filters(&mut query, &filter);
        query
            .push(" ORDER BY a.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query
            .build_query_as::<ArrivalListRow>()
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse {
            pagination: PaginationMeta::new(&pagination, total as u64),
            data: rows
                .into_iter()
                .map(ArrivalListRow::into_model)
                .collect::<AppResult<Vec<_>>>()?,
        })
    }
}

fn push_arrival_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ArrivalListFilter) {
    if let Some(supplier_id) = filter.supplier_id {
        query.push(" AND a.supplier_id = ").push_bind(supplier_id);
    }
    if let Some(product_id) = filter.product_id {
        query.push(" AND a.product_id = ").push_bind(product_id);
    }
    if let Some(unit_id) = filter.unit_id {
        query.push(" AND a.unit_id = ").push_bind(unit_id);
    }
    if let Some(status) = filter.status {
        query.push(" AND a.status = ").push_bind(status.code());
    }
    if let Some(invoice) = &filter.invoice_number {
        query
            .push(" AND a.invoice_number ILIKE ")
            .push_bind(format!("%{}%", invoice));
    }
    if let Some(manufacturer) = &filter.manufacturer {
        query
            .push(" AND a.manufacturer ILIKE ")
            .push_bind(format!("%{}%", manufacturer));
    }
    if let Some(info) = &filter.info {
        query
            .push(" AND a.info ILIKE ")
            .push_bind(format!("%{}%", info));
    }
    if let Some(from) = filter.from_date {
        query.push(" AND a.date >= ").push_bind(from);
    }
    if let Some(to) = filter.to_date {
        query.push(" AND a.date <= ").push_bind(to);
    }
    if let Some(from) = filter.from_purchase_price {
        query.push(" AND a.purchase_price >= ").push_bind(from);
    }
    if let Some(to) = filter.to_purchase_price {
        query.push(" AND a.purchase_price <= ").push_bind(to);
    }
    if let Some(from) = filter.from_retail_price {
        query.push(" AND a.retail_price >= ").push_bind(from);
    }
    if let Some(to) = filter.to_retail_price {
        query.push(" AND a.retail_price <= ").push_bind(to);
    }
}
