//! Master catalog service
//!
//! Masters are the mechanics a sale credits; `amount` and `percentage`
//! describe how their cut of a sale is computed.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::product::CatalogListFilter;
use shared::models::Master;
use shared::types::{PaginatedResponse, PaginationMeta};
use shared::validation::{validate_price, validate_required_text};

/// Master service
#[derive(Clone)]
pub struct MasterService {
    db: PgPool,
}

/// Input for creating a master
#[derive(Debug, Deserialize)]
pub struct CreateMasterInput {
    pub name: String,
    pub amount: Option<Decimal>,
    pub percentage: Option<Decimal>,
}

/// Input for updating a master
#[derive(Debug, Deserialize)]
pub struct UpdateMasterInput {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub percentage: Option<Decimal>,
}

#[derive(Debug, FromRow)]
struct MasterRow {
    id: Uuid,
    name: String,
    amount: Decimal,
    percentage: Decimal,
    user_id: Uuid,
}

impl MasterRow {
    fn into_model(self) -> Master {
        Master {
            id: self.id,
            name: self.name,
            amount: self.amount,
            percentage: self.percentage,
            user_id: self.user_id,
        }
    }
}

impl MasterService {
    /// Create a new MasterService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a master
    pub async fn create_master(
        &self,
        user_id: Uuid,
        input: CreateMasterInput,
    ) -> AppResult<Master> {
        validate_required_text(&input.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;

        let amount = input.amount.unwrap_or(Decimal::ZERO);
        let percentage = input.percentage.unwrap_or(Decimal::ZERO);
        Self::validate_rates(amount, percentage)?;

        let row = sqlx::query_as::<_, MasterRow>(
            "INSERT INTO masters (name, amount, percentage, user_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, name, amount, percentage, user_id",
        )
        .bind(&input.name)
        .bind(amount)
        .bind(percentage)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into_model())
    }

    /// Update a master
    pub async fn update_master(
        &self,
        master_id: Uuid,
        input: UpdateMasterInput,
    ) -> AppResult<Master> {
        let existing = self.get_master(master_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let amount = input.amount.unwrap_or(existing.amount);
        let percentage = input.percentage.unwrap_or(existing.percentage);

        validate_required_text(&name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;
        Self::validate_rates(amount, percentage)?;

        let row = sqlx::query_as::<_, MasterRow>(
            "UPDATE masters SET name = $1, amount = $2, percentage = $3 \
             WHERE id = $4 \
             RETURNING id, name, amount, percentage, user_id",
        )
        .bind(&name)
        .bind(amount)
        .bind(percentage)
        .bind(master_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into_model())
    }

    /// Get a master by id
    pub async fn get_master(&self, master_id: Uuid) -> AppResult<Master> {
        let row = sqlx::query_as::<_, MasterRow>(
            "SELECT id, name, amount, percentage, user_id FROM masters WHERE id = $1",
        )
        .bind(master_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Master".to_string()))?;

        Ok(row.into_model())
    }

    /// List masters, optionally filtered by name substring
    pub async fn list_masters(
        &self,
        filter: CatalogListFilter,
    ) -> AppResult<PaginatedResponse<Master>> {
        let pagination = filter.pagination();

        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM masters WHERE TRUE");
        if let Some(name) = &filter.name {
            count_query
                .push(" AND name ILIKE ")
                .push_bind(format!("%{}%", name));
        }
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.db)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT id, name, amount, percentage, user_id FROM masters WHERE TRUE",
        );
        if let Some(name) = &filter.name {
            query
                .push(" AND name ILIKE ")
                .push_bind(format!("%{}%", name));
        }
        query
            .push(" ORDER BY name LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query
            .build_query_as::<MasterRow>()
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse {
            pagination: PaginationMeta::new(&pagination, total as u64),
            data: rows.into_iter().map(MasterRow::into_model).collect(),
        })
    }

    fn validate_rates(amount: Decimal, percentage: Decimal) -> AppResult<()> {
        validate_price(amount).map_err(|msg| AppError::Validation {
            field: "amount".to_string(),
            message: msg.to_string(),
        })?;
        validate_price(percentage).map_err(|msg| AppError::Validation {
            field: "percentage".to_string(),
            message: msg.to_string(),
        })?;
        Ok(())
    }
}
