//! Measurement unit catalog service

use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::product::CatalogListFilter;
use shared::models::Unit;
use shared::types::{PaginatedResponse, PaginationMeta};
use shared::validation::validate_required_text;

/// Unit service
#[derive(Clone)]
pub struct UnitService {
    db: PgPool,
}

/// Input for creating or renaming a unit
#[derive(Debug, Deserialize)]
pub struct UnitInput {
    pub name: String,
}

impl UnitService {
    /// Create a new UnitService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a unit
    pub async fn create_unit(&self, user_id: Uuid, input: UnitInput) -> AppResult<Unit> {
        validate_required_text(&input.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;

        let row = sqlx::query_as::<_, (Uuid, String, Uuid)>(
            "INSERT INTO units (name, user_id) VALUES ($1, $2) RETURNING id, name, user_id",
        )
        .bind(&input.name)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(Unit {
            id: row.0,
            name: row.1,
            user_id: row.2,
        })
    }

    /// Rename a unit
    pub async fn update_unit(&self, unit_id: Uuid, input: UnitInput) -> AppResult<Unit> {
        validate_required_text(&input.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;

        let row = sqlx::query_as::<_, (Uuid, String, Uuid)>(
            "UPDATE units SET name = $1 WHERE id = $2 RETURNING id, name, user_id",
        )
        .bind(&input.name)
        .bind(unit_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Unit".to_string()))?;

        Ok(Unit {
            id: row.0,
            name: row.1,
            user_id: row.2,
        })
    }

    /// Get a unit by id
    pub async fn get_unit(&self, unit_id: Uuid) -> AppResult<Unit> {
        let row = sqlx::query_as::<_, (Uuid, String, Uuid)>(
            "SELECT id, name, user_id FROM units WHERE id = $1",
        )
        .bind(unit_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Unit".to_string()))?;

        Ok(Unit {
            id: row.0,
            name: row.1,
            user_id: row.2,
        })
    }

    /// List units, optionally filtered by name substring
    pub async fn list_units(
        &self,
        filter: CatalogListFilter,
    ) -> AppResult<PaginatedResponse<Unit>> {
        let pagination = filter.pagination();

        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM units WHERE TRUE");
        if let Some(name) = &filter.name {
            count_query
                .push(" AND name ILIKE ")
                .push_bind(format!("%{}%", name));
        }
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.db)
            .await?;

        let mut query =
            QueryBuilder::<Postgres>::new("SELECT id, name, user_id FROM units WHERE TRUE");
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
            .build_query_as::<(Uuid, String, Uuid)>()
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse {
            pagination: PaginationMeta::new(&pagination, total as u64),
            data: rows
                .into_iter()
                .map(|(id, name, user_id)| Unit { id, name, user_id })
                .collect(),
        })
    }
}
