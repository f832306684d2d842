//! Supplier catalog service

use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::product::CatalogListFilter;
use shared::models::Supplier;
use shared::types::{PaginatedResponse, PaginationMeta};
use shared::validation::validate_required_text;

/// Supplier service
#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

/// Input for creating or renaming a supplier
#[derive(Debug, Deserialize)]
pub struct SupplierInput {
    pub name: String,
}

impl SupplierService {
    /// Create a new SupplierService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a supplier
    pub async fn create_supplier(
        &self,
        user_id: Uuid,
        input: SupplierInput,
    ) -> AppResult<Supplier> {
        validate_required_text(&input.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;

        let row = sqlx::query_as::<_, (Uuid, String, Uuid)>(
            "INSERT INTO suppliers (name, user_id) VALUES ($1, $2) RETURNING id, name, user_id",
        )
        .bind(&input.name)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(Supplier {
            id: row.0,
            name: row.1,
            user_id: row.2,
        })
    }

    /// Rename a supplier
    pub async fn update_supplier(
        &self,
        supplier_id: Uuid,
        input: SupplierInput,
    ) -> AppResult<Supplier> {
        validate_required_text(&input.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;

        let row = sqlx::query_as::<_, (Uuid, String, Uuid)>(
            "UPDATE suppliers SET name = $1 WHERE id = $2 RETURNING id, name, user_id",
        )
        .bind(&input.name)
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))?;

        Ok(Supplier {
            id: row.0,
            name: row.1,
            user_id: row.2,
        })
    }

    /// Get a supplier by id
    pub async fn get_supplier(&self, supplier_id: Uuid) -> AppResult<Supplier> {
        let row = sqlx::query_as::<_, (Uuid, String, Uuid)>(
            "SELECT id, name, user_id FROM suppliers WHERE id = $1",
        )
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))?;

        Ok(Supplier {
            id: row.0,
            name: row.1,
            user_id: row.2,
        })
    }

    /// List suppliers, optionally filtered by name substring
    pub async fn list_suppliers(
        &self,
        filter: CatalogListFilter,
    ) -> AppResult<PaginatedResponse<Supplier>> {
        let pagination = filter.pagination();

        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM suppliers WHERE TRUE");
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
            QueryBuilder::<Postgres>::new("SELECT id, name, user_id FROM suppliers WHERE TRUE");
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
                .map(|(id, name, user_id)| Supplier { id, name, user_id })
                .collect(),
        })
    }
}
