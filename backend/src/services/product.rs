//! Product catalog service

use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::Product;
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::validate_required_text;

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Input for creating or renaming a product
#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub name: String,
}

/// Filters for the product listing
#[derive(Debug, Default, Deserialize)]
pub struct CatalogListFilter {
    pub name: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl CatalogListFilter {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(1),
            per_page: self.per_page.unwrap_or(20),
        }
    }
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product
    pub async fn create_product(&self, user_id: Uuid, input: ProductInput) -> AppResult<Product> {
        validate_required_text(&input.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;

        let row = sqlx::query_as::<_, (Uuid, String, Uuid)>(
            "INSERT INTO products (name, user_id) VALUES ($1, $2) RETURNING id, name, user_id",
        )
        .bind(&input.name)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(Product {
            id: row.0,
            name: row.1,
            user_id: row.2,
        })
    }

    /// Rename a product
    pub async fn update_product(&self, product_id: Uuid, input: ProductInput) -> AppResult<Product> {
        validate_required_text(&input.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;

        let row = sqlx::query_as::<_, (Uuid, String, Uuid)>(
            "UPDATE products SET name = $1 WHERE id = $2 RETURNING id, name, user_id",
        )
        .bind(&input.name)
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(Product {
            id: row.0,
            name: row.1,
            user_id: row.2,
        })
    }

    /// Get a product by id
    pub async fn get_product(&self, product_id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, (Uuid, String, Uuid)>(
            "SELECT id, name, user_id FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(Product {
            id: row.0,
            name: row.1,
            user_id: row.2,
        })
    }

    /// List products, optionally filtered by name substring
    pub async fn list_products(
        &self,
        filter: CatalogListFilter,
    ) -> AppResult<PaginatedResponse<Product>> {
        let pagination = filter.pagination();

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE TRUE");
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
            QueryBuilder::<Postgres>::new("SELECT id, name, user_id FROM products WHERE TRUE");
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
                .map(|(id, name, user_id)| Product { id, name, user_id })
                .collect(),
        })
    }
}
