//! # Category Repository

use chrono::Utc;
use mbg_core::input::CategoryInput;
use mbg_core::{Category, Page};
use sqlx::SqlitePool;
use tracing::debug;

use super::{expect_one, new_id, ListQuery};
use crate::error::{DbError, DbResult};

/// Repository for item categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn list(&self, query: &ListQuery) -> DbResult<Page<Category>> {
        let pattern = query.pattern();
        const WHERE: &str =
            r"FROM categories WHERE (?1 IS NULL OR code LIKE ?1 ESCAPE '\' OR name LIKE ?1 ESCAPE '\')";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {WHERE}"))
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, Category>(&format!(
            "SELECT * {WHERE} ORDER BY name LIMIT ?2 OFFSET ?3"
        ))
        .bind(&pattern)
        .bind(query.page.limit())
        .bind(query.page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(rows, query.page, total))
    }

    pub async fn get(&self, id: &str) -> DbResult<Category> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    pub async fn create(&self, input: &CategoryInput) -> DbResult<Category> {
        input.validate()?;
        debug!(code = %input.code, "Inserting category");

        let now = Utc::now();
        let category = Category {
            id: new_id(),
            code: input.code.trim().to_string(),
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO categories (id, code, name, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&category.id)
        .bind(&category.code)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn update(&self, id: &str, input: &CategoryInput) -> DbResult<Category> {
        input.validate()?;
        debug!(id = %id, "Updating category");

        let result = sqlx::query(
            "UPDATE categories SET code = ?2, name = ?3, description = ?4, updated_at = ?5 WHERE id = ?1",
        )
        .bind(id)
        .bind(input.code.trim())
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        expect_one(result.rows_affected(), "Category", id)?;

        self.get(id).await
    }

    /// Deletes a category. Fails with a foreign key violation while items
    /// still point at it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");
        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "Category", id)
    }
}
