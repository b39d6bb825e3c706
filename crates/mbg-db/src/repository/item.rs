//! # Item Repository
//!
//! Raw materials and finished goods.
//!
//! ## Search
//! ```text
//! ?search=ber  ──►  sku LIKE '%ber%' OR code LIKE ... OR name LIKE ...
//!                   BERAS-5KG | BRS | Beras Premium 5kg   ← match
//! ```

use chrono::Utc;
use mbg_core::input::ItemInput;
use mbg_core::{Item, ItemType, Page};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::debug;

use super::{expect_one, new_id, ListQuery};
use crate::error::{DbError, DbResult};

/// Extra filters for the item list.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub item_type: Option<ItemType>,
    pub category_id: Option<String>,
    pub active_only: bool,
}

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    pub async fn list(&self, query: &ListQuery, filter: &ItemFilter) -> DbResult<Page<Item>> {
        let pattern = query.pattern();
        debug!(search = ?query.search, "Listing items");

        const WHERE: &str = r#"
            FROM items
            WHERE (?1 IS NULL OR sku LIKE ?1 ESCAPE '\' OR code LIKE ?1 ESCAPE '\' OR name LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR item_type = ?2)
              AND (?3 IS NULL OR category_id = ?3)
              AND (?4 = 0 OR is_active = 1)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {WHERE}"))
            .bind(&pattern)
            .bind(filter.item_type)
            .bind(&filter.category_id)
            .bind(filter.active_only)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, Item>(&format!(
            "SELECT * {WHERE} ORDER BY name LIMIT ?5 OFFSET ?6"
        ))
        .bind(&pattern)
        .bind(filter.item_type)
        .bind(&filter.category_id)
        .bind(filter.active_only)
        .bind(query.page.limit())
        .bind(query.page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(rows, query.page, total))
    }

    pub async fn get(&self, id: &str) -> DbResult<Item> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Item", id))
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE sku = ?1")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    /// Loads several items keyed by id. Unknown ids are skipped.
    pub async fn get_many(&self, ids: &[String]) -> DbResult<HashMap<String, Item>> {
        let mut items = HashMap::with_capacity(ids.len());
        for id in ids {
            if items.contains_key(id) {
                continue;
            }
            if let Some(item) = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            {
                items.insert(id.clone(), item);
            }
        }
        Ok(items)
    }

    /// Inserts a new item.
    ///
    /// ## Errors
    /// `UniqueViolation(["sku"])` or `(["code"])` on duplicates.
    pub async fn create(&self, input: &ItemInput) -> DbResult<Item> {
        input.validate()?;
        debug!(sku = %input.sku, "Inserting item");

        let now = Utc::now();
        let item = Item {
            id: new_id(),
            sku: input.sku.trim().to_string(),
            code: input.code.trim().to_string(),
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            item_type: input.item_type,
            unit: input.unit.trim().to_string(),
            category_id: input.category_id.clone(),
            reorder_point: input.reorder_point,
            price_cents: input.price_cents,
            shelf_life_days: input.shelf_life_days,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO items (
                id, sku, code, name, description, item_type, unit, category_id,
                reorder_point, price_cents, shelf_life_days, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sku)
        .bind(&item.code)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.item_type)
        .bind(&item.unit)
        .bind(&item.category_id)
        .bind(item.reorder_point)
        .bind(item.price_cents)
        .bind(item.shelf_life_days)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    pub async fn update(&self, id: &str, input: &ItemInput) -> DbResult<Item> {
        input.validate()?;
        debug!(id = %id, "Updating item");

        let result = sqlx::query(
            r#"
            UPDATE items SET
                sku = ?2, code = ?3, name = ?4, description = ?5, item_type = ?6,
                unit = ?7, category_id = ?8, reorder_point = ?9, price_cents = ?10,
                shelf_life_days = ?11, is_active = ?12, updated_at = ?13
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.sku.trim())
        .bind(input.code.trim())
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.item_type)
        .bind(input.unit.trim())
        .bind(&input.category_id)
        .bind(input.reorder_point)
        .bind(input.price_cents)
        .bind(input.shelf_life_days)
        .bind(input.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        expect_one(result.rows_affected(), "Item", id)?;

        self.get(id).await
    }

    /// Deletes an item. Items with stock, recipe lines or document lines
    /// cannot be deleted (foreign key violation); deactivate them instead.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting item");
        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "Item", id)
    }

    /// Counts active items (for the dashboard).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db, item};

    fn input(sku: &str, code: &str) -> ItemInput {
        ItemInput {
            sku: sku.to_string(),
            code: code.to_string(),
            name: "Beras Premium".to_string(),
            description: None,
            item_type: ItemType::RawMaterial,
            unit: "kg".to_string(),
            category_id: None,
            reorder_point: 10.0,
            price_cents: 1_250_000,
            shelf_life_days: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_duplicate_sku_and_code() {
        let db = db().await;
        db.items().create(&input("BERAS-5KG", "BRS")).await.unwrap();

        let err = db.items().create(&input("BERAS-5KG", "OTHER")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref fields } if fields == &vec!["sku"]));

        let err = db.items().create(&input("OTHER", "BRS")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref fields } if fields == &vec!["code"]));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = db().await;
        item(&db, "RICE", ItemType::RawMaterial, 100).await;
        item(&db, "MEAL", ItemType::FinishedGood, 0).await;

        let finished = db
            .items()
            .list(
                &ListQuery::default(),
                &ItemFilter {
                    item_type: Some(ItemType::FinishedGood),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(finished.pagination.total, 1);
        assert_eq!(finished.items[0].sku, "MEAL");

        let searched = db
            .items()
            .list(
                &ListQuery::new(Default::default(), Some("ric".to_string())),
                &ItemFilter::default(),
            )
            .await
            .unwrap();
        assert_eq!(searched.items.len(), 1);
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let db = db().await;
        let err = db.items().update("nope", &input("X", "Y")).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
