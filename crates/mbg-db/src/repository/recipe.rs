//! # Recipe Repository
//!
//! Recipes and their ingredient lines. Ingredient quantities are stored per
//! `portion_size` units of the output item; see [`mbg_core::recipe`] for
//! the scaling rule.

use chrono::Utc;
use mbg_core::input::RecipeInput;
use mbg_core::recipe::{scale_recipe, ScaledRecipe};
use mbg_core::{CoreError, Item, ItemType, Page, Recipe, RecipeDetail, RecipeItem};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};

use super::{begin_posting, ensure_exists, new_id, ListQuery};
use crate::error::{DbError, DbResult};

// =============================================================================
// Shared Queries
// =============================================================================

pub(crate) async fn fetch_recipe(conn: &mut SqliteConnection, id: &str) -> DbResult<RecipeDetail> {
    let recipe = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Recipe", id))?;

    let items = sqlx::query_as::<_, RecipeItem>(
        "SELECT * FROM recipe_items WHERE recipe_id = ?1 ORDER BY rowid",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(RecipeDetail { recipe, items })
}

/// Scales a loaded recipe to `target` output units, pricing each
/// ingredient from the item master.
pub(crate) async fn scale_detail(
    conn: &mut SqliteConnection,
    detail: &RecipeDetail,
    target: f64,
) -> DbResult<ScaledRecipe> {
    let mut items: HashMap<String, Item> = HashMap::with_capacity(detail.items.len());
    for line in &detail.items {
        if let Some(item) = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = ?1")
            .bind(&line.item_id)
            .fetch_optional(&mut *conn)
            .await?
        {
            items.insert(item.id.clone(), item);
        }
    }

    let scaled = scale_recipe(
        &detail.recipe.id,
        detail.recipe.portion_size,
        &detail.items,
        &items,
        target,
    )?;
    Ok(scaled)
}

/// Output must be a finished good and every ingredient must exist.
async fn check_references(conn: &mut SqliteConnection, input: &RecipeInput) -> DbResult<()> {
    let output = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = ?1")
        .bind(&input.output_item_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Item", &input.output_item_id))?;
    if !output.is_finished_good() {
        return Err(CoreError::ItemTypeMismatch {
            item: output.sku,
            expected: ItemType::FinishedGood.to_string(),
        }
        .into());
    }

    for line in &input.items {
        ensure_exists(conn, "items", "Item", &line.item_id).await?;
    }
    Ok(())
}

async fn write_lines(
    conn: &mut SqliteConnection,
    recipe_id: &str,
    input: &RecipeInput,
) -> DbResult<()> {
    for line in &input.items {
        sqlx::query(
            r#"
            INSERT INTO recipe_items (id, recipe_id, item_id, quantity, unit)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(new_id())
        .bind(recipe_id)
        .bind(&line.item_id)
        .bind(line.quantity)
        .bind(line.unit.trim())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct RecipeRepository {
    pool: SqlitePool,
}

impl RecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RecipeRepository { pool }
    }

    pub async fn list(&self, query: &ListQuery) -> DbResult<Page<Recipe>> {
        let pattern = query.pattern();
        const WHERE: &str =
            r"FROM recipes WHERE (?1 IS NULL OR code LIKE ?1 ESCAPE '\' OR name LIKE ?1 ESCAPE '\')";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {WHERE}"))
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT * {WHERE} ORDER BY name LIMIT ?2 OFFSET ?3"
        ))
        .bind(&pattern)
        .bind(query.page.limit())
        .bind(query.page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(rows, query.page, total))
    }

    pub async fn get(&self, id: &str) -> DbResult<RecipeDetail> {
        let mut conn = self.pool.acquire().await?;
        fetch_recipe(&mut conn, id).await
    }

    pub async fn create(&self, input: &RecipeInput) -> DbResult<RecipeDetail> {
        input.validate()?;

        let mut tx = begin_posting(&self.pool).await?;
        check_references(&mut tx, input).await?;

        let id = new_id();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO recipes (
                id, code, name, output_item_id, portion_size, portion_unit,
                instructions, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )
        .bind(&id)
        .bind(input.code.trim())
        .bind(input.name.trim())
        .bind(&input.output_item_id)
        .bind(input.portion_size)
        .bind(input.portion_unit.trim())
        .bind(&input.instructions)
        .bind(input.is_active)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        write_lines(&mut tx, &id, input).await?;

        let detail = fetch_recipe(&mut tx, &id).await?;
        tx.commit().await?;

        info!(code = %detail.recipe.code, ingredients = detail.items.len(), "Created recipe");
        Ok(detail)
    }

    /// Replaces the recipe header and all ingredient lines.
    pub async fn update(&self, id: &str, input: &RecipeInput) -> DbResult<RecipeDetail> {
        input.validate()?;

        let mut tx = begin_posting(&self.pool).await?;
        ensure_exists(&mut tx, "recipes", "Recipe", id).await?;
        check_references(&mut tx, input).await?;

        sqlx::query(
            r#"
            UPDATE recipes SET
                code = ?2, name = ?3, output_item_id = ?4, portion_size = ?5,
                portion_unit = ?6, instructions = ?7, is_active = ?8, updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.code.trim())
        .bind(input.name.trim())
        .bind(&input.output_item_id)
        .bind(input.portion_size)
        .bind(input.portion_unit.trim())
        .bind(&input.instructions)
        .bind(input.is_active)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM recipe_items WHERE recipe_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        write_lines(&mut tx, id, input).await?;

        let detail = fetch_recipe(&mut tx, id).await?;
        tx.commit().await?;

        debug!(code = %detail.recipe.code, "Updated recipe");
        Ok(detail)
    }

    /// Deletes a recipe and its lines. Recipes referenced by work orders
    /// cannot be deleted.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting recipe");
        let result = sqlx::query("DELETE FROM recipes WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        super::expect_one(result.rows_affected(), "Recipe", id)
    }

    /// Ingredient requirements and cost for `target` output units.
    pub async fn scale(&self, id: &str, target: f64) -> DbResult<ScaledRecipe> {
        let mut conn = self.pool.acquire().await?;
        let detail = fetch_recipe(&mut conn, id).await?;
        scale_detail(&mut conn, &detail, target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db, nasi_ayam};

    #[tokio::test]
    async fn test_create_and_scale() {
        let db = db().await;
        let input = nasi_ayam(&db).await;
        let recipe = db.recipes().create(&input).await.unwrap();
        assert_eq!(recipe.items.len(), 2);

        let scaled = db.recipes().scale(&recipe.recipe.id, 250.0).await.unwrap();
        assert_eq!(scaled.ingredients[0].quantity, 20.0);
        assert_eq!(scaled.ingredients[1].quantity, 15.0);
        // 20 kg x 12.00 + 15 kg x 35.00
        assert_eq!(scaled.total_cost_cents, 24_000 + 52_500);
        assert_eq!(scaled.cost_per_portion_cents, 306);

        let doubled = db.recipes().scale(&recipe.recipe.id, 500.0).await.unwrap();
        assert_eq!(doubled.ingredients[0].quantity, 40.0);
    }

    #[tokio::test]
    async fn test_output_must_be_finished_good() {
        let db = db().await;
        let mut input = nasi_ayam(&db).await;
        input.output_item_id = input.items[0].item_id.clone();

        let err = db.recipes().create(&input).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::ItemTypeMismatch { ref item, .. }) if item == "RICE"
        ));
    }

    #[tokio::test]
    async fn test_update_replaces_lines() {
        let db = db().await;
        let mut input = nasi_ayam(&db).await;
        let recipe = db.recipes().create(&input).await.unwrap();

        input.items.pop();
        input.portion_size = 50.0;
        let updated = db.recipes().update(&recipe.recipe.id, &input).await.unwrap();
        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.recipe.portion_size, 50.0);

        db.recipes().delete(&recipe.recipe.id).await.unwrap();
        assert!(matches!(
            db.recipes().get(&recipe.recipe.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_portion_size_is_rejected() {
        let db = db().await;
        let mut input = nasi_ayam(&db).await;
        input.portion_size = 0.0;
        assert!(matches!(
            db.recipes().create(&input).await,
            Err(DbError::Core(CoreError::Validation(_)))
        ));
    }
}
