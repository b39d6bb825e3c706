//! # Location Repository
//!
//! Warehouses, kitchens and distribution points.

use chrono::Utc;
use mbg_core::input::LocationInput;
use mbg_core::{Location, LocationType, Page};
use sqlx::SqlitePool;
use tracing::debug;

use super::{expect_one, new_id, ListQuery};
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: SqlitePool,
}

impl LocationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LocationRepository { pool }
    }

    /// Lists locations, optionally of one type only.
    pub async fn list(
        &self,
        query: &ListQuery,
        location_type: Option<LocationType>,
    ) -> DbResult<Page<Location>> {
        let pattern = query.pattern();
        const WHERE: &str = r#"
            FROM locations
            WHERE (?1 IS NULL OR code LIKE ?1 ESCAPE '\' OR name LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR location_type = ?2)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {WHERE}"))
            .bind(&pattern)
            .bind(location_type)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, Location>(&format!(
            "SELECT * {WHERE} ORDER BY name LIMIT ?3 OFFSET ?4"
        ))
        .bind(&pattern)
        .bind(location_type)
        .bind(query.page.limit())
        .bind(query.page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(rows, query.page, total))
    }

    pub async fn get(&self, id: &str) -> DbResult<Location> {
        sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Location", id))
    }

    pub async fn create(&self, input: &LocationInput) -> DbResult<Location> {
        input.validate()?;
        debug!(code = %input.code, "Inserting location");

        let now = Utc::now();
        let location = Location {
            id: new_id(),
            code: input.code.trim().to_string(),
            name: input.name.trim().to_string(),
            location_type: input.location_type,
            address: input.address.clone(),
            capacity_kg: input.capacity_kg,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO locations (
                id, code, name, location_type, address, capacity_kg,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&location.id)
        .bind(&location.code)
        .bind(&location.name)
        .bind(location.location_type)
        .bind(&location.address)
        .bind(location.capacity_kg)
        .bind(location.is_active)
        .bind(location.created_at)
        .bind(location.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(location)
    }

    pub async fn update(&self, id: &str, input: &LocationInput) -> DbResult<Location> {
        input.validate()?;
        debug!(id = %id, "Updating location");

        let result = sqlx::query(
            r#"
            UPDATE locations SET
                code = ?2, name = ?3, location_type = ?4, address = ?5,
                capacity_kg = ?6, is_active = ?7, updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.code.trim())
        .bind(input.name.trim())
        .bind(input.location_type)
        .bind(&input.address)
        .bind(input.capacity_kg)
        .bind(input.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        expect_one(result.rows_affected(), "Location", id)?;

        self.get(id).await
    }

    /// Deletes a location that holds no stock and no documents.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting location");
        let result = sqlx::query("DELETE FROM locations WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "Location", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db, item, location, stock};
    use mbg_core::ItemType;

    #[tokio::test]
    async fn test_filter_by_type() {
        let db = db().await;
        location(&db, "WH-1", LocationType::CentralWarehouse).await;
        location(&db, "KIT-1", LocationType::Kitchen).await;
        location(&db, "KIT-2", LocationType::Kitchen).await;

        let kitchens = db
            .locations()
            .list(&ListQuery::default(), Some(LocationType::Kitchen))
            .await
            .unwrap();
        assert_eq!(kitchens.pagination.total, 2);
        assert!(kitchens
            .items
            .iter()
            .all(|l| l.location_type == LocationType::Kitchen));
    }

    #[tokio::test]
    async fn test_delete_in_use_is_rejected() {
        let db = db().await;
        let wh = location(&db, "WH-1", LocationType::CentralWarehouse).await;
        let rice = item(&db, "RICE", ItemType::RawMaterial, 100).await;
        stock(&db, &rice, &wh, 1.0, "", None).await;

        assert!(matches!(
            db.locations().delete(&wh.id).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }
}
