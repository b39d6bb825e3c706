//! # Beneficiary Repository
//!
//! Schools, health posts and community groups that receive deliveries.

use chrono::Utc;
use mbg_core::input::BeneficiaryInput;
use mbg_core::{Beneficiary, BeneficiaryType, Page};
use sqlx::SqlitePool;
use tracing::debug;

use super::{expect_one, new_id, ListQuery};
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct BeneficiaryRepository {
    pool: SqlitePool,
}

impl BeneficiaryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BeneficiaryRepository { pool }
    }

    pub async fn list(
        &self,
        query: &ListQuery,
        beneficiary_type: Option<BeneficiaryType>,
    ) -> DbResult<Page<Beneficiary>> {
        let pattern = query.pattern();
        const WHERE: &str = r#"
            FROM beneficiaries
            WHERE (?1 IS NULL OR code LIKE ?1 ESCAPE '\' OR name LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR beneficiary_type = ?2)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {WHERE}"))
            .bind(&pattern)
            .bind(beneficiary_type)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, Beneficiary>(&format!(
            "SELECT * {WHERE} ORDER BY name LIMIT ?3 OFFSET ?4"
        ))
        .bind(&pattern)
        .bind(beneficiary_type)
        .bind(query.page.limit())
        .bind(query.page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(rows, query.page, total))
    }

    pub async fn get(&self, id: &str) -> DbResult<Beneficiary> {
        sqlx::query_as::<_, Beneficiary>("SELECT * FROM beneficiaries WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Beneficiary", id))
    }

    pub async fn create(&self, input: &BeneficiaryInput) -> DbResult<Beneficiary> {
        input.validate()?;
        debug!(code = %input.code, "Inserting beneficiary");

        let now = Utc::now();
        let beneficiary = Beneficiary {
            id: new_id(),
            code: input.code.trim().to_string(),
            name: input.name.trim().to_string(),
            beneficiary_type: input.beneficiary_type,
            address: input.address.clone(),
            contact_name: input.contact_name.clone(),
            phone: input.phone.clone(),
            target_portions: input.target_portions,
            location_id: input.location_id.clone(),
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO beneficiaries (
                id, code, name, beneficiary_type, address, contact_name, phone,
                target_portions, location_id, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&beneficiary.id)
        .bind(&beneficiary.code)
        .bind(&beneficiary.name)
        .bind(beneficiary.beneficiary_type)
        .bind(&beneficiary.address)
        .bind(&beneficiary.contact_name)
        .bind(&beneficiary.phone)
        .bind(beneficiary.target_portions)
        .bind(&beneficiary.location_id)
        .bind(beneficiary.is_active)
        .bind(beneficiary.created_at)
        .bind(beneficiary.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(beneficiary)
    }

    pub async fn update(&self, id: &str, input: &BeneficiaryInput) -> DbResult<Beneficiary> {
        input.validate()?;
        debug!(id = %id, "Updating beneficiary");

        let result = sqlx::query(
            r#"
            UPDATE beneficiaries SET
                code = ?2, name = ?3, beneficiary_type = ?4, address = ?5,
                contact_name = ?6, phone = ?7, target_portions = ?8,
                location_id = ?9, is_active = ?10, updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.code.trim())
        .bind(input.name.trim())
        .bind(input.beneficiary_type)
        .bind(&input.address)
        .bind(&input.contact_name)
        .bind(&input.phone)
        .bind(input.target_portions)
        .bind(&input.location_id)
        .bind(input.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        expect_one(result.rows_affected(), "Beneficiary", id)?;

        self.get(id).await
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting beneficiary");
        let result = sqlx::query("DELETE FROM beneficiaries WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "Beneficiary", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::db;

    #[tokio::test]
    async fn test_create_and_filter() {
        let db = db().await;
        let school = BeneficiaryInput {
            code: "SDN-01".to_string(),
            name: "SD Negeri 1".to_string(),
            beneficiary_type: BeneficiaryType::School,
            address: None,
            contact_name: None,
            phone: None,
            target_portions: 320,
            location_id: None,
            is_active: true,
        };
        let created = db.beneficiaries().create(&school).await.unwrap();
        assert_eq!(created.target_portions, 320);

        let posyandu = BeneficiaryInput {
            code: "PSY-01".to_string(),
            name: "Posyandu Melati".to_string(),
            beneficiary_type: BeneficiaryType::HealthPost,
            ..school.clone()
        };
        db.beneficiaries().create(&posyandu).await.unwrap();

        let schools = db
            .beneficiaries()
            .list(&ListQuery::default(), Some(BeneficiaryType::School))
            .await
            .unwrap();
        assert_eq!(schools.pagination.total, 1);
        assert_eq!(schools.items[0].id, created.id);
    }
}
