//! # User Repository
//!
//! Accounts, approval and role assignment.
//!
//! ## Registration Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/auth/register                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  users table empty? ──yes──► role = ADMIN, is_approved = 1             │
//! │       │                                                                 │
//! │       no                                                                │
//! │       ▼                                                                 │
//! │  role = requested (default BENEFICIARY_POINT), is_approved = 0         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ADMIN calls POST /api/users/{id}/approve before first login           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use mbg_core::input::{RegisterUser, UpdateUser};
use mbg_core::{Page, Role, User};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::{begin_posting, expect_one, new_id, ListQuery};
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an account with an already hashed password.
    ///
    /// The emptiness check and the insert share one write transaction, so
    /// two simultaneous first registrations cannot both become ADMIN.
    pub async fn register(&self, input: &RegisterUser, password_hash: &str) -> DbResult<User> {
        input.validate()?;

        let mut tx = begin_posting(&self.pool).await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;
        let first = existing == 0;

        let now = Utc::now();
        let user = User {
            id: new_id(),
            email: input.email.trim().to_lowercase(),
            name: input.name.trim().to_string(),
            password_hash: password_hash.to_string(),
            role: if first {
                Role::Admin
            } else {
                input.role.unwrap_or(Role::BeneficiaryPoint)
            },
            is_approved: first,
            is_active: true,
            location_id: input.location_id.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, name, password_hash, role, is_approved, is_active,
                location_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.is_approved)
        .bind(user.is_active)
        .bind(&user.location_id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(user_id = %user.id, role = %user.role, approved = user.is_approved, "Registered user");
        Ok(user)
    }

    pub async fn get(&self, id: &str) -> DbResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Case-insensitive lookup used by login.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?1")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list(&self, query: &ListQuery) -> DbResult<Page<User>> {
        let pattern = query.pattern();
        const WHERE: &str =
            r"FROM users WHERE (?1 IS NULL OR email LIKE ?1 ESCAPE '\' OR name LIKE ?1 ESCAPE '\')";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {WHERE}"))
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT * {WHERE} ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
        ))
        .bind(&pattern)
        .bind(query.page.limit())
        .bind(query.page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(rows, query.page, total))
    }

    /// Applies the fields present in `input`.
    pub async fn update(&self, id: &str, input: &UpdateUser) -> DbResult<User> {
        input.validate()?;
        debug!(id = %id, "Updating user");

        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE(?2, name),
                role = COALESCE(?3, role),
                is_active = COALESCE(?4, is_active),
                location_id = COALESCE(?5, location_id),
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.role)
        .bind(input.is_active)
        .bind(&input.location_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        expect_one(result.rows_affected(), "User", id)?;

        self.get(id).await
    }

    pub async fn approve(&self, id: &str) -> DbResult<User> {
        let result = sqlx::query("UPDATE users SET is_approved = 1, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "User", id)?;

        info!(user_id = %id, "Approved user");
        self.get(id).await
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting user");
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "User", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::db;

    fn register(email: &str, role: Option<Role>) -> RegisterUser {
        RegisterUser {
            email: email.to_string(),
            name: "Siti".to_string(),
            password: "correct-horse".to_string(),
            role,
            location_id: None,
        }
    }

    #[tokio::test]
    async fn test_first_user_becomes_admin() {
        let db = db().await;
        let users = db.users();

        let first = users
            .register(&register("admin@mbg.id", Some(Role::KitchenStaff)), "hash")
            .await
            .unwrap();
        assert_eq!(first.role, Role::Admin);
        assert!(first.is_approved);

        let second = users
            .register(&register("cook@mbg.id", Some(Role::KitchenStaff)), "hash")
            .await
            .unwrap();
        assert_eq!(second.role, Role::KitchenStaff);
        assert!(!second.is_approved);

        let third = users.register(&register("school@mbg.id", None), "hash").await.unwrap();
        assert_eq!(third.role, Role::BeneficiaryPoint);
    }

    #[tokio::test]
    async fn test_email_is_case_insensitive() {
        let db = db().await;
        db.users().register(&register("Admin@MBG.id", None), "hash").await.unwrap();

        let found = db.users().find_by_email("ADMIN@mbg.id").await.unwrap();
        assert!(found.is_some());

        let err = db
            .users()
            .register(&register("admin@mbg.id", None), "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { fields } if fields == vec!["email"]));
    }

    #[tokio::test]
    async fn test_approve_and_partial_update() {
        let db = db().await;
        db.users().register(&register("admin@mbg.id", None), "hash").await.unwrap();
        let user = db.users().register(&register("wh@mbg.id", None), "hash").await.unwrap();

        let approved = db.users().approve(&user.id).await.unwrap();
        assert!(approved.is_approved);
        assert!(approved.can_sign_in());

        let updated = db
            .users()
            .update(
                &user.id,
                &UpdateUser {
                    role: Some(Role::WarehouseStaff),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, Role::WarehouseStaff);
        assert_eq!(updated.name, "Siti");

        assert!(matches!(
            db.users().approve("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
